//! The neighborhood mask: a `MASK_WIDTH`² square of chunks around a center
//! position, weighted by how many of each chunk's blocks can spawn slimes
//! for a player standing at the center.

use hashbrown::HashSet;
use slime_geom::{CHUNK_WIDTH, Direction, Point, Position};

use crate::classifier::is_slime_chunk;

/// Radius of the neighborhood in chunks.
pub const MASK_RADIUS: i32 = 8;
pub const MASK_WIDTH: usize = 2 * MASK_RADIUS as usize + 1;
const MASK_AREA: usize = MASK_WIDTH * MASK_WIDTH;
const BLOCKS_PER_CHUNK: u32 = (CHUNK_WIDTH * CHUNK_WIDTH) as u32;

/// Largest possible chunk size / chunk surface area.
pub const MAX_CHUNK_SIZE: u32 = MASK_AREA as u32;
/// Largest possible block size / block surface area.
pub const MAX_BLOCK_SIZE: u32 = MAX_CHUNK_SIZE * BLOCKS_PER_CHUNK;

const DESPAWN_RADIUS: i64 = 128;
const EXCLUSION_RADIUS: i64 = 24;

/// How the block inclusion test treats the position inside the center chunk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MaskShape {
    /// Distances are measured from the exact in-chunk offset.
    #[default]
    Exact,
    /// A block counts only if it is inside for every possible offset.
    Floor,
    /// A block counts if it is inside for at least one offset.
    Ceil,
}

impl MaskShape {
    #[inline]
    pub fn uses_offset(self) -> bool {
        matches!(self, MaskShape::Exact)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaskParams {
    pub world_seed: i64,
    pub despawn_sphere: bool,
    pub exclusion_sphere: bool,
    /// Height of the player above the spawning floor, in blocks.
    pub y_offset: i32,
    /// A chunk is inside the mask when more than this many of its blocks are.
    pub chunk_weight: i32,
    pub shape: MaskShape,
}

impl Default for MaskParams {
    fn default() -> Self {
        Self {
            world_seed: 0,
            despawn_sphere: true,
            exclusion_sphere: true,
            y_offset: 0,
            chunk_weight: 0,
            shape: MaskShape::Exact,
        }
    }
}

impl MaskParams {
    /// Squared horizontal radius of the despawn sphere at `y_offset`. Negative
    /// when the sphere does not reach the spawning floor at all.
    #[inline]
    pub fn despawn_radius_sq(&self) -> i64 {
        let y = i64::from(self.y_offset);
        DESPAWN_RADIUS * DESPAWN_RADIUS - y * y
    }

    /// Squared horizontal radius of the exclusion sphere at `y_offset`.
    #[inline]
    pub fn exclusion_radius_sq(&self) -> i64 {
        let y = i64::from(self.y_offset);
        let r = EXCLUSION_RADIUS * EXCLUSION_RADIUS;
        r - (y * y).min(r)
    }
}

/// Aggregate counters of a mask at one position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MaskStats {
    /// Blocks inside the mask that lie in slime chunks.
    pub block_size: u32,
    /// Slime chunks that are inside the mask.
    pub chunk_size: u32,
    pub block_surface_area: u32,
    pub chunk_surface_area: u32,
}

/// Snapshot of a mask: where it was and what it counted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MaskRecord {
    pub position: Position,
    pub stats: MaskStats,
}

#[derive(Clone, Debug)]
pub struct Mask {
    params: MaskParams,
    despawn_radius_sq: i64,
    exclusion_radius_sq: i64,
    chunk: Point,
    offset: Point,
    /// Blocks inside the mask per neighborhood chunk, 0..=256.
    weights: [u16; MASK_AREA],
    /// Absolute coordinates of the slime chunks in the neighborhood.
    slime_chunks: HashSet<Point>,
    stats: MaskStats,
}

#[inline]
fn weight_index(rel_x: i32, rel_z: i32) -> usize {
    debug_assert!(rel_x.abs() <= MASK_RADIUS && rel_z.abs() <= MASK_RADIUS);
    (rel_x + MASK_RADIUS) as usize * MASK_WIDTH + (rel_z + MASK_RADIUS) as usize
}

#[inline]
fn assert_in_neighborhood(rel_x: i32, rel_z: i32) {
    assert!(
        rel_x.abs() <= MASK_RADIUS && rel_z.abs() <= MASK_RADIUS,
        "chunk ({rel_x}, {rel_z}) is outside the mask neighborhood"
    );
}

impl Mask {
    /// Builds a mask at `position`, computing the weight table and a full
    /// slime chunk scan.
    pub fn new(params: MaskParams, position: Position) -> Self {
        assert!(
            (0..BLOCKS_PER_CHUNK as i32).contains(&params.chunk_weight),
            "chunk weight {} outside 0..=255",
            params.chunk_weight
        );
        let mut mask = Self {
            despawn_radius_sq: params.despawn_radius_sq(),
            exclusion_radius_sq: params.exclusion_radius_sq(),
            params,
            chunk: position.chunk,
            offset: position.offset,
            weights: [0; MASK_AREA],
            slime_chunks: HashSet::new(),
            stats: MaskStats::default(),
        };
        mask.update_weights();
        mask.update_size();
        mask
    }

    /// Moves to an arbitrary position with a full recomputation. The weight
    /// table is rebuilt only when the in-chunk offset changes.
    pub fn move_to(&mut self, position: Position) {
        if position.offset != self.offset {
            self.offset = position.offset;
            if self.params.shape.uses_offset() {
                self.update_weights();
            }
        }
        self.chunk = position.chunk;
        self.update_size();
    }

    /// Moves the center to `chunk`, keeping the offset. Uses the incremental
    /// update when the target is edge-adjacent.
    pub fn move_to_chunk(&mut self, chunk: Point) {
        if chunk == self.chunk {
            return;
        }
        match Direction::between(self.chunk, chunk) {
            Some(dir) => self.move_by_chunk(dir),
            None => {
                self.chunk = chunk;
                self.update_size();
            }
        }
    }

    /// Shifts the mask one chunk in `dir`, touching only the row or column of
    /// chunks that leaves the neighborhood and the one that enters it.
    pub fn move_by_chunk(&mut self, dir: Direction) {
        let (dx, dz) = (dir.dx(), dir.dz());
        for i in -MASK_RADIUS..=MASK_RADIUS {
            let trailing = Point::new(i * dz - dx * MASK_RADIUS, i * dx - dz * MASK_RADIUS);
            self.slime_chunks.remove(&(self.chunk + trailing));
        }
        self.chunk = self.chunk.step(dir, 1);
        for i in -MASK_RADIUS..=MASK_RADIUS {
            let leading = self.chunk
                + Point::new(i * dz + dx * MASK_RADIUS, i * dx + dz * MASK_RADIUS);
            if is_slime_chunk(self.params.world_seed, leading.x, leading.z) {
                self.slime_chunks.insert(leading);
            }
        }
        self.recount();
    }

    /// Whether the neighborhood chunk at `(rel_x, rel_z)` from the center
    /// chunk is inside the mask. Panics outside the neighborhood.
    #[inline]
    pub fn is_chunk_inside(&self, rel_x: i32, rel_z: i32) -> bool {
        assert_in_neighborhood(rel_x, rel_z);
        self.weight_at(rel_x, rel_z) > self.params.chunk_weight
    }

    /// Whether the block at `(block_x, block_z)`, relative to the north-west
    /// corner of the center chunk, is inside the mask: within the despawn
    /// sphere and outside the exclusion sphere, whichever are enabled.
    pub fn is_block_inside(&self, block_x: i32, block_z: i32) -> bool {
        match self.params.shape {
            MaskShape::Exact => self.is_inside_from(block_x, block_z, self.offset),
            MaskShape::Floor => Self::offsets().all(|o| self.is_inside_from(block_x, block_z, o)),
            MaskShape::Ceil => Self::offsets().any(|o| self.is_inside_from(block_x, block_z, o)),
        }
    }

    /// Classifier lookup relative to the center chunk.
    #[inline]
    pub fn is_slime_chunk(&self, rel_x: i32, rel_z: i32) -> bool {
        is_slime_chunk(
            self.params.world_seed,
            self.chunk.x + rel_x,
            self.chunk.z + rel_z,
        )
    }

    /// Number of blocks of the neighborhood chunk that are inside the mask.
    #[inline]
    pub fn chunk_weight(&self, rel_x: i32, rel_z: i32) -> u32 {
        assert_in_neighborhood(rel_x, rel_z);
        self.weight_at(rel_x, rel_z) as u32
    }

    /// Whether the neighborhood currently tracks `chunk` (absolute
    /// coordinates) as a slime chunk.
    #[inline]
    pub fn tracks_slime_chunk(&self, chunk: Point) -> bool {
        self.slime_chunks.contains(&chunk)
    }

    pub fn slime_chunk_count(&self) -> usize {
        self.slime_chunks.len()
    }

    #[inline]
    pub fn stats(&self) -> MaskStats {
        self.stats
    }

    #[inline]
    pub fn block_size(&self) -> u32 {
        self.stats.block_size
    }

    #[inline]
    pub fn chunk_size(&self) -> u32 {
        self.stats.chunk_size
    }

    #[inline]
    pub fn block_surface_area(&self) -> u32 {
        self.stats.block_surface_area
    }

    #[inline]
    pub fn chunk_surface_area(&self) -> u32 {
        self.stats.chunk_surface_area
    }

    #[inline]
    pub fn position(&self) -> Position {
        Position::new(self.chunk, self.offset)
    }

    #[inline]
    pub fn params(&self) -> &MaskParams {
        &self.params
    }

    #[inline]
    pub fn record(&self) -> MaskRecord {
        MaskRecord {
            position: self.position(),
            stats: self.stats,
        }
    }

    #[inline]
    fn weight_at(&self, rel_x: i32, rel_z: i32) -> i32 {
        i32::from(self.weights[weight_index(rel_x, rel_z)])
    }

    #[inline]
    fn is_inside_from(&self, block_x: i32, block_z: i32, offset: Point) -> bool {
        let dist_sq = Point::new(block_x, block_z).distance_sq(offset);
        if self.params.despawn_sphere && dist_sq > self.despawn_radius_sq {
            return false;
        }
        if self.params.exclusion_sphere && dist_sq <= self.exclusion_radius_sq {
            return false;
        }
        true
    }

    fn offsets() -> impl Iterator<Item = Point> {
        (0..CHUNK_WIDTH).flat_map(|x| (0..CHUNK_WIDTH).map(move |z| Point::new(x, z)))
    }

    /// Rebuilds the weight table and the surface areas. Needed whenever the
    /// offset changes for an exact mask.
    fn update_weights(&mut self) {
        let mut block_surface_area = 0;
        let mut chunk_surface_area = 0;
        for rel_x in -MASK_RADIUS..=MASK_RADIUS {
            for rel_z in -MASK_RADIUS..=MASK_RADIUS {
                let mut weight: u16 = 0;
                for in_x in 0..CHUNK_WIDTH {
                    for in_z in 0..CHUNK_WIDTH {
                        if self.is_block_inside(
                            CHUNK_WIDTH * rel_x + in_x,
                            CHUNK_WIDTH * rel_z + in_z,
                        ) {
                            weight += 1;
                        }
                    }
                }
                self.weights[weight_index(rel_x, rel_z)] = weight;
                block_surface_area += u32::from(weight);
                if i32::from(weight) > self.params.chunk_weight {
                    chunk_surface_area += 1;
                }
            }
        }
        self.stats.block_surface_area = block_surface_area;
        self.stats.chunk_surface_area = chunk_surface_area;
        log::trace!(
            target: "mask",
            "weights rebuilt for offset {}: {} blocks, {} chunks",
            self.offset,
            block_surface_area,
            chunk_surface_area
        );
    }

    /// Full rescan of the neighborhood for slime chunks.
    fn update_size(&mut self) {
        self.slime_chunks.clear();
        for rel_x in -MASK_RADIUS..=MASK_RADIUS {
            for rel_z in -MASK_RADIUS..=MASK_RADIUS {
                if self.is_slime_chunk(rel_x, rel_z) {
                    self.slime_chunks
                        .insert(self.chunk + Point::new(rel_x, rel_z));
                }
            }
        }
        self.recount();
    }

    /// Sizes from the tracked slime chunks only.
    fn recount(&mut self) {
        let mut block_size = 0;
        let mut chunk_size = 0;
        for chunk in &self.slime_chunks {
            let rel = *chunk - self.chunk;
            let weight = self.weight_at(rel.x, rel.z);
            block_size += weight as u32;
            if weight > self.params.chunk_weight {
                chunk_size += 1;
            }
        }
        self.stats.block_size = block_size;
        self.stats.chunk_size = chunk_size;
    }
}
