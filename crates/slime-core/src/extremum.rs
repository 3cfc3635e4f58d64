use crate::mask::{MaskRecord, MaskStats};

/// The four running extrema a search keeps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExtremumKind {
    MinBlockSize,
    MaxBlockSize,
    MinChunkSize,
    MaxChunkSize,
}

impl ExtremumKind {
    pub const ALL: [ExtremumKind; 4] = [
        ExtremumKind::MinBlockSize,
        ExtremumKind::MaxBlockSize,
        ExtremumKind::MinChunkSize,
        ExtremumKind::MaxChunkSize,
    ];

    /// Whether `candidate` strictly beats `current`. Ties keep `current`.
    #[inline]
    pub fn improves(self, candidate: &MaskStats, current: &MaskStats) -> bool {
        match self {
            ExtremumKind::MinBlockSize => candidate.block_size < current.block_size,
            ExtremumKind::MaxBlockSize => candidate.block_size > current.block_size,
            ExtremumKind::MinChunkSize => candidate.chunk_size < current.chunk_size,
            ExtremumKind::MaxChunkSize => candidate.chunk_size > current.chunk_size,
        }
    }

    /// The tracked size and the surface area it is measured against.
    #[inline]
    pub fn metric(self, stats: &MaskStats) -> (u32, u32) {
        match self {
            ExtremumKind::MinBlockSize | ExtremumKind::MaxBlockSize => {
                (stats.block_size, stats.block_surface_area)
            }
            ExtremumKind::MinChunkSize | ExtremumKind::MaxChunkSize => {
                (stats.chunk_size, stats.chunk_surface_area)
            }
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExtremumKind::MinBlockSize => "smallest block size",
            ExtremumKind::MaxBlockSize => "largest  block size",
            ExtremumKind::MinChunkSize => "smallest chunk size",
            ExtremumKind::MaxChunkSize => "largest  chunk size",
        }
    }

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

/// Snapshots of the best position seen so far for each `ExtremumKind`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Extrema {
    records: [MaskRecord; 4],
}

impl Extrema {
    /// Every extremum starts out as the first observed position.
    pub fn new(first: MaskRecord) -> Self {
        Self {
            records: [first; 4],
        }
    }

    /// Replaces every extremum `candidate` strictly beats. Returns whether
    /// anything changed.
    pub fn observe(&mut self, candidate: &MaskRecord) -> bool {
        let mut changed = false;
        for kind in ExtremumKind::ALL {
            let current = &mut self.records[kind.index()];
            if kind.improves(&candidate.stats, &current.stats) {
                *current = *candidate;
                changed = true;
            }
        }
        changed
    }

    #[inline]
    pub fn get(&self, kind: ExtremumKind) -> &MaskRecord {
        &self.records[kind.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (ExtremumKind, &MaskRecord)> {
        ExtremumKind::ALL.into_iter().map(|kind| (kind, self.get(kind)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slime_geom::Position;

    fn record(block_x: i32, block_size: u32, chunk_size: u32) -> MaskRecord {
        MaskRecord {
            position: Position::from_block(block_x, 0),
            stats: MaskStats {
                block_size,
                chunk_size,
                block_surface_area: 49640,
                chunk_surface_area: 222,
            },
        }
    }

    #[test]
    fn first_record_is_every_extremum() {
        let first = record(0, 100, 10);
        let extrema = Extrema::new(first);
        for (_, r) in extrema.iter() {
            assert_eq!(*r, first);
        }
    }

    #[test]
    fn strictly_better_records_replace() {
        let mut extrema = Extrema::new(record(0, 100, 10));
        assert!(extrema.observe(&record(1, 150, 5)));
        assert_eq!(extrema.get(ExtremumKind::MaxBlockSize).position.block().x, 1);
        assert_eq!(extrema.get(ExtremumKind::MinChunkSize).position.block().x, 1);
        assert_eq!(extrema.get(ExtremumKind::MinBlockSize).position.block().x, 0);
        assert_eq!(extrema.get(ExtremumKind::MaxChunkSize).position.block().x, 0);
    }

    #[test]
    fn ties_keep_the_first_seen() {
        let mut extrema = Extrema::new(record(0, 100, 10));
        assert!(!extrema.observe(&record(1, 100, 10)));
        for (_, r) in extrema.iter() {
            assert_eq!(r.position.block().x, 0);
        }
    }
}
