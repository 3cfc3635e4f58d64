use core::fmt;
use core::str::FromStr;

use crate::Point;

/// Width of a chunk in blocks.
pub const CHUNK_WIDTH: i32 = 16;

/// A block position split into its chunk and the block offset inside that
/// chunk. `offset` is always within `0..CHUNK_WIDTH` on both axes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Position {
    pub chunk: Point,
    pub offset: Point,
}

impl Position {
    #[inline]
    pub fn new(chunk: Point, offset: Point) -> Self {
        assert!(
            (0..CHUNK_WIDTH).contains(&offset.x) && (0..CHUNK_WIDTH).contains(&offset.z),
            "in-chunk offset {offset} out of range"
        );
        Self { chunk, offset }
    }

    #[inline]
    pub fn from_block(x: i32, z: i32) -> Self {
        Self {
            chunk: Point::new(x.div_euclid(CHUNK_WIDTH), z.div_euclid(CHUNK_WIDTH)),
            offset: Point::new(x.rem_euclid(CHUNK_WIDTH), z.rem_euclid(CHUNK_WIDTH)),
        }
    }

    #[inline]
    /// Block coordinates. Chunks a search walks past the `i32` block range
    /// wrap around; the chunk form stays exact there.
    pub fn block(&self) -> Point {
        Point::new(
            self.chunk.x.wrapping_mul(CHUNK_WIDTH).wrapping_add(self.offset.x),
            self.chunk.z.wrapping_mul(CHUNK_WIDTH).wrapping_add(self.offset.z),
        )
    }

    /// Block form `bx,bz`, the counterpart of the chunk form used by `Display`.
    pub fn block_string(&self) -> String {
        self.block().to_string()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{},{}:{}",
            self.chunk.x, self.offset.x, self.chunk.z, self.offset.z
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParsePositionError {
    Malformed(String),
    OutOfRange(String),
}

impl fmt::Display for ParsePositionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParsePositionError::Malformed(text) => write!(
                f,
                "failed to parse position from '{text}', expected 'xBlock,zBlock' or 'xChunk:xIn,zChunk:zIn'"
            ),
            ParsePositionError::OutOfRange(text) => {
                write!(f, "position '{text}' is outside the representable world")
            }
        }
    }
}

impl std::error::Error for ParsePositionError {}

impl FromStr for Position {
    type Err = ParsePositionError;

    /// Accepts block form `bx,bz` or chunk form `cx:ix,cz:iz`. Chunk form is
    /// normalised through block coordinates, so `0:17,0:0` becomes `1:1,0:0`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let malformed = || ParsePositionError::Malformed(text.to_string());
        let (x, z) = text.split_once(',').ok_or_else(malformed)?;
        let (block_x, x_chunk_form) = parse_axis(x, text)?;
        let (block_z, z_chunk_form) = parse_axis(z, text)?;
        if x_chunk_form != z_chunk_form {
            return Err(malformed());
        }
        Ok(Position::from_block(block_x, block_z))
    }
}

/// Block coordinate of one axis, and whether it was written in chunk form.
fn parse_axis(field: &str, text: &str) -> Result<(i32, bool), ParsePositionError> {
    let malformed = || ParsePositionError::Malformed(text.to_string());
    let parts: Vec<&str> = field.split(':').collect();
    match parts.as_slice() {
        [block] => block
            .trim()
            .parse::<i32>()
            .map(|b| (b, false))
            .map_err(|_| malformed()),
        [chunk, offset] => {
            let chunk = chunk.trim().parse::<i32>().map_err(|_| malformed())?;
            let offset = offset.trim().parse::<i32>().map_err(|_| malformed())?;
            chunk
                .checked_mul(CHUNK_WIDTH)
                .and_then(|b| b.checked_add(offset))
                .map(|b| (b, true))
                .ok_or_else(|| ParsePositionError::OutOfRange(text.to_string()))
        }
        _ => Err(malformed()),
    }
}
