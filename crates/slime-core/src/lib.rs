//! Slime chunk cluster search: chunk classification, the sliding neighborhood
//! mask and the spiral search that drives it.
#![forbid(unsafe_code)]

pub mod classifier;
pub mod extremum;
pub mod mask;
pub mod path;
pub mod search;

pub use classifier::is_slime_chunk;
pub use extremum::{Extrema, ExtremumKind};
pub use mask::{
    MASK_RADIUS, MASK_WIDTH, MAX_BLOCK_SIZE, MAX_CHUNK_SIZE, Mask, MaskParams, MaskRecord,
    MaskShape, MaskStats,
};
pub use path::SearchPath;
pub use search::{
    CancelToken, MatchSink, SearchCriteria, SearchError, SearchJob, SearchOutcome, SearchParams,
    SearchProgress, SearchState, SearchTask,
};
