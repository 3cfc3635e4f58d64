//! Search orchestration: walks the mask along the spiral, keeps the running
//! extrema and hands matching positions to a sink.

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender;
use slime_geom::{CHUNK_WIDTH, Direction, Point, Position};

use crate::extremum::Extrema;
use crate::mask::{MAX_BLOCK_SIZE, MAX_CHUNK_SIZE, Mask, MaskParams, MaskRecord, MaskStats};
use crate::path::SearchPath;

const OFFSETS_PER_CHUNK: u64 = (CHUNK_WIDTH * CHUNK_WIDTH) as u64;

/// Inclusive size ranges. A position matches when its chunk size is in
/// range or its block size is in range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchCriteria {
    pub min_block_size: i64,
    pub max_block_size: i64,
    pub min_chunk_size: i64,
    pub max_chunk_size: i64,
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self {
            min_block_size: 0,
            max_block_size: i64::from(MAX_BLOCK_SIZE),
            min_chunk_size: 0,
            max_chunk_size: i64::from(MAX_CHUNK_SIZE),
        }
    }
}

impl SearchCriteria {
    #[inline]
    pub fn matches(&self, stats: &MaskStats) -> bool {
        let chunk_size = i64::from(stats.chunk_size);
        let block_size = i64::from(stats.block_size);
        (self.min_chunk_size..=self.max_chunk_size).contains(&chunk_size)
            || (self.min_block_size..=self.max_block_size).contains(&block_size)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchParams {
    /// Center of the spiral. Its offset is the one scanned by a coarse search.
    pub center: Position,
    pub min_width: i32,
    pub max_width: i32,
    /// Scan all 256 in-chunk offsets instead of only the center's.
    pub fine_search: bool,
    pub criteria: SearchCriteria,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            center: Position::default(),
            min_width: 0,
            max_width: 1,
            fine_search: false,
            criteria: SearchCriteria::default(),
        }
    }
}

/// Receiver of matching positions.
pub trait MatchSink {
    fn record(&mut self, record: &MaskRecord);
}

impl MatchSink for Vec<MaskRecord> {
    fn record(&mut self, record: &MaskRecord) {
        self.push(*record);
    }
}

impl MatchSink for Sender<MaskRecord> {
    fn record(&mut self, record: &MaskRecord) {
        // A dropped receiver means the results writer gave up; the scan goes on.
        if self.send(*record).is_err() {
            log::trace!(target: "search", "match at {} dropped", record.position);
        }
    }
}

impl<S: MatchSink + ?Sized> MatchSink for &mut S {
    fn record(&mut self, record: &MaskRecord) {
        (**self).record(record);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum SearchState {
    Idle = 0,
    Running = 1,
    Cancelling = 2,
    Done = 3,
}

impl SearchState {
    fn from_u8(v: u8) -> SearchState {
        match v {
            0 => SearchState::Idle,
            1 => SearchState::Running,
            2 => SearchState::Cancelling,
            _ => SearchState::Done,
        }
    }
}

/// Cooperative stop flag, checked by the worker once per position.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Counters and extrema shared between the search worker and any number of
/// readers. Readers never block the worker: it publishes extrema with
/// `try_lock` and only waits for the lock once, when it finishes.
#[derive(Debug)]
pub struct SearchProgress {
    state: AtomicU8,
    checked: AtomicU64,
    matches: AtomicU64,
    total: u64,
    extrema: Mutex<Option<Extrema>>,
    cancel: CancelToken,
}

impl SearchProgress {
    fn new(total: u64) -> Self {
        Self {
            state: AtomicU8::new(SearchState::Idle as u8),
            checked: AtomicU64::new(0),
            matches: AtomicU64::new(0),
            total,
            extrema: Mutex::new(None),
            cancel: CancelToken::new(),
        }
    }

    #[inline]
    pub fn state(&self) -> SearchState {
        SearchState::from_u8(self.state.load(Ordering::Acquire))
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.state() == SearchState::Done
    }

    #[inline]
    pub fn positions_checked(&self) -> u64 {
        self.checked.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn positions_total(&self) -> u64 {
        self.total
    }

    #[inline]
    pub fn matches(&self) -> u64 {
        self.matches.load(Ordering::Relaxed)
    }

    /// Last published extrema; `None` until the first position is scanned.
    pub fn extrema(&self) -> Option<Extrema> {
        match self.extrema.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Asks the worker to stop at its next position.
    pub fn cancel(&self) {
        self.cancel.cancel();
        let _ = self.state.compare_exchange(
            SearchState::Running as u8,
            SearchState::Cancelling as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    fn set_state(&self, state: SearchState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Returns `false` when a reader holds the lock.
    fn try_publish(&self, extrema: &Extrema) -> bool {
        match self.extrema.try_lock() {
            Ok(mut guard) => {
                *guard = Some(*extrema);
                true
            }
            Err(_) => false,
        }
    }

    fn publish(&self, extrema: Option<Extrema>) {
        match self.extrema.lock() {
            Ok(mut guard) => *guard = extrema,
            Err(poisoned) => *poisoned.into_inner() = extrema,
        }
    }
}

/// Final result of a search run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchOutcome {
    /// `None` only when the search area was empty or cancelled before the
    /// first position.
    pub extrema: Option<Extrema>,
    pub positions_checked: u64,
    pub positions_total: u64,
    pub matches: u64,
    pub cancelled: bool,
}

#[derive(Debug)]
pub enum SearchError {
    Spawn(std::io::Error),
    WorkerPanicked,
}

impl std::fmt::Display for SearchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchError::Spawn(e) => write!(f, "could not start search worker: {}", e),
            SearchError::WorkerPanicked => write!(f, "search worker panicked"),
        }
    }
}

impl std::error::Error for SearchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SearchError::Spawn(e) => Some(e),
            SearchError::WorkerPanicked => None,
        }
    }
}

pub struct SearchTask {
    mask_params: MaskParams,
    params: SearchParams,
    path: SearchPath,
    mask: Option<Mask>,
    extrema: Option<Extrema>,
    /// Set while `extrema` holds an improvement readers have not seen.
    extrema_dirty: bool,
    progress: Arc<SearchProgress>,
}

impl SearchTask {
    pub fn new(mask_params: MaskParams, params: SearchParams) -> Self {
        let path = SearchPath::new(params.center.chunk, params.min_width, params.max_width);
        let groups = if params.fine_search {
            OFFSETS_PER_CHUNK
        } else {
            1
        };
        // Saturates for areas too wide to count in a u64.
        let progress = Arc::new(SearchProgress::new(
            path.path_length().saturating_mul(groups),
        ));
        Self {
            mask_params,
            params,
            path,
            mask: None,
            extrema: None,
            extrema_dirty: false,
            progress,
        }
    }

    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    pub fn progress(&self) -> Arc<SearchProgress> {
        Arc::clone(&self.progress)
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.progress.cancel_token()
    }

    /// Runs the whole search on the calling thread. A task runs once.
    pub fn run<S: MatchSink + ?Sized>(&mut self, sink: &mut S) -> SearchOutcome {
        assert_eq!(
            self.progress.state(),
            SearchState::Idle,
            "a search task can only run once"
        );
        self.progress.set_state(SearchState::Running);
        log::info!(
            target: "search",
            "scanning {} positions around {}",
            self.progress.positions_total(),
            self.params.center
        );

        let mut cancelled = false;
        for offset in self.offsets() {
            if !self.scan_offset(offset, sink) {
                cancelled = true;
                break;
            }
        }

        self.progress.publish(self.extrema);
        self.progress.set_state(SearchState::Done);
        let outcome = SearchOutcome {
            extrema: self.extrema,
            positions_checked: self.progress.positions_checked(),
            positions_total: self.progress.positions_total(),
            matches: self.progress.matches(),
            cancelled,
        };
        if cancelled {
            log::info!(
                target: "search",
                "search cancelled after {} of {} positions",
                outcome.positions_checked,
                outcome.positions_total
            );
        } else {
            log::info!(target: "search", "search finished, {} matches", outcome.matches);
        }
        outcome
    }

    /// Runs the search on a dedicated worker thread.
    pub fn spawn<S>(mut self, mut sink: S) -> SearchJob
    where
        S: MatchSink + Send + 'static,
    {
        let progress = self.progress();
        let handle = thread::Builder::new()
            .name("slime-search".into())
            .spawn(move || self.run(&mut sink));
        SearchJob { handle, progress }
    }

    fn offsets(&self) -> Vec<Point> {
        if self.params.fine_search {
            (0..CHUNK_WIDTH)
                .flat_map(|x| (0..CHUNK_WIDTH).map(move |z| Point::new(x, z)))
                .collect()
        } else {
            vec![self.params.center.offset]
        }
    }

    /// One full traversal of the path at a fixed in-chunk offset. Returns
    /// `false` if the search was cancelled.
    fn scan_offset<S: MatchSink + ?Sized>(&mut self, offset: Point, sink: &mut S) -> bool {
        log::debug!(target: "search", "scanning offset {}", offset);
        let mut previous: Option<Point> = None;
        while let Some(chunk) = self.path.step() {
            if self.progress.cancel.is_cancelled() {
                self.progress.set_state(SearchState::Cancelling);
                self.path.reset();
                return false;
            }

            let position = Position::new(chunk, offset);
            let mask = match self.mask.as_mut() {
                None => self.mask.insert(Mask::new(self.mask_params.clone(), position)),
                Some(mask) => {
                    match previous.and_then(|p| Direction::between(p, chunk)) {
                        Some(dir) => mask.move_by_chunk(dir),
                        None => mask.move_to(position),
                    }
                    mask
                }
            };
            previous = Some(chunk);
            let record = mask.record();

            match self.extrema.as_mut() {
                None => {
                    self.extrema = Some(Extrema::new(record));
                    self.extrema_dirty = true;
                }
                Some(extrema) => {
                    if extrema.observe(&record) {
                        self.extrema_dirty = true;
                    }
                }
            }
            self.publish_extrema();

            if self.params.criteria.matches(&record.stats) {
                self.progress.matches.fetch_add(1, Ordering::Relaxed);
                sink.record(&record);
            }
            self.progress.checked.fetch_add(1, Ordering::Relaxed);
        }
        true
    }

    /// Hands pending extrema to readers unless one holds the lock, in which
    /// case the next position tries again.
    fn publish_extrema(&mut self) {
        if !self.extrema_dirty {
            return;
        }
        if let Some(extrema) = self.extrema.as_ref() {
            self.extrema_dirty = !self.progress.try_publish(extrema);
        }
    }
}

/// Handle to a search running on its own thread.
pub struct SearchJob {
    handle: std::io::Result<JoinHandle<SearchOutcome>>,
    progress: Arc<SearchProgress>,
}

impl SearchJob {
    pub fn progress(&self) -> &Arc<SearchProgress> {
        &self.progress
    }

    pub fn is_finished(&self) -> bool {
        match &self.handle {
            Ok(handle) => handle.is_finished(),
            Err(_) => true,
        }
    }

    pub fn join(self) -> Result<SearchOutcome, SearchError> {
        match self.handle {
            Ok(handle) => handle.join().map_err(|_| SearchError::WorkerPanicked),
            Err(e) => Err(SearchError::Spawn(e)),
        }
    }
}
