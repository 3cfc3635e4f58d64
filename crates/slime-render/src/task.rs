use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use slime_core::{CancelToken, Mask, MaskParams};
use slime_geom::Position;
use slime_io::ResultsReader;

use crate::error::RenderError;
use crate::painter::{MaskImage, MaskPainter, RenderOptions, image_file_name};

/// Positions read ahead of the render threads.
const BATCH: usize = 64;

/// Counters of a running image task. All reads are lock-free.
#[derive(Debug, Default)]
pub struct ImageProgress {
    bytes_read: AtomicU64,
    total_bytes: AtomicU64,
    lines_read: AtomicU64,
    parse_errors: AtomicU64,
    images: AtomicU64,
    save_errors: AtomicU64,
    finished: AtomicBool,
    cancel: CancelToken,
}

impl ImageProgress {
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read.load(Ordering::Relaxed)
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes.load(Ordering::Relaxed)
    }

    pub fn lines_read(&self) -> u64 {
        self.lines_read.load(Ordering::Relaxed)
    }

    pub fn parse_errors(&self) -> u64 {
        self.parse_errors.load(Ordering::Relaxed)
    }

    pub fn images_generated(&self) -> u64 {
        self.images.load(Ordering::Relaxed)
    }

    /// Images rendered but not written to disk.
    pub fn save_errors(&self) -> u64 {
        self.save_errors.load(Ordering::Relaxed)
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    fn sync_reader<R: std::io::BufRead>(&self, reader: &ResultsReader<R>) {
        self.bytes_read.store(reader.bytes_read(), Ordering::Relaxed);
        self.lines_read.store(reader.lines_read(), Ordering::Relaxed);
        self.parse_errors.store(reader.parse_errors(), Ordering::Relaxed);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageOutcome {
    pub images_generated: u64,
    pub save_errors: u64,
    pub lines_read: u64,
    pub parse_errors: u64,
    pub elapsed: Duration,
    pub cancelled: bool,
}

impl ImageOutcome {
    pub fn millis_per_image(&self) -> Option<u128> {
        (self.images_generated > 0)
            .then(|| self.elapsed.as_millis() / u128::from(self.images_generated))
    }
}

/// Renders one PNG for every position listed in a results file.
pub struct ImageTask {
    mask_params: MaskParams,
    options: RenderOptions,
    input: PathBuf,
    output_dir: PathBuf,
    threads: usize,
    progress: Arc<ImageProgress>,
}

impl ImageTask {
    pub fn new(
        mask_params: MaskParams,
        options: RenderOptions,
        input: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            mask_params,
            options,
            input: input.into(),
            output_dir: output_dir.into(),
            threads: 0,
            progress: Arc::new(ImageProgress::default()),
        }
    }

    /// Render threads; 0 lets rayon pick one per core.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn progress(&self) -> Arc<ImageProgress> {
        Arc::clone(&self.progress)
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.progress.cancel.clone()
    }

    pub fn run(&self) -> Result<ImageOutcome, RenderError> {
        let start = Instant::now();
        let result = self.render_all();
        self.progress.finished.store(true, Ordering::Release);
        let cancelled = result?;
        let outcome = ImageOutcome {
            images_generated: self.progress.images_generated(),
            save_errors: self.progress.save_errors(),
            lines_read: self.progress.lines_read(),
            parse_errors: self.progress.parse_errors(),
            elapsed: start.elapsed(),
            cancelled,
        };
        log::info!(
            target: "render",
            "{} images written to '{}'",
            outcome.images_generated,
            self.output_dir.display()
        );
        Ok(outcome)
    }

    pub fn spawn(self) -> Result<ImageJob, RenderError> {
        let progress = self.progress();
        let handle = thread::Builder::new()
            .name("slime-images".into())
            .spawn(move || self.run())?;
        Ok(ImageJob { handle, progress })
    }

    /// Returns whether the task was cancelled.
    fn render_all(&self) -> Result<bool, RenderError> {
        let mut reader = ResultsReader::open(&self.input)?;
        self.progress
            .total_bytes
            .store(reader.total_bytes(), Ordering::Relaxed);
        fs::create_dir_all(&self.output_dir)?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .thread_name(|i| format!("slime-render-{i}"))
            .build()?;
        let painter = MaskPainter::new(self.options);
        log::debug!(
            target: "render",
            "rendering {}x{} images on {} threads",
            painter.image_width(),
            painter.image_width(),
            pool.current_num_threads()
        );

        let mut batch: Vec<Position> = Vec::with_capacity(BATCH);
        loop {
            if self.progress.cancel.is_cancelled() {
                return Ok(true);
            }
            batch.clear();
            while batch.len() < BATCH {
                match reader.next_position()? {
                    Some(pos) => batch.push(pos),
                    None => break,
                }
            }
            self.progress.sync_reader(&reader);
            if batch.is_empty() {
                return Ok(false);
            }
            pool.install(|| {
                batch.par_iter().for_each_init(
                    || (None::<Mask>, painter.new_image()),
                    |(slot, image), pos| self.render_one(&painter, slot, image, *pos),
                )
            });
        }
    }

    fn render_one(
        &self,
        painter: &MaskPainter,
        slot: &mut Option<Mask>,
        image: &mut MaskImage,
        pos: Position,
    ) {
        if self.progress.cancel.is_cancelled() {
            return;
        }
        let mask = match slot {
            Some(mask) => {
                mask.move_to(pos);
                mask
            }
            None => slot.insert(Mask::new(self.mask_params.clone(), pos)),
        };
        painter.paint(mask, image);
        let name = image_file_name(&mask.record());
        let path = self.output_dir.join(&name);
        // A failed save costs only that image.
        if let Err(e) = image.save_png(&path) {
            log::error!(target: "render", "failed to save image '{}': {}", name, e);
            self.progress.save_errors.fetch_add(1, Ordering::Relaxed);
            return;
        }
        self.progress.images.fetch_add(1, Ordering::Relaxed);
        log::trace!(target: "render", "saved {}", name);
    }
}

/// Handle to an image task running on its own thread.
pub struct ImageJob {
    handle: JoinHandle<Result<ImageOutcome, RenderError>>,
    progress: Arc<ImageProgress>,
}

impl ImageJob {
    pub fn progress(&self) -> &Arc<ImageProgress> {
        &self.progress
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn join(self) -> Result<ImageOutcome, RenderError> {
        match self.handle.join() {
            Ok(res) => res,
            Err(_) => Err(RenderError::WorkerPanicked),
        }
    }
}
