//! Wires tasks to threads: the search worker, the results writer fed over a
//! channel, the image task, and the stdin watcher that cancels them.

use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{Receiver, unbounded};
use slime_core::{CancelToken, MaskRecord, SearchTask};
use slime_io::{Config, ResultsError, ResultsWriter};
use slime_render::{ImageTask, RenderOptions};

use crate::console;

/// Cancels whichever task is armed when Enter is pressed. One thread serves
/// every task of the process.
#[derive(Clone, Default)]
pub struct CancelOnEnter {
    armed: Arc<Mutex<Option<CancelToken>>>,
}

impl CancelOnEnter {
    pub fn spawn() -> io::Result<Self> {
        let watcher = CancelOnEnter::default();
        let armed = Arc::clone(&watcher.armed);
        thread::Builder::new()
            .name("stdin-cancel".into())
            .spawn(move || {
                let mut line = String::new();
                // EOF or a read error means no interactive stdin: stop watching.
                while let Ok(n) = io::stdin().lock().read_line(&mut line) {
                    if n == 0 {
                        break;
                    }
                    line.clear();
                    if let Ok(guard) = armed.lock() {
                        if let Some(token) = guard.as_ref() {
                            log::info!("stop requested");
                            token.cancel();
                        }
                    }
                }
            })?;
        Ok(watcher)
    }

    pub fn arm(&self, token: CancelToken) {
        if let Ok(mut guard) = self.armed.lock() {
            *guard = Some(token);
        }
    }

    pub fn disarm(&self) {
        if let Ok(mut guard) = self.armed.lock() {
            *guard = None;
        }
    }
}

/// Writes every record received until the search drops its sender. After a
/// write error the remaining records are drained and dropped; the search
/// itself keeps going.
fn spawn_results_writer<W>(
    writer: Option<ResultsWriter<W>>,
    rx: Receiver<MaskRecord>,
) -> io::Result<JoinHandle<Result<u64, ResultsError>>>
where
    W: Write + Send + 'static,
{
    thread::Builder::new()
        .name("results-writer".into())
        .spawn(move || {
            let mut writer = writer;
            let mut failure = None;
            for record in rx.iter() {
                let Some(out) = writer.as_mut() else {
                    continue;
                };
                if let Err(e) = out.write(&record) {
                    log::error!(
                        target: "results",
                        "could not write to the results file, further matches are not saved: {}",
                        e
                    );
                    failure = Some(e);
                    writer = None;
                }
            }
            if let Some(e) = failure {
                return Err(e);
            }
            match writer {
                Some(out) => {
                    let written = out.records_written();
                    out.into_inner()?;
                    Ok(written)
                }
                None => Ok(0),
            }
        })
}

pub fn run_search(config: &Config, stop: &CancelOnEnter) -> Result<(), Box<dyn Error>> {
    let params = config.search.to_params();
    console::print_block(&console::search_start_info(
        &params.criteria,
        &config.search.output_file,
    ));

    let output = Path::new(&config.search.output_file);
    let (writer, open_error) = match ResultsWriter::create(output, config.search.append) {
        Ok(writer) => (Some(writer), None),
        Err(e) => {
            log::error!(
                target: "results",
                "could not open results file '{}', matches will not be saved: {}",
                output.display(),
                e
            );
            (None, Some(e))
        }
    };
    let task = SearchTask::new(config.mask.to_params(), params);
    let (tx, rx) = unbounded();
    let writer_handle = spawn_results_writer(writer, rx)?;

    stop.arm(task.cancel_token());
    let start = Instant::now();
    let job = task.spawn(tx);
    let progress = Arc::clone(job.progress());
    console::watch(
        || {
            console::search_progress_line(
                progress.positions_checked(),
                progress.positions_total(),
                progress.matches(),
                start.elapsed(),
            )
        },
        || job.is_finished(),
    );
    let outcome = job.join();
    let elapsed = start.elapsed();
    stop.disarm();
    let outcome = outcome?;

    let written = match writer_handle.join() {
        Ok(res) => res,
        Err(_) => Err(ResultsError::Io(io::Error::other("results writer panicked"))),
    };
    if outcome.cancelled {
        log::info!(target: "search", "search stopped early");
    }
    console::print_block(&console::search_end_info(&outcome, elapsed));

    if let Some(e) = open_error {
        return Err(e.into());
    }
    let written = written?;
    log::debug!(target: "results", "{} results written", written);
    Ok(())
}

pub fn run_images(config: &Config, stop: &CancelOnEnter) -> Result<(), Box<dyn Error>> {
    let image = &config.image;
    console::print_block(&console::image_start_info(&image.input_file, &image.output_dir));

    let task = ImageTask::new(
        config.mask.to_params(),
        RenderOptions::from(image),
        &image.input_file,
        &image.output_dir,
    );
    stop.arm(task.cancel_token());
    let start = Instant::now();
    let job = task.spawn()?;
    let progress = Arc::clone(job.progress());
    console::watch(
        || {
            console::image_progress_line(
                progress.bytes_read(),
                progress.total_bytes(),
                progress.images_generated(),
                progress.lines_read(),
                progress.parse_errors(),
                start.elapsed(),
            )
        },
        || job.is_finished(),
    );
    let outcome = job.join();
    stop.disarm();
    let outcome = outcome?;
    if outcome.cancelled {
        log::info!(target: "render", "image generation stopped early");
    }
    console::print_block(&console::image_end_info(&outcome));
    if outcome.save_errors > 0 {
        return Err(format!("{} images could not be saved", outcome.save_errors).into());
    }
    Ok(())
}
