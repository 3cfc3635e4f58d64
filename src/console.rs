//! What the user sees on stdout while a task runs: a start banner, one
//! progress line rewritten in place, and a summary.

use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use slime_core::{SearchCriteria, SearchOutcome};
use slime_io::format::{hms, percent, remaining};
use slime_render::ImageOutcome;

const POLL: Duration = Duration::from_millis(100);

/// Redraws `line()` every 100 ms until `finished()` holds, then draws it a
/// last time and ends the line.
pub fn watch(mut line: impl FnMut() -> String, finished: impl Fn() -> bool) {
    let mut out = io::stdout().lock();
    loop {
        let done = finished();
        // Trailing spaces clear leftovers from a longer previous line.
        let _ = write!(out, "\r{}   ", line());
        let _ = out.flush();
        if done {
            break;
        }
        drop(out);
        thread::sleep(POLL);
        out = io::stdout().lock();
    }
    let _ = writeln!(out);
}

pub fn print_block(text: &str) {
    if !text.is_empty() {
        println!("{}", text);
    }
}

fn progress_head(done: u64, total: u64) -> String {
    format!("[ {:>6} ]", percent(done, total))
}

fn time_left(elapsed: Duration, done: u64, total: u64) -> String {
    remaining(elapsed, done, total)
        .map(hms)
        .unwrap_or_else(|| "--:--:--".to_string())
}

pub fn search_start_info(criteria: &SearchCriteria, output_file: &str) -> String {
    format!(
        "Searching mask positions with criteria: \
         {} <= blockSize <= {} or {} <= chunkSize <= {}\n\
         Saving results to file: '{}'",
        criteria.min_block_size,
        criteria.max_block_size,
        criteria.min_chunk_size,
        criteria.max_chunk_size,
        output_file
    )
}

/// `[  82.1% ]  2 matches, 54777 of 256000000 positions checked, 00:00:09 elapsed, 43:12:55 remaining`
pub fn search_progress_line(checked: u64, total: u64, matches: u64, elapsed: Duration) -> String {
    format!(
        "{}  {} matches, {} of {} positions checked, {} elapsed, {} remaining",
        progress_head(checked, total),
        matches,
        checked,
        total,
        hms(elapsed),
        time_left(elapsed, checked, total)
    )
}

pub fn search_end_info(outcome: &SearchOutcome, elapsed: Duration) -> String {
    let Some(extrema) = outcome.extrema.as_ref() else {
        return String::new();
    };
    if outcome.positions_checked == 0 {
        return String::new();
    }
    let mut lines = vec![format!(
        "{} nanoseconds per position",
        elapsed.as_nanos() / u128::from(outcome.positions_checked)
    )];
    for (kind, record) in extrema.iter() {
        let (size, surface) = kind.metric(&record.stats);
        lines.push(format!(
            "{}: {}/{} at {}",
            kind.label(),
            size,
            surface,
            record.position
        ));
    }
    lines.join("\n")
}

pub fn image_start_info(input_file: &str, output_dir: &str) -> String {
    format!(
        "Generating images of masks listed in file: '{}'\n\
         Saving generated images to directory: '{}'",
        input_file, output_dir
    )
}

/// `[  82.1% ]  96 images generated, 100 lines parsed, 2 errors, 00:00:09 elapsed, 00:00:02 remaining`
pub fn image_progress_line(
    bytes_read: u64,
    total_bytes: u64,
    images: u64,
    lines: u64,
    errors: u64,
    elapsed: Duration,
) -> String {
    format!(
        "{}  {} images generated, {} lines parsed, {} errors, {} elapsed, {} remaining",
        progress_head(bytes_read, total_bytes),
        images,
        lines,
        errors,
        hms(elapsed),
        time_left(elapsed, bytes_read, total_bytes)
    )
}

pub fn image_end_info(outcome: &ImageOutcome) -> String {
    let mut lines = Vec::new();
    if let Some(ms) = outcome.millis_per_image() {
        lines.push(format!("{} milliseconds per image", ms));
    }
    if outcome.save_errors > 0 {
        lines.push(format!("{} images could not be saved", outcome.save_errors));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use slime_core::{Extrema, MaskRecord, MaskStats};
    use slime_geom::Position;

    #[test]
    fn search_progress_layout() {
        let line = search_progress_line(821, 1000, 2, Duration::from_secs(9));
        assert_eq!(
            line,
            "[  82.1% ]  2 matches, 821 of 1000 positions checked, 00:00:09 elapsed, 00:00:01 remaining"
        );
    }

    #[test]
    fn remaining_is_unknown_before_progress() {
        let line = search_progress_line(0, 1000, 0, Duration::from_secs(1));
        assert!(line.starts_with("[   0.0% ]"));
        assert!(line.ends_with("--:--:-- remaining"));
    }

    #[test]
    fn start_info_lists_criteria() {
        let text = search_start_info(&SearchCriteria::default(), "results.csv");
        assert_eq!(
            text,
            "Searching mask positions with criteria: 0 <= blockSize <= 73984 or 0 <= chunkSize <= 289\n\
             Saving results to file: 'results.csv'"
        );
    }

    #[test]
    fn end_info_lists_extrema() {
        let first = MaskRecord {
            position: "252:12,-1599:3".parse::<Position>().unwrap(),
            stats: MaskStats {
                block_size: 132,
                chunk_size: 3,
                block_surface_area: 79000,
                chunk_surface_area: 300,
            },
        };
        let outcome = SearchOutcome {
            extrema: Some(Extrema::new(first)),
            positions_checked: 4,
            positions_total: 4,
            matches: 0,
            cancelled: false,
        };
        let text = search_end_info(&outcome, Duration::from_nanos(4000));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "1000 nanoseconds per position");
        assert_eq!(lines[1], "smallest block size: 132/79000 at 252:12,-1599:3");
        assert_eq!(lines[2], "largest  block size: 132/79000 at 252:12,-1599:3");
        assert_eq!(lines[3], "smallest chunk size: 3/300 at 252:12,-1599:3");
        assert_eq!(lines[4], "largest  chunk size: 3/300 at 252:12,-1599:3");
    }

    #[test]
    fn nothing_checked_means_no_end_info() {
        let outcome = SearchOutcome {
            extrema: None,
            positions_checked: 0,
            positions_total: 0,
            matches: 0,
            cancelled: false,
        };
        assert_eq!(search_end_info(&outcome, Duration::from_secs(1)), "");
    }

    #[test]
    fn image_lines() {
        let line = image_progress_line(50, 100, 4, 6, 1, Duration::from_secs(2));
        assert_eq!(
            line,
            "[  50.0% ]  4 images generated, 6 lines parsed, 1 errors, 00:00:02 elapsed, 00:00:02 remaining"
        );
        let outcome = ImageOutcome {
            images_generated: 4,
            save_errors: 0,
            lines_read: 6,
            parse_errors: 1,
            elapsed: Duration::from_millis(180),
            cancelled: false,
        };
        assert_eq!(image_end_info(&outcome), "45 milliseconds per image");
        let failed = ImageOutcome {
            save_errors: 2,
            ..outcome
        };
        assert_eq!(
            image_end_info(&failed),
            "45 milliseconds per image\n2 images could not be saved"
        );
    }
}
