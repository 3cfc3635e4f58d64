//! Console text helpers.

use std::time::Duration;

use slime_core::MaskRecord;

/// `hh:mm:ss`, hours unbounded.
pub fn hms(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60)
}

/// Percentage with one decimal, `done` out of `total`. An empty total counts
/// as complete.
pub fn percent(done: u64, total: u64) -> String {
    if total == 0 {
        return "100.0%".to_string();
    }
    format!("{:.1}%", done as f64 * 100.0 / total as f64)
}

/// Time still needed at the average rate so far, `None` before any progress.
pub fn remaining(elapsed: Duration, done: u64, total: u64) -> Option<Duration> {
    if done == 0 {
        return None;
    }
    let left = total.saturating_sub(done);
    Some(elapsed.mul_f64(left as f64 / done as f64))
}

/// `blockSize/blockSurfaceArea` and `chunkSize/chunkSurfaceArea` columns.
pub fn block_ratio(record: &MaskRecord) -> String {
    format!("{}/{}", record.stats.block_size, record.stats.block_surface_area)
}

pub fn chunk_ratio(record: &MaskRecord) -> String {
    format!("{}/{}", record.stats.chunk_size, record.stats.chunk_surface_area)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hms_pads_and_carries() {
        assert_eq!(hms(Duration::ZERO), "00:00:00");
        assert_eq!(hms(Duration::from_millis(59_999)), "00:00:59");
        assert_eq!(hms(Duration::from_secs(3 * 3600 + 7 * 60 + 5)), "03:07:05");
        assert_eq!(hms(Duration::from_secs(125 * 3600)), "125:00:00");
    }

    #[test]
    fn percent_has_one_decimal() {
        assert_eq!(percent(821, 1000), "82.1%");
        assert_eq!(percent(0, 7), "0.0%");
        assert_eq!(percent(0, 0), "100.0%");
    }

    #[test]
    fn remaining_scales_elapsed() {
        assert_eq!(remaining(Duration::from_secs(10), 0, 100), None);
        assert_eq!(
            remaining(Duration::from_secs(10), 25, 100),
            Some(Duration::from_secs(30))
        );
        assert_eq!(
            remaining(Duration::from_secs(10), 100, 100),
            Some(Duration::ZERO)
        );
    }
}
