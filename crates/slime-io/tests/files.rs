use std::fs;

use slime_core::{MaskRecord, MaskStats};
use slime_geom::Position;
use slime_io::{Config, HEADER, ResultsReader, ResultsWriter, load_config_from_path};

fn record(bx: i32, bz: i32) -> MaskRecord {
    MaskRecord {
        position: Position::from_block(bx, bz),
        stats: MaskStats {
            block_size: 5000,
            chunk_size: 25,
            block_surface_area: 49640,
            chunk_surface_area: 222,
        },
    }
}

#[test]
fn missing_config_is_created_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("slimefinder.toml");
    let config = load_config_from_path(&path).unwrap();
    assert_eq!(config, Config::default());
    let written = fs::read_to_string(&path).unwrap();
    assert_eq!(Config::parse(&written).unwrap(), Config::default());
}

#[test]
fn partial_config_is_completed_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("slimefinder.toml");
    fs::write(&path, "[search]\nmax-width = 40\nstale = 1\n").unwrap();
    let config = load_config_from_path(&path).unwrap();
    assert_eq!(config.search.max_width, 40);
    let written = fs::read_to_string(&path).unwrap();
    assert!(written.contains("max-width = 40"));
    assert!(written.contains("world-seed = 0"));
    assert!(written.contains("draw-center = true"));
    assert!(!written.contains("stale"));
}

#[test]
fn broken_config_is_left_alone() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("slimefinder.toml");
    let broken = "[mask\nworld-seed = 5\n";
    fs::write(&path, broken).unwrap();
    let config = load_config_from_path(&path).unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(fs::read_to_string(&path).unwrap(), broken);
}

#[test]
fn results_round_trip_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.csv");
    let records = [record(199, -37), record(-1, -1), record(4096, 0)];
    {
        let mut w = ResultsWriter::create(&path, false).unwrap();
        for r in &records {
            w.write(r).unwrap();
        }
    }
    let mut reader = ResultsReader::open(&path).unwrap();
    let mut read = Vec::new();
    while let Some(pos) = reader.next_position().unwrap() {
        read.push(pos);
    }
    let expected: Vec<Position> = records.iter().map(|r| r.position).collect();
    assert_eq!(read, expected);
    assert_eq!(reader.parse_errors(), 0);
    assert_eq!(reader.bytes_read(), reader.total_bytes());
}

#[test]
fn append_keeps_rows_and_skips_second_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.csv");
    ResultsWriter::create(&path, false)
        .unwrap()
        .write(&record(1, 1))
        .unwrap();
    ResultsWriter::create(&path, true)
        .unwrap()
        .write(&record(2, 2))
        .unwrap();
    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], HEADER);
    assert!(lines[1].starts_with("1,1;"));
    assert!(lines[2].starts_with("2,2;"));
}

#[test]
fn appending_to_new_file_writes_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fresh.csv");
    ResultsWriter::create(&path, true).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), format!("{HEADER}\n"));
}

#[test]
fn truncating_replaces_old_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.csv");
    fs::write(&path, "old;old\nold;old\nold;old\n").unwrap();
    let mut w = ResultsWriter::create(&path, false).unwrap();
    w.write(&record(0, 0)).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), 2);
    assert!(!text.contains("old"));
}
