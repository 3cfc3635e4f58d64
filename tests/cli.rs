use std::fs;
use std::process::{Command, Stdio};

fn slimefinder() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_slimefinder"));
    cmd.stdin(Stdio::null()).env("RUST_LOG", "warn");
    cmd
}

#[test]
fn no_flags_prints_help() {
    let dir = tempfile::tempdir().unwrap();
    let out = slimefinder().current_dir(dir.path()).output().unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("--search"));
    assert!(stdout.contains("--images"));
    assert!(!dir.path().join("slimefinder.toml").exists());
}

#[test]
fn search_then_images_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("slimefinder.toml"),
        "[mask]\nworld-seed = 42\n\n[search]\ncenter-pos = \"8:8,8:8\"\nmax-width = 3\n\n[image]\n",
    )
    .unwrap();
    let out = slimefinder()
        .current_dir(dir.path())
        .args(["-s", "-i"])
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let results = fs::read_to_string(dir.path().join("results.csv")).unwrap();
    assert_eq!(results.lines().count(), 1 + 9);
    let images = fs::read_dir(dir.path().join("images")).unwrap().count();
    assert_eq!(images, 9);

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("9 of 9 positions checked"));
    assert!(stdout.contains("nanoseconds per position"));
    assert!(stdout.contains("9 images generated"));

    let config = fs::read_to_string(dir.path().join("slimefinder.toml")).unwrap();
    assert!(config.contains("world-seed = 42"));
    assert!(config.contains("draw-center = true"));
}

#[test]
fn custom_config_path_is_used() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("other.toml");
    fs::write(
        &config,
        "[search]\nmax-width = 2\nmin-chunk-size = 1\nmax-chunk-size = 0\nmin-block-size = 1\nmax-block-size = 0\noutput-file = \"none.csv\"\n",
    )
    .unwrap();
    let out = slimefinder()
        .current_dir(dir.path())
        .arg("--search")
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();
    assert!(out.status.success());
    let results = fs::read_to_string(dir.path().join("none.csv")).unwrap();
    assert_eq!(results.lines().count(), 1);
    assert!(!dir.path().join("slimefinder.toml").exists());
}

fn search_config(dir: &std::path::Path, output_file: &str) {
    fs::write(
        dir.join("slimefinder.toml"),
        format!("[mask]\nworld-seed = 42\n\n[search]\nmax-width = 3\noutput-file = \"{output_file}\"\n"),
    )
    .unwrap();
}

#[test]
fn unwritable_results_file_does_not_stop_the_search() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("taken")).unwrap();
    search_config(dir.path(), "taken");
    let out = slimefinder().current_dir(dir.path()).arg("-s").output().unwrap();

    assert!(!out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("9 of 9 positions checked"), "{stdout}");
    assert!(stdout.contains("largest  chunk size"), "{stdout}");
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("could not open results file"), "{stderr}");
    assert!(dir.path().join("taken").is_dir());
}

#[cfg(target_os = "linux")]
#[test]
fn full_device_does_not_stop_the_search() {
    let dir = tempfile::tempdir().unwrap();
    search_config(dir.path(), "/dev/full");
    let out = slimefinder().current_dir(dir.path()).arg("-s").output().unwrap();

    assert!(!out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("9 of 9 positions checked"), "{stdout}");
    assert!(stdout.contains("nanoseconds per position"), "{stdout}");
    assert!(stdout.contains("largest  chunk size"), "{stdout}");
}
