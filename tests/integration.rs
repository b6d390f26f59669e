use std::fs;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::tempdir;

fn driftfield(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_driftfield"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("Failed to execute driftfield")
}

#[test]
fn simulate_prints_a_json_report() {
    let output = driftfield(&[
        "simulate", "--frames", "45", "--width", "640", "--height", "480", "--dpr", "2", "--seed",
        "3",
    ]);
    assert!(output.status.success(), "driftfield exited with error");

    let report: Value = serde_json::from_slice(&output.stdout).expect("report is JSON");
    assert_eq!(report["frames"], 45);
    assert_eq!(report["draws"], 45);
    assert_eq!(report["particles"], 100);
    assert_eq!(report["backend"], "canvas");
    assert_eq!(report["seed"], 3);
    assert_eq!(report["out_of_bounds"], 0);
    assert_eq!(report["viewport"]["backing_width"], 1280);
    assert_eq!(report["viewport"]["backing_height"], 960);
}

#[test]
fn simulate_is_deterministic_for_a_seed() {
    let args = ["simulate", "--frames", "20", "--seed", "99", "--pointer", "300,200"];
    let first = driftfield(&args);
    let second = driftfield(&args);
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn simulate_applies_a_resize() {
    let output = driftfield(&[
        "simulate",
        "--frames",
        "12",
        "--resize-at",
        "4",
        "--resize-to",
        "0x0",
    ]);
    assert!(output.status.success());

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["viewport"]["width"], 1.0);
    assert_eq!(report["viewport"]["height"], 1.0);
}

#[test]
fn simulate_reads_yaml_config() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("field.yml");
    fs::write(&config, "backend: webgpu\nparticle_count: 32\nmax_connections: 16\n").unwrap();

    let output = driftfield(&["simulate", "--frames", "10", "--config", config.to_str().unwrap()]);
    assert!(output.status.success());

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["backend"], "webgpu");
    assert_eq!(report["particles"], 32);
    assert!(report["peak_edges"].as_u64().unwrap() <= 16);
}

#[test]
fn invalid_config_fails_with_a_message() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("field.json");
    fs::write(&config, r#"{"size_range": [3, 1]}"#).unwrap();

    let output = driftfield(&["simulate", "--config", config.to_str().unwrap()]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("size_range"), "stderr: {stderr}");
}

#[test]
fn snapshot_writes_svg() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out").join("field.svg");

    let output = driftfield(&[
        "snapshot",
        "--frames",
        "3",
        "--seed",
        "1",
        "--output",
        path.to_str().unwrap(),
    ]);
    assert!(output.status.success());

    let svg = fs::read_to_string(&path).expect("snapshot was not written");
    assert!(svg.starts_with("<svg"));
    assert_eq!(svg.matches("<circle").count(), 100);
    assert!(!svg.contains("<rect"), "background must stay transparent");
}

#[test]
fn config_prints_presets() {
    let output = driftfield(&["config"]);
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["particle_count"], 100);
    assert_eq!(json["connection_distance"], 150.0);

    let output = driftfield(&["config", "--format", "yaml", "--preset", "webgpu"]);
    assert!(output.status.success());
    let yaml: Value = serde_yaml::from_slice(&output.stdout).unwrap();
    assert_eq!(yaml["backend"], "webgpu");
    assert_eq!(yaml["max_connections"], 2048);
}
