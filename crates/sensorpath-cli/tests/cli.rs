//! End-to-end tests for the `sensorpath-cli` binary against the fixture
//! floorplan in `docs/fixtures`.

use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn fixture_payload() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../docs/fixtures/floorplan.json")
}

fn cli() -> Command {
    let mut cmd = cargo_bin_cmd!("sensorpath-cli");
    cmd.env("RUST_LOG", "error")
        .env_remove("SENSORPATH_PAYLOAD")
        .env_remove("SENSORPATH_BASE_URL")
        .env_remove("SENSORPATH_CACHE_DIR");
    cmd
}

fn cli_with_fixture() -> Command {
    let mut cmd = cli();
    cmd.arg("--payload").arg(fixture_payload()).arg("--no-cache");
    cmd
}

#[test]
fn path_between_rooms_lists_intermediate_sensors() {
    cli_with_fixture()
        .args(["path", "--from", "lobby", "--to", "office"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Path: lobby -> office (3 sensors"))
        .stdout(predicate::str::contains("s2"))
        .stdout(predicate::str::contains("s4"))
        .stdout(predicate::str::contains("s5"));
}

#[test]
fn path_json_output_is_machine_readable() {
    let output = cli_with_fixture()
        .args(["--format", "json", "path", "--from", "lobby", "--to", "office"])
        .output()
        .expect("run cli");
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    let ids: Vec<_> = value["fastest_path"]
        .as_array()
        .expect("array")
        .iter()
        .map(|step| step["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["s2", "s4", "s5"]);
    assert!(value["distance"].as_f64().unwrap() > 0.0);
}

#[test]
fn unknown_room_fails_with_its_id() {
    cli_with_fixture()
        .args(["path", "--from", "lobby", "--to", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ghost"));
}

#[test]
fn unreachable_sensor_reports_no_route() {
    cli_with_fixture()
        .args(["path", "--from", "s1", "--to", "s8"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no route"));
}

#[test]
fn tour_visits_rooms_greedily() {
    cli_with_fixture()
        .args(["tour", "--from", "lobby", "--to", "office", "lab"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Tour: lobby -> lab -> office"));
}

#[test]
fn tour_requires_targets() {
    cli_with_fixture()
        .args(["tour", "--from", "lobby"])
        .assert()
        .failure();
}

#[test]
fn graph_summary_counts_fixture_nodes() {
    cli_with_fixture()
        .arg("graph")
        .assert()
        .success()
        .stdout(predicate::str::contains("9 sensors (2 vertical, 2 isolated)"));
}

#[test]
fn payload_and_base_url_are_exclusive() {
    cli()
        .arg("--payload")
        .arg(fixture_payload())
        .args(["--base-url", "http://localhost:1", "graph"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn cache_dir_receives_graph_file() {
    let dir = TempDir::new().expect("create temp dir");
    cli()
        .arg("--payload")
        .arg(fixture_payload())
        .arg("--cache-dir")
        .arg(dir.path())
        .args(["path", "--from", "lab", "--to", "office"])
        .assert()
        .success();

    let cached: Vec<_> = std::fs::read_dir(dir.path())
        .expect("cache dir exists")
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".graph.bin"))
        .collect();
    assert_eq!(cached.len(), 1);
}

#[test]
fn missing_payload_file_is_reported() {
    let dir = TempDir::new().expect("create temp dir");
    cli()
        .arg("--payload")
        .arg(dir.path().join("absent.json"))
        .arg("--no-cache")
        .arg("graph")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to fetch floorplan"));
}
