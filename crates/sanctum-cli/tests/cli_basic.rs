//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary with HOME pointed at a temp dir so the
//! user's real config is never touched.

use std::process::Command;

use serde_json::Value;
use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &TempDir, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_sanctum"))
        .args(args)
        .env("HOME", home.path())
        .env_remove("SANCTUM_ENV")
        .env_remove("SANCTUM_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn json_lines(stdout: &str) -> Vec<Value> {
    stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("every stdout line is JSON"))
        .collect()
}

fn count_type(lines: &[Value], kind: &str) -> usize {
    lines.iter().filter(|l| l["type"] == kind).count()
}

#[test]
fn test_play_reaches_revealed() {
    let home = TempDir::new().unwrap();
    let (stdout, stderr, code) = run_cli(&home, &["play", "--seed", "1"]);
    assert_eq!(code, 0, "play failed: {stderr}");

    let lines = json_lines(&stdout);
    assert_eq!(lines[0]["type"], "TimelineStarted");
    assert_eq!(count_type(&lines, "PhaseChanged"), 3);
    let summary = lines.last().unwrap();
    assert_eq!(summary["type"], "Summary");
    assert_eq!(summary["status"]["phase"], "revealed");
    assert_eq!(summary["cue_voices"], 5);
}

#[test]
fn test_play_full_self_destruct() {
    let home = TempDir::new().unwrap();
    let (stdout, stderr, code) = run_cli(
        &home,
        &["play", "--seed", "2", "--cheers", "3", "--close-case", "--step-ms", "20"],
    );
    assert_eq!(code, 0, "play failed: {stderr}");

    let lines = json_lines(&stdout);
    assert_eq!(count_type(&lines, "CheersRegistered"), 3);
    assert_eq!(count_type(&lines, "CountdownTick"), 5);
    assert_eq!(count_type(&lines, "Exploded"), 1);
    assert_eq!(count_type(&lines, "Terminated"), 1);

    let summary = lines.last().unwrap();
    assert_eq!(summary["status"]["phase"], "terminated");
    assert_eq!(summary["status"]["cheers"]["count"], 3);
    assert_eq!(summary["status"]["cheers"]["intensity_level"], 1);
    assert!(lines.iter().all(|l| l["emitted_at"].is_string()));
}

#[test]
fn test_play_rejects_zero_step() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&home, &["play", "--step-ms", "0"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_cue_report() {
    let home = TempDir::new().unwrap();
    let (stdout, stderr, code) = run_cli(&home, &["cue", "door-slam", "--seed", "4"]);
    assert_eq!(code, 0, "cue failed: {stderr}");

    let report: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["kind"], "door-slam");
    assert_eq!(report["duration_ms"], 600);
    assert!(report["peak"].as_f64().unwrap() > 0.0);
    assert_eq!(report["haptic"], serde_json::json!([200]));
}

#[test]
fn test_cue_unknown_kind() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&home, &["cue", "gong"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown cue"));
}

#[test]
fn test_config_set_persists() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&home, &["config", "set", "cheers.lock_ms", "3000"]);
    assert_eq!(code, 0, "config set failed: {stderr}");

    let (stdout, _, code) = run_cli(&home, &["config", "get", "cheers.lock_ms"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "3000");

    let (stdout, _, _) = run_cli(&home, &["config", "path"]);
    assert!(stdout.trim().ends_with("config.toml"));
    assert!(stdout.contains(".config"));
}

#[test]
fn test_config_rejects_bad_value() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&home, &["config", "set", "music.target_volume", "3"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("music.target_volume"));
}

#[test]
fn test_config_rejects_out_of_order_timing() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&home, &["config", "set", "timing.revealed_ms", "100"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("timing"));

    let (stdout, _, code) = run_cli(&home, &["play"]);
    assert_eq!(code, 0);
    assert!(count_type(&json_lines(&stdout), "PhaseChanged") >= 3);
}

#[test]
fn test_config_reset() {
    let home = TempDir::new().unwrap();
    run_cli(&home, &["config", "set", "countdown.duration_ms", "3000"]);
    let (stdout, _, code) = run_cli(&home, &["config", "reset"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("reset"));
    let (stdout, _, _) = run_cli(&home, &["config", "get", "countdown.duration_ms"]);
    assert_eq!(stdout.trim(), "5000");
}

#[test]
fn test_schedule_lists_entries() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&home, &["schedule"]);
    assert_eq!(code, 0);
    let report: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["total_ms"], 6_600);
    assert_eq!(report["entries"].as_array().unwrap().len(), 11);
    assert_eq!(report["case_closed"]["self_destruct_ms"], 2_500);
}

#[test]
fn test_intensity_lookup() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&home, &["intensity", "6"]);
    assert_eq!(code, 0);
    let report: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["intensity_level"], 4);
    assert_eq!(report["message"], "en la pera 🍐🥴🍹");
}
