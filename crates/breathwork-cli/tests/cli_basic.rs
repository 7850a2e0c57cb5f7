//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run and verify outputs. Each test
//! points HOME at its own temporary directory so config and session count
//! never touch the real user data.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-q", "-p", "breathwork-cli", "--"])
        .args(args)
        .env("HOME", home)
        .env_remove("BREATHWORK_ENV")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn events(stdout: &str) -> Vec<serde_json::Value> {
    stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("event line is JSON"))
        .collect()
}

#[test]
fn test_pattern_list() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["pattern", "list"]);
    assert_eq!(code, 0, "pattern list failed");

    let presets: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let slugs: Vec<&str> = presets
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["slug"].as_str().unwrap())
        .collect();
    assert!(slugs.contains(&"box"));
    assert!(slugs.contains(&"four-seven-eight"));
}

#[test]
fn test_pattern_show_unknown_preset_fails() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["pattern", "show", "nope"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_simulate_box_preset_reports_holds() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(
        home.path(),
        &["breathe", "simulate", "--preset", "box", "--until-ms", "16000"],
    );
    assert_eq!(code, 0, "simulate failed");

    let events = events(&stdout);
    let phases: Vec<&str> = events
        .iter()
        .filter(|e| e["type"] == "phase_changed")
        .map(|e| e["phase"].as_str().unwrap())
        .collect();
    assert_eq!(phases, ["inhale", "hold", "exhale", "hold", "inhale"]);
    assert_eq!(events[0]["label"], "Breathe In");
    assert!(events.iter().any(|e| e["type"] == "hold_countdown"));
    assert_eq!(events.last().unwrap()["type"], "state_snapshot");
}

#[test]
fn test_simulate_rejects_negative_duration() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, stderr, code) = run_cli(
        home.path(),
        &["breathe", "simulate", "--inhale-ms", "-500"],
    );
    assert_eq!(code, 1);
    assert!(stdout.is_empty());
    assert!(stderr.contains("error:"));
}

#[test]
fn test_simulate_rejects_all_zero_pattern() {
    let home = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(
        home.path(),
        &["breathe", "simulate", "--inhale-ms", "0", "--exhale-ms", "0"],
    );
    assert_eq!(code, 1);
}

#[test]
fn test_config_get_default() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["config", "get", "session.free_session_limit"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "3");
}

#[test]
fn test_config_get_unset_preset_is_empty() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["config", "get", "pattern.preset"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "");
}

#[test]
fn test_config_set_then_get() {
    let home = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(home.path(), &["config", "set", "pattern.preset", "relaxing"]);
    assert_eq!(code, 0);
    let (stdout, _, code) = run_cli(home.path(), &["config", "get", "pattern.preset"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "relaxing");
}

#[test]
fn test_config_get_unknown_key() {
    let home = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(home.path(), &["config", "get", "no.such.key"]);
    assert_eq!(code, 1);
}

#[test]
fn test_run_is_paywalled_after_free_limit() {
    let home = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(home.path(), &["config", "set", "session.free_session_limit", "1"]);
    assert_eq!(code, 0);

    let (stdout, _, code) = run_cli(
        home.path(),
        &["breathe", "run", "--preset", "energizing", "--seconds", "1"],
    );
    assert_eq!(code, 0, "first session should be free");
    let events = events(&stdout);
    assert_eq!(events[0]["type"], "session_started");
    assert_eq!(events.last().unwrap()["type"], "session_ended");

    let (stdout, _, code) = run_cli(home.path(), &["breathe", "run", "--seconds", "1"]);
    assert_eq!(code, 1);
    assert_eq!(crate::events(&stdout)[0]["type"], "paywalled");

    let (stdout, _, code) = run_cli(home.path(), &["session", "status"]);
    assert_eq!(code, 0);
    let status: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(status["access"], "paywalled");
    assert_eq!(status["gate"]["session_count"], 1);
}
