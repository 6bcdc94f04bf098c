//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run against the dev data
//! directory and verify outputs.

use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-p", "wakebell-cli", "--"])
        .args(args)
        .env("WAKEBELL_ENV", "dev")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn test_alarm_add_and_delete() {
    let (stdout, _, code) = run_cli(&["alarm", "add-daily", "7", "30", "--label", "cli-test"]);
    assert_eq!(code, 0, "alarm add-daily failed");

    let alarm: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(alarm["type"], "daily");
    assert_eq!(alarm["enabled"], true);
    let id = alarm["id"].as_str().unwrap();

    let (stdout, _, code) = run_cli(&["alarm", "delete", id]);
    assert_eq!(code, 0, "alarm delete failed");
    assert!(stdout.contains("deleted"));
}

#[test]
fn test_alarm_edit() {
    let (stdout, _, code) = run_cli(&["alarm", "add-daily", "6", "0", "--label", "edit-test"]);
    assert_eq!(code, 0, "alarm add-daily failed");
    let alarm: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let id = alarm["id"].as_str().unwrap();

    let (stdout, _, code) = run_cli(&["alarm", "edit", id, "--label", "edited", "--hour", "9"]);
    assert_eq!(code, 0, "alarm edit failed");
    let edited: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(edited["label"], "edited");
    assert_eq!(edited["hour"], 9);
    assert_eq!(edited["minute"], 0);

    let (_, _, code) = run_cli(&["alarm", "delete", id]);
    assert_eq!(code, 0, "alarm delete failed");
}

#[test]
fn test_alarm_edit_unknown_id_fails() {
    let (_, stderr, code) = run_cli(&["alarm", "edit", "no-such-id", "--label", "x"]);
    assert_ne!(code, 0, "editing an unknown id should fail");
    assert!(stderr.contains("error"));
}

#[test]
fn test_alarm_list() {
    let (_, _, code) = run_cli(&["alarm", "list"]);
    assert_eq!(code, 0, "alarm list failed");

    let (stdout, _, code) = run_cli(&["alarm", "list", "--json"]);
    assert_eq!(code, 0, "alarm list --json failed");
    assert!(serde_json::from_str::<serde_json::Value>(&stdout)
        .unwrap()
        .is_array());
}

#[test]
fn test_alarm_add_wake_up_requires_reason() {
    let (_, stderr, code) = run_cli(&["alarm", "add-wake-up", "7", "0", "   "]);
    assert_ne!(code, 0, "blank reason should be rejected");
    assert!(stderr.contains("error"));
}

#[test]
fn test_sleep_status() {
    let (stdout, _, code) = run_cli(&["sleep", "status"]);
    assert_eq!(code, 0, "sleep status failed");
    assert!(!stdout.trim().is_empty());
}

#[test]
fn test_sleep_stats() {
    let (stdout, _, code) = run_cli(&["sleep", "stats"]);
    assert_eq!(code, 0, "sleep stats failed");
    let stats: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(stats.get("count").is_some());
}

#[test]
fn test_stopwatch_status() {
    let (stdout, _, code) = run_cli(&["stopwatch", "status"]);
    assert_eq!(code, 0, "stopwatch status failed");
    assert!(serde_json::from_str::<serde_json::Value>(&stdout).is_ok());
}

#[test]
fn test_stopwatch_reset() {
    let (stdout, _, code) = run_cli(&["stopwatch", "reset"]);
    assert_eq!(code, 0, "stopwatch reset failed");
    assert!(stdout.contains("00:00.00"));
}

#[test]
fn test_subscription_status() {
    let (stdout, _, code) = run_cli(&["subscription", "status"]);
    assert_eq!(code, 0, "subscription status failed");
    let sub: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(sub.get("status").is_some());
}

#[test]
fn test_config_get() {
    let (stdout, _, code) = run_cli(&["config", "get", "weather.timezone"]);
    assert_eq!(code, 0, "config get failed");
    assert!(!stdout.trim().is_empty());
}

#[test]
fn test_config_get_unknown_key_fails() {
    let (_, _, code) = run_cli(&["config", "get", "no.such.key"]);
    assert_ne!(code, 0, "unknown key should fail");
}

#[test]
fn test_config_list() {
    let (stdout, _, code) = run_cli(&["config", "list"]);
    assert_eq!(code, 0, "config list failed");
    let config: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(config.get("notifications").is_some());
    assert!(config.get("weather").is_some());
}
