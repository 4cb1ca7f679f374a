//! Integration tests for CLI argument handling
//!
//! These only cover argument validation, which happens before any connection
//! to the store is attempted.

use std::process::Command;

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_jsoncache"))
        .args(args)
        .output()
        .expect("Failed to execute jsoncache")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(output.status.success(), "Expected --help to exit successfully");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("jsoncache"), "Help should mention jsoncache");
    for subcommand in ["get", "set", "del", "flush"] {
        assert!(stdout.contains(subcommand), "Help should list {}", subcommand);
    }
}

#[test]
fn test_set_help_mentions_expiry_flags() {
    let output = run_cli(&["set", "--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--ttl"));
    assert!(stdout.contains("--no-expiry"));
}

#[test]
fn test_invalid_json_value_prints_error_and_exits() {
    let output = run_cli(&["set", "key", "{not json"]);
    assert!(!output.status.success(), "Expected invalid JSON to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid JSON") || stderr.contains("invalid value"),
        "Should print error message about invalid JSON: {}",
        stderr
    );
}

#[test]
fn test_ttl_conflicts_with_no_expiry() {
    let output = run_cli(&["set", "key", "1", "--ttl", "10", "--no-expiry"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cannot be used with"), "{}", stderr);
}

#[test]
fn test_invalid_port_flag_is_rejected() {
    let output = run_cli(&["--port", "not-a-port", "flush"]);
    assert!(!output.status.success());
}

#[test]
fn test_missing_subcommand_is_rejected() {
    let output = run_cli(&[]);
    assert!(!output.status.success());
}
