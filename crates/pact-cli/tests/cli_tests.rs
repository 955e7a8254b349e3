//! CLI integration tests for pact-cli
//!
//! Tests command parsing, output formatting, and config handling.

use serde_json::Value;
use std::path::Path;
use std::process::Command;

/// Helper to run the CLI with arguments and an isolated home directory
fn run_pact(home: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_pact"))
        .args(args)
        .env("HOME", home)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command")
}

// ==================== Help & Version Tests ====================

#[test]
fn test_cli_help() {
    let home = tempfile::tempdir().unwrap();
    let output = run_pact(home.path(), &["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["chains", "local", "send", "poll", "module", "balance", "mempool", "spv"] {
        assert!(stdout.contains(command), "help is missing {}", command);
    }
}

#[test]
fn test_cli_version() {
    let home = tempfile::tempdir().unwrap();
    let output = run_pact(home.path(), &["--version"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("pact"));
}

#[test]
fn test_cli_mempool_help() {
    let home = tempfile::tempdir().unwrap();
    let output = run_pact(home.path(), &["mempool", "--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("pending"));
    assert!(stdout.contains("lookup"));
}

#[test]
fn test_cli_rejects_unknown_network() {
    let home = tempfile::tempdir().unwrap();
    let output = run_pact(home.path(), &["--network", "devnet", "chains"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("devnet"));
}

#[test]
fn test_cli_poll_requires_keys() {
    let home = tempfile::tempdir().unwrap();
    let output = run_pact(home.path(), &["poll", "--chain", "0"]);
    assert!(!output.status.success());
}

// ==================== Config Tests ====================

#[test]
fn test_config_set_and_show() {
    let home = tempfile::tempdir().unwrap();

    let output = run_pact(home.path(), &["config", "--set-network", "testnet"]);
    assert!(output.status.success());
    assert!(home.path().join(".pact").join("config.toml").exists());

    let output = run_pact(home.path(), &["--json", "config", "--show"]);
    assert!(output.status.success());
    let shown: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(shown["network"], "testnet");
    assert_eq!(shown["gas_limit"], 1500);
}

#[test]
fn test_config_rejects_custom_without_endpoint() {
    let home = tempfile::tempdir().unwrap();
    let output = run_pact(home.path(), &["--json", "config", "--set-network", "custom"]);
    assert!(!output.status.success());
    let error: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(error["success"], false);
    assert!(!home.path().join(".pact").join("config.toml").exists());
}

#[test]
fn test_config_hint_without_flags() {
    let home = tempfile::tempdir().unwrap();
    let output = run_pact(home.path(), &["config"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("--show"));
}

// ==================== Error Output Tests ====================

#[test]
fn test_unreachable_node_reports_json_error() {
    let home = tempfile::tempdir().unwrap();
    let output = run_pact(
        home.path(),
        &["--json", "--endpoint", "http://127.0.0.1:9", "local", "(+ 1 2)"],
    );
    assert!(!output.status.success());
    let error: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(error["success"], false);
    assert!(error["error"].as_str().unwrap().contains("Transport"));
}

#[test]
fn test_invalid_data_is_rejected() {
    let home = tempfile::tempdir().unwrap();
    let output = run_pact(
        home.path(),
        &["--endpoint", "http://127.0.0.1:9", "local", "(+ 1 2)", "--data", "{"],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error"));
}
