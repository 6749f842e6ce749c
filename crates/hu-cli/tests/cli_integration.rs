//! CLI integration tests
//!
//! Tests the headsup CLI using assert_cmd.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

fn headsup() -> Command {
    let mut cmd = Command::cargo_bin("headsup")
        .expect("Failed to locate headsup binary - ensure it's built before running tests");
    cmd.env_remove("HEADSUP_CONFIG").env_remove("RUST_LOG");
    cmd
}

/// Write a default config into `dir` and return its path
fn init_config(dir: &Path) -> PathBuf {
    let path = dir.join("config.toml");
    headsup()
        .arg("--config")
        .arg(&path)
        .args(["config", "init"])
        .assert()
        .success();
    path
}

#[test]
fn test_cli_help() {
    headsup()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("headsup"))
        .stdout(predicate::str::contains("panel"))
        .stdout(predicate::str::contains("launch"));
}

#[test]
fn test_cli_version() {
    headsup()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("headsup"));
}

#[test]
fn test_cli_unknown_command() {
    headsup()
        .arg("nonexistent-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_cli_config_path() {
    headsup()
        .args(["--config", "/tmp/headsup-test/config.toml", "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/tmp/headsup-test/config.toml"));
}

#[test]
fn test_cli_config_init_and_show() {
    let dir = tempfile::tempdir().unwrap();
    let path = init_config(dir.path());
    assert!(path.exists());

    headsup()
        .arg("--config")
        .arg(&path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[connection]"))
        .stdout(predicate::str::contains("port = 4444"));
}

#[test]
fn test_cli_config_show_rejects_broken_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[connection\nport = ").unwrap();

    headsup()
        .arg("--config")
        .arg(&path)
        .args(["config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration file"));
}

#[test]
fn test_cli_launch_localhost_skips_adb() {
    let dir = tempfile::tempdir().unwrap();
    let path = init_config(dir.path());

    headsup()
        .arg("--config")
        .arg(&path)
        .args(["launch", "localhost"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Application launched successfully"));

    headsup()
        .arg("--config")
        .arg(&path)
        .args(["quit", "localhost"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Application stopped"));
}

#[test]
fn test_cli_launch_invalid_host() {
    let dir = tempfile::tempdir().unwrap();
    let path = init_config(dir.path());

    headsup()
        .arg("--config")
        .arg(&path)
        .args(["launch", "headset.local"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid host address"));
}

#[test]
fn test_cli_panel_help_and_status() {
    let dir = tempfile::tempdir().unwrap();
    let path = init_config(dir.path());

    headsup()
        .arg("--config")
        .arg(&path)
        .arg("panel")
        .write_stdin("help\nstatus\nexit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("start-calibration"))
        .stdout(predicate::str::contains("Disconnected"))
        .stdout(predicate::str::contains("Offline"));
}

#[test]
fn test_cli_panel_rejects_bad_input() {
    let dir = tempfile::tempdir().unwrap();
    let path = init_config(dir.path());

    headsup()
        .arg("--config")
        .arg(&path)
        .arg("panel")
        .write_stdin("connect headset.local\nconnect 10.0.0.9 4444\nreboot\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Invalid host address"))
        .stderr(predicate::str::contains("run 'launch' first"))
        .stderr(predicate::str::contains("Unknown command 'reboot'"));
}

#[test]
fn test_cli_panel_command_while_disconnected() {
    let dir = tempfile::tempdir().unwrap();
    let path = init_config(dir.path());

    headsup()
        .arg("--config")
        .arg(&path)
        .arg("panel")
        .write_stdin("screenshot\nexit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Cannot send command 'screenshot': not connected",
        ));
}

#[test]
fn test_cli_panel_requires_existing_explicit_config() {
    headsup()
        .args(["--config", "/definitely/missing/headsup.toml", "panel"])
        .write_stdin("exit\n")
        .assert()
        .failure();
}
