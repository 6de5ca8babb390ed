//! Tests for the `nearup` command line.

use std::process::Command;

use nearup::read_records;

use crate::harness::{FAKE_BINARY_NAME, TestLocalnet};

fn nearup() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_nearup"));
    command
        .env_remove("NEARUP_DIR")
        .env_remove("NEARUP_LOCALNET_HOME")
        .env_remove("NEARUP_DOWNLOAD_URL");
    command
}

/// `nearup stop` with nothing recorded succeeds quietly.
#[test]
fn test_stop_without_pid_file() -> color_eyre::Result<()> {
    let dir = tempfile::tempdir()?;
    let output = nearup()
        .arg("stop")
        .arg("--nearup-dir")
        .arg(dir.path())
        .output()?;
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    Ok(())
}

/// `nearup localnet` followed by `nearup stop`, sharing one state directory.
#[test]
fn test_localnet_then_stop() -> color_eyre::Result<()> {
    let net = TestLocalnet::new()?;

    let output = nearup()
        .arg("localnet")
        .arg("--binary-path")
        .arg(net.binary.path())
        .arg("--home")
        .arg(&net.home)
        .arg("--nearup-dir")
        .arg(net.paths.root())
        .args(["--num-nodes", "2", "--override", "--log-level", "debug"])
        .output()?;
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("nearup stop"));

    let records = read_records(&net.paths.pid_file())?;
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.name == FAKE_BINARY_NAME));

    let log_config: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(net.home.join("node1/log_config.json"))?)?;
    assert_eq!(log_config["rust_log"], "DEBUG");

    let output = nearup()
        .arg("stop")
        .arg("--nearup-dir")
        .arg(net.paths.root())
        .output()?;
    assert!(output.status.success());
    assert!(!net.paths.pid_file().exists());
    Ok(())
}

/// A missing binary cache without a download URL is reported, not panicked on.
#[test]
fn test_localnet_without_binary() -> color_eyre::Result<()> {
    let dir = tempfile::tempdir()?;
    let output = nearup()
        .arg("localnet")
        .arg("--home")
        .arg(dir.path().join("localnet"))
        .arg("--nearup-dir")
        .arg(dir.path().join(".nearup"))
        .output()?;
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--binary-path"));
    assert!(!dir.path().join("localnet").exists());
    Ok(())
}
