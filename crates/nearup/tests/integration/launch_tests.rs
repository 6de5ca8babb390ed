//! Launcher tests against the stand-in node binary.

use nearup::{HomePlan, Localnet, LocalnetError, Overrides, PidRecord, SystemHost, stop_recorded};
use serde_json::{Value, json};

use crate::harness::{FAKE_BINARY_NAME, TestLocalnet, wait_for_log};

fn read_json(path: &std::path::Path) -> color_eyre::Result<Value> {
    Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?)
}

/// Two validators: both patched, both spawned, both recorded, one log each.
#[test]
fn test_two_node_localnet() -> color_eyre::Result<()> {
    let net = TestLocalnet::new()?;
    let host = SystemHost::new();

    let (localnet, records) = Localnet::start(
        net.config(),
        &TestLocalnet::create_plan(2),
        &net.binary,
        &net.binary,
        &host,
    )?;
    assert_eq!(localnet.nodes.len(), 2);
    assert_eq!(records.len(), 2);

    for (id, (rpc, network)) in [(3030, 24567), (3031, 24568)].into_iter().enumerate() {
        let config = read_json(&net.home.join(format!("node{id}/config.json")))?;
        assert_eq!(config["rpc"]["addr"], format!("0.0.0.0:{rpc}"));
        assert_eq!(config["network"]["addr"], format!("0.0.0.0:{network}"));
        // Untouched keys survive patching.
        assert_eq!(config["consensus"]["min_num_peers"], 1);
        assert!(net.home.join(format!("node{id}/log_config.json")).is_file());
    }

    let content = std::fs::read_to_string(net.paths.pid_file())?;
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    for (line, record) in lines.iter().zip(&records) {
        let parsed: PidRecord = line.parse().map_err(color_eyre::eyre::Report::msg)?;
        assert_eq!(&parsed, record);
        assert_eq!(parsed.name, FAKE_BINARY_NAME);
        assert_eq!(parsed.network, "localnet");
    }

    let boot_log = wait_for_log(&net.log_file(0), " run");
    assert!(boot_log.contains(" run"), "node0 log: {boot_log}");
    assert!(!boot_log.contains("--boot-nodes"));

    let peer_log = wait_for_log(&net.log_file(1), "--boot-nodes");
    assert!(
        peer_log.contains("run --boot-nodes ed25519:KEY0@127.0.0.1:24567"),
        "node1 log: {peer_log}"
    );

    let summary = stop_recorded(&net.paths.pid_file(), &host)?;
    assert_eq!(summary.stopped.len(), 2);
    assert!(!net.paths.pid_file().exists());
    Ok(())
}

/// Overrides reach every node, but the allocated ports always win.
#[test]
fn test_overrides_are_merged() -> color_eyre::Result<()> {
    let net = TestLocalnet::new()?;
    let mut config = net.config();
    config.overrides = Overrides {
        config: Some(json!({
            "rpc": {"addr": "0.0.0.0:9999", "polling_config": {"polling_interval": 5}},
            "consensus": {"min_num_peers": 3}
        })),
        genesis: Some(json!({"epoch_length": 10})),
    };

    let (_localnet, _records) = Localnet::start(
        config,
        &TestLocalnet::create_plan(1),
        &net.binary,
        &net.binary,
        &SystemHost::new(),
    )?;

    let config = read_json(&net.home.join("node0/config.json"))?;
    assert_eq!(config["rpc"]["addr"], "0.0.0.0:3030");
    assert_eq!(config["rpc"]["polling_config"]["polling_interval"], 5);
    assert_eq!(config["consensus"]["min_num_peers"], 3);
    let genesis = read_json(&net.home.join("node0/genesis.json"))?;
    assert_eq!(genesis["epoch_length"], 10);
    assert_eq!(genesis["chain_id"], "test-chain");
    Ok(())
}

/// A second launch can reuse the node directories left by the first.
#[test]
fn test_relaunch_reuses_home() -> color_eyre::Result<()> {
    let net = TestLocalnet::new()?;
    let host = SystemHost::new();

    let (_first, first_records) = Localnet::start(
        net.config(),
        &TestLocalnet::create_plan(3),
        &net.binary,
        &net.binary,
        &host,
    )?;
    stop_recorded(&net.paths.pid_file(), &host)?;
    std::fs::write(net.log_file(0), "stale")?;

    let (second, second_records) =
        Localnet::start(net.config(), &HomePlan::Reuse, &net.binary, &net.binary, &host)?;
    assert_eq!(second.nodes.len(), 3);
    assert_eq!(second_records.len(), 3);
    assert_ne!(first_records, second_records);

    // The logs directory is recreated on every launch.
    let log = wait_for_log(&net.log_file(0), " run");
    assert!(!log.contains("stale"));
    Ok(())
}

/// A failing topology initialization launches nothing.
#[test]
fn test_failed_initialization() -> color_eyre::Result<()> {
    let net = TestLocalnet::with_init_exit_code(2)?;

    let err = Localnet::start(
        net.config(),
        &TestLocalnet::create_plan(2),
        &net.binary,
        &net.binary,
        &SystemHost::new(),
    )
    .unwrap_err();
    assert!(matches!(err, LocalnetError::InitFailed(status) if status.code() == Some(2)));
    assert!(!net.paths.pid_file().exists());
    assert!(!net.paths.logs_dir().exists());
    Ok(())
}

/// Reusing a home that holds no node directories is an error.
#[test]
fn test_reuse_of_empty_home() -> color_eyre::Result<()> {
    let net = TestLocalnet::new()?;
    std::fs::create_dir_all(&net.home)?;

    let err = Localnet::start(
        net.config(),
        &HomePlan::Reuse,
        &net.binary,
        &net.binary,
        &SystemHost::new(),
    )
    .unwrap_err();
    assert!(matches!(err, LocalnetError::MissingFile(path) if path == net.home.join("node0")));
    Ok(())
}
