//! Node directories of a localnet.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{LocalnetError, Result};
use crate::merge::{self, MergeStrategy};
use crate::ports::NodePorts;

/// Logging settings handed to a node through `log_config.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// OpenTelemetry level, lower-cased.
    pub opentelemetry: Option<String>,
    /// `RUST_LOG`-style filter, upper-cased.
    pub rust_log: Option<String>,
}

impl LogConfig {
    pub fn new(opentelemetry: Option<&str>, log_level: Option<&str>) -> Self {
        Self {
            opentelemetry: opentelemetry.map(str::to_lowercase),
            rust_log: log_level.map(str::to_uppercase),
        }
    }
}

/// User-supplied documents merged into every node's generated files.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config: Option<Value>,
    pub genesis: Option<Value>,
}

/// A single node of the localnet, living in `home/node{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalnetNode {
    /// Position of the node in the network, starting at 0.
    pub id: usize,
    /// The ports allocated to this node.
    pub ports: NodePorts,
    /// The home directory for this node's data.
    pub home_dir: PathBuf,
}

impl LocalnetNode {
    pub fn new(id: usize, ports: NodePorts, network_home: &Path) -> Self {
        Self {
            id,
            ports,
            home_dir: network_home.join(format!("node{id}")),
        }
    }

    /// Name used for this node's log file and in messages.
    pub fn name(&self) -> String {
        format!("node{}", self.id)
    }

    pub fn config_path(&self) -> PathBuf {
        self.home_dir.join("config.json")
    }

    pub fn genesis_path(&self) -> PathBuf {
        self.home_dir.join("genesis.json")
    }

    pub fn node_key_path(&self) -> PathBuf {
        self.home_dir.join("node_key.json")
    }

    pub fn log_config_path(&self) -> PathBuf {
        self.home_dir.join("log_config.json")
    }

    /// Read the public key from this node's `node_key.json`.
    pub fn public_key(&self) -> Result<String> {
        let path = self.node_key_path();
        let node_key = read_json(&path)?;
        node_key
            .get("public_key")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| LocalnetError::MalformedFile {
                path,
                reason: "`public_key` is missing or not a string".to_string(),
            })
    }

    /// Merge overrides into this node's files, pin its listen addresses and
    /// write its logging configuration.
    pub fn patch(&self, overrides: &Overrides, log_config: &LogConfig) -> Result<()> {
        let config_path = self.config_path();
        let mut config = read_json(&config_path)?;
        if let Some(config_override) = &overrides.config {
            merge_override(&config_path, &mut config, config_override)?;
        }
        // Port assignment always wins over the override.
        set_listen_address(&config_path, &mut config, "rpc", self.ports.rpc_listen_address())?;
        set_listen_address(
            &config_path,
            &mut config,
            "network",
            self.ports.network_listen_address(),
        )?;
        write_json(&config_path, &config)?;

        let genesis_path = self.genesis_path();
        let mut genesis = read_json(&genesis_path)?;
        if let Some(genesis_override) = &overrides.genesis {
            merge_override(&genesis_path, &mut genesis, genesis_override)?;
        }
        write_json(&genesis_path, &genesis)?;

        write_json(&self.log_config_path(), log_config)?;

        tracing::debug!(
            node = %self.name(),
            rpc = self.ports.rpc,
            network = self.ports.network,
            "patched node"
        );
        Ok(())
    }
}

fn merge_override(path: &Path, document: &mut Value, overrides: &Value) -> Result<()> {
    merge::merge(document, overrides, MergeStrategy::TypesafeReplace).map_err(|source| {
        LocalnetError::MergeTypeConflict {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn set_listen_address(path: &Path, config: &mut Value, section: &str, addr: String) -> Result<()> {
    let section_map = config
        .get_mut(section)
        .and_then(Value::as_object_mut)
        .ok_or_else(|| LocalnetError::MalformedFile {
            path: path.to_path_buf(),
            reason: format!("`{section}` is missing or not an object"),
        })?;
    section_map.insert("addr".to_string(), Value::String(addr));
    Ok(())
}

/// Read a JSON document, failing with [`LocalnetError::MissingFile`] if it does not exist.
pub fn read_json(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Err(LocalnetError::MissingFile(path.to_path_buf()));
    }
    let content = fs::read_to_string(path).map_err(LocalnetError::filesystem(path))?;
    serde_json::from_str(&content).map_err(|e| LocalnetError::MalformedFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Write a document as pretty-printed JSON, replacing any prior content.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value).map_err(|e| LocalnetError::MalformedFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    fs::write(path, content).map_err(LocalnetError::filesystem(path))
}
