//! Invocations of the `neard` binary.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{LocalnetError, Result};

/// Name of the node binary and of its processes.
pub const NODE_BINARY_NAME: &str = "neard";

/// Parameters of the `localnet` topology initialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    pub num_validators: usize,
    pub num_non_validators: usize,
    pub num_shards: usize,
    /// Create fixed accounts `shard0`, `shard1`, ... for the first N-1 shards.
    pub fixed_shards: bool,
    /// Which nodes keep full history, e.g. `"0,2"`.
    pub archival_nodes: String,
    /// Which nodes serve RPC, e.g. `"1"`.
    pub rpc_nodes: String,
    /// Comma separated shard ids, `"all"` or `"none"`.
    pub tracked_shards: String,
}

impl Default for Topology {
    fn default() -> Self {
        Self {
            num_validators: 4,
            num_non_validators: 0,
            num_shards: 1,
            fixed_shards: false,
            archival_nodes: String::new(),
            rpc_nodes: String::new(),
            tracked_shards: "all".to_string(),
        }
    }
}

impl Topology {
    pub fn num_nodes(&self) -> usize {
        self.num_validators + self.num_non_validators
    }
}

/// A long-running `neard run` for one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunInvocation {
    pub node_home: PathBuf,
    pub verbose: bool,
    /// `None` for the bootstrap node.
    pub boot_nodes: Option<String>,
    /// File receiving both stdout and stderr.
    pub log_file: PathBuf,
    pub print_command: bool,
}

/// Handle to a spawned node process.
///
/// Dropping the handle leaves the process running.
#[derive(Debug)]
pub struct NodeProcess {
    pub pid: u32,
    child: Option<Child>,
}

impl NodeProcess {
    pub fn new(pid: u32, child: Option<Child>) -> Self {
        Self { pid, child }
    }

    /// The exit status, if the process has already exited.
    pub fn try_exit_status(&mut self) -> std::io::Result<Option<ExitStatus>> {
        match self.child.as_mut() {
            Some(child) => child.try_wait(),
            None => Ok(None),
        }
    }
}

/// Starts node processes.
pub trait Spawner {
    /// Start a node without waiting for it; returns as soon as the process exists.
    fn spawn(&self, invocation: &RunInvocation) -> Result<NodeProcess>;
}

/// The node binary on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeBinary {
    path: PathBuf,
}

impl NodeBinary {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Build `neard --home <home> localnet ...`.
    pub fn localnet_command(
        &self,
        home: &Path,
        topology: &Topology,
        opentelemetry: Option<&str>,
    ) -> Command {
        let mut command = Command::new(&self.path);
        command
            .arg("--home")
            .arg(home)
            .arg("localnet")
            .args(["--v", topology.num_validators.to_string().as_str()])
            .args(["--n", topology.num_non_validators.to_string().as_str()])
            .args(["--shards", topology.num_shards.to_string().as_str()]);
        if topology.fixed_shards {
            command.arg("--fixed-shards");
        }
        if !topology.archival_nodes.is_empty() {
            command.args(["--archival-nodes", topology.archival_nodes.as_str()]);
        }
        if !topology.rpc_nodes.is_empty() {
            command.args(["--rpc-nodes", topology.rpc_nodes.as_str()]);
        }
        if !topology.tracked_shards.is_empty() {
            command.args(["--tracked-shards", topology.tracked_shards.as_str()]);
        }
        if let Some(level) = opentelemetry {
            command.env("NEAR_OPENTELEMETRY", level.to_lowercase());
        }
        command
    }

    /// Build `neard --home <node_home> [--verbose ""] run [--boot-nodes <addr>]`.
    pub fn run_command(&self, invocation: &RunInvocation) -> Command {
        let mut command = Command::new(&self.path);
        command.arg("--home").arg(&invocation.node_home);
        if invocation.verbose {
            command.args(["--verbose", ""]).env("RUST_BACKTRACE", "1");
        }
        command.arg("run");
        if let Some(boot_nodes) = &invocation.boot_nodes {
            command.args(["--boot-nodes", boot_nodes.as_str()]);
        }
        command
    }

    /// Run the topology initialization and wait for it to exit.
    pub fn init_localnet(
        &self,
        home: &Path,
        topology: &Topology,
        opentelemetry: Option<&str>,
        print_command: bool,
    ) -> Result<()> {
        let mut command = self.localnet_command(home, topology, opentelemetry);
        if print_command {
            info!("Running {}", display_command(&command));
        }
        let status = command.status().map_err(|source| LocalnetError::Spawn {
            binary: self.path.clone(),
            source,
        })?;
        if !status.success() {
            return Err(LocalnetError::InitFailed(status));
        }
        Ok(())
    }
}

impl Spawner for NodeBinary {
    fn spawn(&self, invocation: &RunInvocation) -> Result<NodeProcess> {
        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&invocation.log_file)
            .map_err(LocalnetError::filesystem(&invocation.log_file))?;
        let log_err = log
            .try_clone()
            .map_err(LocalnetError::filesystem(&invocation.log_file))?;

        let mut command = self.run_command(invocation);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err));
        if invocation.print_command {
            info!("Running {}", display_command(&command));
        }

        let child = command.spawn().map_err(|source| LocalnetError::Spawn {
            binary: self.path.clone(),
            source,
        })?;
        Ok(NodeProcess::new(child.id(), Some(child)))
    }
}

fn display_command(command: &Command) -> String {
    std::iter::once(command.get_program())
        .chain(command.get_args())
        .map(|arg| arg.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}
