//! Localnet initialization, patching and launch.

use std::fs;
use std::net::TcpListener;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::binary::{NODE_BINARY_NAME, NodeBinary, RunInvocation, Spawner, Topology};
use crate::error::{LocalnetError, Result};
use crate::host::HostProcesses;
use crate::node::{LocalnetNode, LogConfig, Overrides};
use crate::paths::NearupPaths;
use crate::pid_file::{LOCALNET_LABEL, PidFile, PidRecord};
use crate::ports::{BOOT_NODE_HOST, PortAllocationStrategy};
use crate::prompt::ParameterResolver;

/// Configuration for launching a localnet.
#[derive(Debug, Clone)]
pub struct LocalnetConfig {
    /// Directory holding `node0`, `node1`, ...
    pub home: PathBuf,
    /// Directory receiving one log file per node; wiped on every launch.
    pub logs_dir: PathBuf,
    /// PID registry, rewritten on every launch.
    pub pid_file: PathBuf,
    /// Port allocation strategy.
    pub port_strategy: PortAllocationStrategy,
    /// Run nodes with `--verbose`.
    pub verbose: bool,
    /// Log every command line before running it.
    pub print_commands: bool,
    /// Documents merged into every node's `config.json` and `genesis.json`.
    pub overrides: Overrides,
    /// Written to every node's `log_config.json`.
    pub log_config: LogConfig,
}

impl LocalnetConfig {
    pub fn new(home: PathBuf, paths: &NearupPaths) -> Self {
        Self {
            home,
            logs_dir: paths.logs_dir(),
            pid_file: paths.pid_file(),
            port_strategy: PortAllocationStrategy::default(),
            verbose: false,
            print_commands: false,
            overrides: Overrides::default(),
            log_config: LogConfig::default(),
        }
    }
}

/// Parameters as supplied on the command line; `None` means "ask or default".
#[derive(Debug, Clone, Default)]
pub struct TopologyRequest {
    /// Remove a previous localnet without asking.
    pub override_existing: bool,
    pub num_validators: Option<usize>,
    pub num_non_validators: Option<usize>,
    pub num_shards: Option<usize>,
    pub fix_accounts: bool,
    pub archival_nodes: Option<String>,
    pub rpc_nodes: Option<String>,
    pub tracked_shards: Option<String>,
}

/// What to do with the localnet home before launching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HomePlan {
    /// Keep the existing node directories and launch them as they are.
    Reuse,
    /// Initialize a fresh topology, removing the existing home first if asked.
    Create {
        remove_existing: bool,
        topology: Topology,
    },
}

impl HomePlan {
    /// Settle every question about the home directory up front.
    pub fn resolve(
        home: &Path,
        request: TopologyRequest,
        resolver: &ParameterResolver<'_>,
    ) -> std::io::Result<Self> {
        let remove_existing = home.exists()
            && resolver.flag(
                "Would you like to remove data from the previous localnet run?",
                request.override_existing,
            )?;
        if home.exists() && !remove_existing {
            return Ok(Self::Reuse);
        }

        if resolver.is_interactive() && !home.exists() {
            info!(
                "Starting localnet NEAR nodes. This is a test network entirely local to this \
                 machine. Validators and non-validating nodes will be started, and will \
                 communicate with each other on localhost, producing blocks on top of a \
                 genesis block generated locally."
            );
        }

        let defaults = Topology::default();
        let num_validators = resolver.value(
            "How many validator nodes would you like to initialize this localnet with?",
            request.num_validators,
            defaults.num_validators,
        )?;
        let num_non_validators = resolver.value(
            "How many non-validator nodes would you like to initialize this localnet with?",
            request.num_non_validators,
            defaults.num_non_validators,
        )?;
        let num_shards = resolver.value(
            "How many shards would you like to initialize this localnet with?",
            request.num_shards,
            defaults.num_shards,
        )?;
        let fixed_shards = num_shards > 1
            && resolver.flag(
                "Would you like to setup fixed accounts for first (N-1) shards \
                 (shard0, shard1, ...)?",
                request.fix_accounts,
            )?;
        let archival_nodes = resolver.value(
            "What nodes should be archival nodes (keep full history)?",
            request.archival_nodes,
            defaults.archival_nodes,
        )?;
        let rpc_nodes = resolver.value(
            "What nodes should be RPC nodes?",
            request.rpc_nodes,
            defaults.rpc_nodes,
        )?;
        let tracked_shards = resolver.value(
            "What shards should be tracked? Comma separated list of shards, 'all' or 'none'.",
            request.tracked_shards,
            defaults.tracked_shards,
        )?;

        Ok(Self::Create {
            remove_existing,
            topology: Topology {
                num_validators,
                num_non_validators,
                num_shards,
                fixed_shards,
                archival_nodes,
                rpc_nodes,
                tracked_shards,
            },
        })
    }
}

/// Abort if a node process is already running on this host.
pub fn ensure_not_running(host: &dyn HostProcesses) -> Result<()> {
    if host.is_running(NODE_BINARY_NAME) {
        return Err(LocalnetError::AlreadyRunning {
            binary: NODE_BINARY_NAME.to_string(),
        });
    }
    Ok(())
}

/// A localnet consisting of `num_nodes` nodes under one home directory.
#[derive(Debug, Clone)]
pub struct Localnet {
    /// The localnet configuration.
    pub config: LocalnetConfig,
    /// The nodes, ordered by id.
    pub nodes: Vec<LocalnetNode>,
}

impl Localnet {
    /// Lay out `num_nodes` nodes under the home, failing if their ports do
    /// not fit below 65535.
    pub fn new(config: LocalnetConfig, num_nodes: usize) -> Result<Self> {
        let nodes = (0..num_nodes)
            .map(|id| {
                let ports = config.port_strategy.allocate(id)?;
                Some(LocalnetNode::new(id, ports, &config.home))
            })
            .collect::<Option<Vec<_>>>()
            .ok_or(LocalnetError::TooManyNodes { num_nodes })?;
        Ok(Self { config, nodes })
    }

    /// Build a localnet from the node directories already present under the home.
    pub fn discover(config: LocalnetConfig) -> Result<Self> {
        let num_nodes = (0..)
            .take_while(|id| config.home.join(format!("node{id}")).is_dir())
            .count();
        if num_nodes == 0 {
            return Err(LocalnetError::MissingFile(config.home.join("node0")));
        }
        Self::new(config, num_nodes)
    }

    /// Apply `plan` to the home directory and return the resulting localnet.
    ///
    /// Blocks until the node binary has finished generating the topology. A
    /// topology too large for the port range is rejected before anything on
    /// disk changes.
    pub fn initialize(
        config: LocalnetConfig,
        plan: &HomePlan,
        binary: &NodeBinary,
    ) -> Result<Self> {
        match plan {
            HomePlan::Reuse => {
                info!("Reusing existing localnet at {}", config.home.display());
                Self::discover(config)
            }
            HomePlan::Create {
                remove_existing,
                topology,
            } => {
                let localnet = Self::new(config, topology.num_nodes())?;
                let config = &localnet.config;
                if *remove_existing && config.home.exists() {
                    info!("Removing old data from {}", config.home.display());
                    fs::remove_dir_all(&config.home)
                        .map_err(LocalnetError::filesystem(&config.home))?;
                }
                binary.init_localnet(
                    &config.home,
                    topology,
                    config.log_config.opentelemetry.as_deref(),
                    config.print_commands,
                )?;
                Ok(localnet)
            }
        }
    }

    /// Patch every node's files. Stops at the first failing node.
    pub fn patch_nodes(&self) -> Result<()> {
        for node in &self.nodes {
            node.patch(&self.config.overrides, &self.config.log_config)?;
        }
        Ok(())
    }

    /// Public key of node 0, the boot node.
    fn boot_node_key(&self) -> Result<String> {
        match self.nodes.first() {
            Some(node) => node.public_key(),
            None => Err(LocalnetError::MissingFile(
                self.config.home.join("node0").join("node_key.json"),
            )),
        }
    }

    /// Ports already bound on this host that some node wants to listen on.
    pub fn unavailable_ports(&self) -> Vec<String> {
        let mut unavailable = Vec::new();
        for node in &self.nodes {
            for (port, kind) in [(node.ports.rpc, "RPC"), (node.ports.network, "network")] {
                if let Err(e) = TcpListener::bind((BOOT_NODE_HOST, port)) {
                    unavailable.push(format!("{} {kind} (port {port}): {e}", node.name()));
                }
            }
        }
        unavailable
    }

    /// Spawn every node in id order and record their PIDs.
    ///
    /// Nodes are not waited for. If a spawn fails, earlier nodes keep running
    /// and the PID file lists only them.
    pub fn launch(
        &self,
        spawner: &dyn Spawner,
        host: &dyn HostProcesses,
    ) -> Result<Vec<PidRecord>> {
        let logs_dir = &self.config.logs_dir;
        if logs_dir.exists() {
            fs::remove_dir_all(logs_dir).map_err(LocalnetError::filesystem(logs_dir))?;
        }
        fs::create_dir_all(logs_dir).map_err(LocalnetError::filesystem(logs_dir))?;

        let public_key = self.boot_node_key()?;
        let boot_nodes = self.config.port_strategy.boot_node_address(&public_key);

        for unavailable in self.unavailable_ports() {
            warn!("port already in use: {unavailable}");
        }

        let mut pid_file = PidFile::create(&self.config.pid_file)?;
        let mut records = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let invocation = RunInvocation {
                node_home: node.home_dir.clone(),
                verbose: self.config.verbose,
                boot_nodes: (node.id > 0).then(|| boot_nodes.clone()),
                log_file: logs_dir.join(format!("{}.log", node.name())),
                print_command: self.config.print_commands,
            };
            let mut process = spawner.spawn(&invocation)?;
            let Some(name) = host.process_name(process.pid) else {
                if let Ok(Some(status)) = process.try_exit_status() {
                    warn!(
                        "{} exited immediately with {status}; see {}",
                        node.name(),
                        invocation.log_file.display()
                    );
                }
                return Err(LocalnetError::ProcessVanished { pid: process.pid });
            };
            let record = PidRecord {
                pid: process.pid,
                name,
                network: LOCALNET_LABEL.to_string(),
            };
            pid_file.append(&record)?;
            info!(
                "Started {} (pid {}): RPC={}, network={}",
                node.name(),
                record.pid,
                node.ports.rpc,
                node.ports.network
            );
            records.push(record);
        }

        Ok(records)
    }

    /// Initialize, patch and launch.
    ///
    /// Callers should run [`ensure_not_running`] first.
    pub fn start(
        config: LocalnetConfig,
        plan: &HomePlan,
        binary: &NodeBinary,
        spawner: &dyn Spawner,
        host: &dyn HostProcesses,
    ) -> Result<(Self, Vec<PidRecord>)> {
        let localnet = Self::initialize(config, plan, binary)?;
        info!("Patching {} nodes...", localnet.nodes.len());
        localnet.patch_nodes()?;
        let records = localnet.launch(spawner, host)?;

        info!("Localnet was spawned successfully...");
        info!(
            "Localnet logs written in: {}",
            localnet.config.logs_dir.display()
        );
        info!(
            "Check localnet status at http://127.0.0.1:{}/status",
            localnet.config.port_strategy.rpc_base
        );
        Ok((localnet, records))
    }
}
