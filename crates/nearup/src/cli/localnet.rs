//! Localnet command implementation.

use std::path::{Path, PathBuf};

use clap::Parser;
use color_eyre::eyre::{Context, OptionExt, Result};
use tracing::info;

use super::Run;
use nearup::{
    HomePlan, HttpDownloader, Localnet as LocalnetNetwork, LocalnetConfig, LogConfig, Overrides,
    ParameterResolver, SystemHost, TerminalPrompter, TopologyRequest, default_localnet_home,
    ensure_not_running, resolve_binary,
};

/// Initialize and launch a localnet.
#[derive(Parser)]
pub struct Localnet {
    /// The neard binary, or a directory containing it. Taken from the cache
    /// (or downloaded) when omitted.
    #[arg(long)]
    pub binary_path: Option<PathBuf>,

    /// URL to download neard from when --binary-path is not given.
    #[arg(long, env = "NEARUP_DOWNLOAD_URL")]
    pub download_url: Option<String>,

    /// Directory for the node data (default: ~/.near/localnet).
    #[arg(long, env = "NEARUP_LOCALNET_HOME")]
    pub home: Option<PathBuf>,

    /// Directory for nearup's logs, PID file and binary cache (default: ~/.nearup).
    #[arg(long, env = "NEARUP_DIR")]
    pub nearup_dir: Option<PathBuf>,

    /// Number of validator nodes (default: 4).
    #[arg(long, alias = "num-nodes")]
    pub num_validators: Option<usize>,

    /// Number of non-validator nodes (default: 0).
    #[arg(long)]
    pub num_non_validators: Option<usize>,

    /// Number of shards (default: 1).
    #[arg(long)]
    pub num_shards: Option<usize>,

    /// Remove data from a previous localnet run without asking.
    #[arg(long = "override")]
    pub override_existing: bool,

    /// Create fixed accounts shard0, shard1, ... for the first N-1 shards.
    #[arg(long)]
    pub fix_accounts: bool,

    /// Nodes that keep full history, e.g. "0,2".
    #[arg(long)]
    pub archival_nodes: Option<String>,

    /// Nodes that serve RPC, e.g. "1".
    #[arg(long)]
    pub rpc_nodes: Option<String>,

    /// Shards to track: comma separated ids, "all" or "none" (default: all).
    #[arg(long)]
    pub tracked_shards: Option<String>,

    /// Run the nodes with verbose logging.
    #[arg(long)]
    pub verbose: bool,

    /// Ask for every parameter not given on the command line.
    #[arg(long)]
    pub interactive: bool,

    /// JSON file merged into every node's config.json.
    #[arg(long)]
    pub config_override_path: Option<PathBuf>,

    /// JSON file merged into every node's genesis.json.
    #[arg(long)]
    pub genesis_override_path: Option<PathBuf>,

    /// Log level written to every node's log_config.json.
    #[arg(long)]
    pub log_level: Option<String>,

    /// OpenTelemetry level written to every node's log_config.json.
    #[arg(long)]
    pub opentelemetry: Option<String>,
}

async fn read_override(path: Option<&Path>) -> Result<Option<serde_json::Value>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let content = tokio::fs::read_to_string(path)
        .await
        .wrap_err_with(|| format!("failed to read override {:?}", path))?;
    let value = serde_json::from_str(&content)
        .wrap_err_with(|| format!("failed to parse override {:?}", path))?;
    Ok(Some(value))
}

impl Run for Localnet {
    async fn run(self) -> Result<()> {
        let paths = super::nearup_paths(self.nearup_dir.clone())?;
        let downloader = self.download_url.clone().map(|url| HttpDownloader { url });
        let binary = resolve_binary(self.binary_path.as_deref(), &paths, downloader.as_ref()).await?;
        info!("Using node binary {}", binary.path().display());

        let overrides = Overrides {
            config: read_override(self.config_override_path.as_deref()).await?,
            genesis: read_override(self.genesis_override_path.as_deref()).await?,
        };

        let host = SystemHost::new();
        ensure_not_running(&host)?;

        let home = match self.home {
            Some(home) => home,
            None => default_localnet_home()
                .ok_or_eyre("could not determine the home directory; pass --home")?,
        };

        let request = TopologyRequest {
            override_existing: self.override_existing,
            num_validators: self.num_validators,
            num_non_validators: self.num_non_validators,
            num_shards: self.num_shards,
            fix_accounts: self.fix_accounts,
            archival_nodes: self.archival_nodes,
            rpc_nodes: self.rpc_nodes,
            tracked_shards: self.tracked_shards,
        };
        let prompter = TerminalPrompter;
        let resolver = if self.interactive {
            ParameterResolver::interactive(&prompter)
        } else {
            ParameterResolver::non_interactive()
        };
        let plan = HomePlan::resolve(&home, request, &resolver)
            .wrap_err("failed to read localnet parameters")?;

        let mut config = LocalnetConfig::new(home, &paths);
        config.verbose = self.verbose;
        config.print_commands = self.interactive;
        config.overrides = overrides;
        config.log_config = LogConfig::new(self.opentelemetry.as_deref(), self.log_level.as_deref());

        let (network, _records) = LocalnetNetwork::start(config, &plan, &binary, &binary, &host)?;

        for node in &network.nodes {
            info!(
                "  {}: RPC={}, network={}, home={}",
                node.name(),
                node.ports.rpc,
                node.ports.network,
                node.home_dir.display()
            );
        }

        println!("\nTo stop the localnet:");
        println!("  nearup stop");

        Ok(())
    }
}
