//! nearup: Launch a local multi-node `neard` network.
//!
//! This crate provides both a CLI and library interface for initializing a
//! localnet with the node binary, patching every node's configuration and
//! spawning the nodes in the background.
//!
//! # Example
//!
//! ```rust,no_run
//! use nearup::{
//!     HomePlan, Localnet, LocalnetConfig, NearupPaths, NodeBinary, SystemHost, Topology,
//!     ensure_not_running,
//! };
//!
//! let paths = NearupPaths::new("/tmp/nearup");
//! let config = LocalnetConfig::new("/tmp/localnet".into(), &paths);
//! let binary = NodeBinary::new("/usr/local/bin/neard");
//! let host = SystemHost::new();
//! let plan = HomePlan::Create {
//!     remove_existing: true,
//!     topology: Topology::default(),
//! };
//!
//! ensure_not_running(&host).expect("a node is already running");
//! let (localnet, _pids) =
//!     Localnet::start(config, &plan, &binary, &binary, &host).expect("failed to start");
//! println!("{} nodes running", localnet.nodes.len());
//! ```

pub mod binary;
pub mod download;
pub mod error;
pub mod host;
pub mod merge;
pub mod network;
pub mod node;
pub mod paths;
pub mod pid_file;
pub mod ports;
pub mod prompt;
pub mod stop;

pub use binary::{NODE_BINARY_NAME, NodeBinary, NodeProcess, RunInvocation, Spawner, Topology};
pub use download::{Downloader, HttpDownloader, resolve_binary};
pub use error::{ALREADY_RUNNING_EXIT_CODE, LocalnetError};
pub use host::{HostProcesses, SystemHost};
pub use merge::{MergeError, MergeStrategy};
pub use network::{HomePlan, Localnet, LocalnetConfig, TopologyRequest, ensure_not_running};
pub use node::{LocalnetNode, LogConfig, Overrides};
pub use paths::{NearupPaths, default_localnet_home};
pub use pid_file::{PidRecord, read_records};
pub use ports::{NodePorts, PortAllocationStrategy};
pub use prompt::{ParameterResolver, Prompter, TerminalPrompter};
pub use stop::{StopSummary, stop_recorded};
