//! Errors raised while preparing or launching a localnet.

use std::path::PathBuf;
use std::process::ExitStatus;

use crate::merge::MergeError;

/// Exit code used when a node binary is already running on this host.
pub const ALREADY_RUNNING_EXIT_CODE: u8 = 3;

/// Errors that may occur while initializing, patching, launching or stopping a localnet.
#[derive(thiserror::Error, Debug)]
pub enum LocalnetError {
    /// An expected file under a node directory does not exist.
    #[error("missing file: {}", .0.display())]
    MissingFile(PathBuf),
    /// A file exists but does not have the expected shape.
    #[error("malformed file {}: {reason}", path.display())]
    MalformedFile { path: PathBuf, reason: String },
    /// An override could not be merged into a generated file.
    #[error("cannot merge override into {}", path.display())]
    MergeTypeConflict {
        path: PathBuf,
        #[source]
        source: MergeError,
    },
    /// A filesystem operation failed.
    #[error("filesystem operation on {} failed", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A node process of the binary is already running on this host.
    #[error("{binary} is already running; stop it first with `nearup stop`")]
    AlreadyRunning { binary: String },
    /// The node binary could not be started.
    #[error("failed to start {}", binary.display())]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The topology initialization exited unsuccessfully.
    #[error("localnet initialization exited with {0}")]
    InitFailed(ExitStatus),
    /// A freshly spawned process has no name, meaning it already exited.
    #[error("process {pid} exited before its name could be recorded")]
    ProcessVanished { pid: u32 },
    /// The topology has more nodes than the port range can hold.
    #[error("{num_nodes} nodes do not fit in the port range; use fewer nodes")]
    TooManyNodes { num_nodes: usize },
    /// The node binary could not be downloaded.
    #[error("failed to download node binary: {0}")]
    Download(String),
}

impl LocalnetError {
    /// Wrap an I/O error with the path it happened on.
    pub fn filesystem(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Filesystem { path, source }
    }
}

pub type Result<T, E = LocalnetError> = std::result::Result<T, E>;
