//! Where nearup keeps its state.

use std::path::{Path, PathBuf};

use crate::binary::NODE_BINARY_NAME;

/// Layout of the nearup state directory (`~/.nearup` by default).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NearupPaths {
    root: PathBuf,
}

impl NearupPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `~/.nearup`, or `None` if the home directory cannot be determined.
    pub fn from_home_dir() -> Option<Self> {
        directories::BaseDirs::new().map(|dirs| Self::new(dirs.home_dir().join(".nearup")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Cache directory holding the downloaded localnet binary.
    pub fn binary_cache_dir(&self) -> PathBuf {
        self.root.join("localnet")
    }

    pub fn cached_binary(&self) -> PathBuf {
        self.binary_cache_dir().join(NODE_BINARY_NAME)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs").join("localnet")
    }

    pub fn pid_file(&self) -> PathBuf {
        self.root.join("node.pid")
    }
}

/// `~/.near/localnet`, the default network home.
pub fn default_localnet_home() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| dirs.home_dir().join(".near").join("localnet"))
}
