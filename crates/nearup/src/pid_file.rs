//! The PID registry shared by `localnet` and `stop`.
//!
//! One line per process: `<pid>|<process-name>|<network>`.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{LocalnetError, Result};

/// Network label recorded for localnet processes.
pub const LOCALNET_LABEL: &str = "localnet";

/// A single spawned process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PidRecord {
    pub pid: u32,
    pub name: String,
    pub network: String,
}

impl fmt::Display for PidRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|{}", self.pid, self.name, self.network)
    }
}

impl FromStr for PidRecord {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut fields = line.trim().split('|');
        let (Some(pid), Some(name), Some(network), None) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(format!("expected `pid|name|network`, got {line:?}"));
        };
        let pid = pid.parse().map_err(|e| format!("invalid pid {pid:?}: {e}"))?;
        if name.is_empty() {
            return Err(format!("empty process name in {line:?}"));
        }
        Ok(Self {
            pid,
            name: name.to_string(),
            network: network.to_string(),
        })
    }
}

/// An open PID file; every record is flushed as soon as it is written.
pub struct PidFile {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl PidFile {
    /// Create the PID file, truncating any prior content.
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(LocalnetError::filesystem(parent))?;
        }
        let file = File::create(path).map_err(LocalnetError::filesystem(path))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    pub fn append(&mut self, record: &PidRecord) -> Result<()> {
        writeln!(self.writer, "{record}")
            .and_then(|()| self.writer.flush())
            .map_err(LocalnetError::filesystem(&self.path))
    }
}

/// Read every record of a PID file. Blank lines are skipped.
pub fn read_records(path: &Path) -> Result<Vec<PidRecord>> {
    if !path.exists() {
        return Err(LocalnetError::MissingFile(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path).map_err(LocalnetError::filesystem(path))?;
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            line.parse().map_err(|reason| LocalnetError::MalformedFile {
                path: path.to_path_buf(),
                reason,
            })
        })
        .collect()
}
