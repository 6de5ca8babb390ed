//! Stop command implementation.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::info;

use super::Run;
use nearup::{SystemHost, stop_recorded};

/// Stop the nodes recorded in the PID file.
#[derive(Parser)]
pub struct Stop {
    /// Directory holding nearup's PID file (default: ~/.nearup).
    #[arg(long, env = "NEARUP_DIR")]
    pub nearup_dir: Option<PathBuf>,
}

impl Run for Stop {
    async fn run(self) -> Result<()> {
        let paths = super::nearup_paths(self.nearup_dir)?;
        let summary = stop_recorded(&paths.pid_file(), &SystemHost::new())?;
        info!(
            "Stopped {} processes ({} already gone, {} could not be signalled)",
            summary.stopped.len(),
            summary.skipped.len(),
            summary.failed.len()
        );
        Ok(())
    }
}
