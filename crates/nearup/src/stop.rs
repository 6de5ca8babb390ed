//! Stopping the processes recorded in the PID file.

use std::path::Path;

use tracing::{info, warn};

use crate::error::{LocalnetError, Result};
use crate::host::HostProcesses;
use crate::pid_file::{PidRecord, read_records};

/// Outcome of [`stop_recorded`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StopSummary {
    /// Processes that were asked to terminate.
    pub stopped: Vec<PidRecord>,
    /// Records whose pid is gone or now belongs to another program.
    pub skipped: Vec<PidRecord>,
    /// Processes that are still ours but could not be signalled.
    pub failed: Vec<PidRecord>,
}

/// Terminate every recorded process that is still the one we started, then
/// remove the PID file.
///
/// A missing PID file means nothing is running and is not an error.
pub fn stop_recorded(pid_file: &Path, host: &dyn HostProcesses) -> Result<StopSummary> {
    let records = match read_records(pid_file) {
        Ok(records) => records,
        Err(LocalnetError::MissingFile(_)) => {
            info!("No PID file at {}; nothing to stop", pid_file.display());
            return Ok(StopSummary::default());
        }
        Err(e) => return Err(e),
    };

    let mut summary = StopSummary::default();
    for record in records {
        let still_ours = host.process_name(record.pid).as_deref() == Some(record.name.as_str());
        if !still_ours {
            warn!(
                "Process {} ({}) is no longer running; skipping",
                record.pid, record.name
            );
            summary.skipped.push(record);
        } else if host.terminate(record.pid) {
            info!("Stopping {} ({}, {})", record.pid, record.name, record.network);
            summary.stopped.push(record);
        } else {
            warn!(
                "Could not deliver a termination signal to {} ({})",
                record.pid, record.name
            );
            summary.failed.push(record);
        }
    }

    std::fs::remove_file(pid_file).map_err(LocalnetError::filesystem(pid_file))?;
    Ok(summary)
}
