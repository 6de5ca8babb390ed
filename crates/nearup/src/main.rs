use clap::Parser as _;
use std::io::IsTerminal as _;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt as _, util::SubscriberInitExt as _};

use crate::cli::Run as _;
use nearup::{ALREADY_RUNNING_EXIT_CODE, LocalnetError};

mod cli;

#[tokio::main]
async fn main() -> color_eyre::Result<ExitCode> {
    color_eyre::install()?;
    // The `FmtLayer` prints to stderr, colorizing only if we're in a tty.
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .with_target(false);
    // The `EnvFilter` layer is used to filter events based on `RUST_LOG`.
    let filter_layer = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();

    let result = cli::Options::parse().run().await;
    exit_status(result).map(ExitCode::from)
}

/// Map a command's outcome to the process exit status. A node that is already
/// running gets its own status; every other error is reported by color-eyre.
fn exit_status(result: color_eyre::Result<()>) -> color_eyre::Result<u8> {
    match result {
        Ok(()) => Ok(0),
        Err(report) => match report.downcast_ref::<LocalnetError>() {
            Some(err @ LocalnetError::AlreadyRunning { .. }) => {
                tracing::error!("{err}");
                Ok(ALREADY_RUNNING_EXIT_CODE)
            }
            _ => Err(report),
        },
    }
}
