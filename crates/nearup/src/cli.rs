//! CLI command definitions for nearup.

use clap::Parser;
use std::future::Future;

mod localnet;
mod stop;

/// CLI options for nearup.
#[derive(Parser)]
#[command(name = "nearup")]
#[command(about = "Run and stop a local multi-node neard network")]
pub enum Options {
    /// Initialize and launch a localnet.
    Localnet(localnet::Localnet),
    /// Stop the nodes recorded in the PID file.
    Stop(stop::Stop),
}

/// Trait for running CLI commands.
pub trait Run {
    fn run(self) -> impl Future<Output = color_eyre::Result<()>> + Send;
}

impl Run for Options {
    async fn run(self) -> color_eyre::Result<()> {
        match self {
            Self::Localnet(cmd) => cmd.run().await,
            Self::Stop(cmd) => cmd.run().await,
        }
    }
}

/// The nearup state directory: `--nearup-dir` if given, else `~/.nearup`.
fn nearup_paths(explicit: Option<std::path::PathBuf>) -> color_eyre::Result<nearup::NearupPaths> {
    use color_eyre::eyre::OptionExt;

    match explicit {
        Some(dir) => Ok(nearup::NearupPaths::new(dir)),
        None => nearup::NearupPaths::from_home_dir()
            .ok_or_eyre("could not determine the home directory; pass --nearup-dir"),
    }
}
