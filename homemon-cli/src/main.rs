//! ## homemon-cli
//! **Operator interface to the alert registry**
//!
//! Publishes, lists and deletes alerts by hand, sweeps expired ones, and runs
//! the collection service (`record-metrics`) until interrupted.

use clap::Parser;

mod commands;

use commands::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    commands::run_command(cli).await
}
