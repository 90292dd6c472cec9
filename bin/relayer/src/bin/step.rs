//! CLI tool to run a single relayer action against live chains.
//!
//! - `check`: probe both chains and print their chain ids and heights
//! - `poll`: run one watcher poll and print the confirmed deposits, relaying nothing
//! - `cycle`: run one full poll / relay / report cycle

use clap::{Parser, Subcommand};
use client::LedgerClient;
use config::{RelayerArgs, RelayerConfig};
use deposit::ConfirmationWatcher;
use health::HttpHealthSink;
use relayer::{
    destination_client, init_tracing, relayer_signer, source_client, Orchestrator, Settings,
};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "step")]
#[command(about = "Run individual relayer steps for testing")]
struct Cli {
    /// Path to a TOML configuration file. Flags and environment are used when omitted.
    #[arg(short, long, env = "RELAYER_CONFIG")]
    config: Option<PathBuf>,

    /// First source block to scan for deposits, overriding the configured start block
    #[arg(long)]
    from_block: Option<u64>,

    #[command(flatten)]
    relayer: RelayerArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check both chains are reachable and print their heights
    Check,

    /// Print confirmed deposits without relaying them
    Poll,

    /// Run one full relay cycle
    Cycle,
}

async fn describe(client: &impl LedgerClient) -> eyre::Result<()> {
    let chain_id = client.chain_id().await?;
    let height = client.latest_block_height().await?;
    info!(chain = client.name(), chain_id, height, "Reachable");
    Ok(())
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    init_tracing(false);

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => RelayerConfig::from_file(path)?,
        None => RelayerConfig::try_from(cli.relayer)?,
    };

    let source = source_client(&config, cli.from_block)?;
    let destination = destination_client(&config)?;

    match cli.command {
        Command::Check => {
            info!("Running: check");

            describe(&source).await?;
            describe(&destination).await?;

            info!("Step completed: check");
        }
        Command::Poll => {
            info!("Running: poll");

            let mut watcher = ConfirmationWatcher::new(
                source,
                config.source.bridge_address,
                config.block_confirmations,
            );
            let events = watcher.poll().await;

            for event in &events {
                info!(
                    tx_hash = %event.source_tx_hash,
                    block = event.block_number,
                    cross_chain_tx_id = %event.cross_chain_tx_id,
                    recipient = %event.recipient,
                    amount = %event.amount,
                    destination_chain_id = event.destination_chain_id,
                    "Confirmed deposit"
                );
            }

            info!(
                count = events.len(),
                height = ?watcher.last_height(),
                "Step completed: poll"
            );
        }
        Command::Cycle => {
            info!("Running: cycle");

            let signer = relayer_signer(&config)?;
            let sink = HttpHealthSink::new(config.healthcheck_url.clone())?;
            let mut orchestrator =
                Orchestrator::start(source, destination, sink, signer, Settings::from(&config))
                    .await?;

            let summary = orchestrator.run_cycle().await?;

            info!(?summary, "Step completed: cycle");
        }
    }

    Ok(())
}
