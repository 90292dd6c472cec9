use clap::{Parser, ValueEnum};
use config::{RelayerArgs, RelayerConfig};
use eyre::WrapErr;
use health::HttpHealthSink;
use relayer::{
    destination_client, init_tracing, metrics::install_prometheus_exporter, relayer_signer,
    source_client, Orchestrator, Settings,
};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "relayer")]
#[command(about = "Relay confirmed source chain deposits to the destination bridge")]
struct Cli {
    /// Path to a TOML configuration file. Flags and environment are used when omitted.
    #[arg(short, long, env = "RELAYER_CONFIG")]
    config: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(flatten)]
    relayer: RelayerArgs,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format == LogFormat::Json);

    info!("Starting bridge relayer");

    let config = match &cli.config {
        Some(path) => {
            info!(path = %path.display(), "Loading config file");
            RelayerConfig::from_file(path)
        }
        None => RelayerConfig::try_from(cli.relayer),
    }
    .wrap_err("Configuration error")?;

    info!(
        source_bridge = %config.source.bridge_address,
        destination_bridge = %config.destination.bridge_address,
        confirmations = config.block_confirmations,
        poll_interval_secs = config.poll_interval_secs,
        "Loaded config"
    );

    if let Some(port) = config.metrics_port {
        install_prometheus_exporter(port)?;
        info!(port, "Prometheus exporter listening");
    }

    let signer = relayer_signer(&config)?;
    let source = source_client(&config, None)?;
    let destination = destination_client(&config)?;
    let sink = HttpHealthSink::new(config.healthcheck_url.clone())?;

    let mut orchestrator =
        match Orchestrator::start(source, destination, sink, signer, Settings::from(&config)).await {
            Ok(orchestrator) => orchestrator,
            Err(e) => {
                error!(error = ?e, "Failed to connect to one or both chains, exiting");
                return Err(e);
            }
        };

    info!("Entering relay loop, press Ctrl+C to exit");

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    };

    orchestrator.run(shutdown).await
}
