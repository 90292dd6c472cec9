//! Relay loop tying the deposit watcher, the release relay and liveness
//! reporting together.

pub mod metrics;

use crate::metrics::Metrics;
use alloy_primitives::{Address, TxHash};
use alloy_provider::Provider;
use alloy_signer_local::PrivateKeySigner;
use client::{LedgerClient, RpcLedgerClient};
use config::RelayerConfig;
use deposit::{ConfirmationWatcher, DepositEvent};
use eyre::{bail, eyre, WrapErr};
use health::{HealthSink, LivenessReporter, Status};
use release::{IdempotentRelay, ReceiptSummary, RelayOutcome};
use std::{
    future::Future,
    time::{Duration, Instant},
};
use tracing::{debug, error, info, warn};

/// Lifecycle of the [`Orchestrator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    Starting,
    Running,
    ShuttingDown,
    Fatal,
}

/// Static settings of a relay loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub source_bridge: Address,
    pub destination_bridge: Address,
    pub confirmations: u64,
    pub poll_interval: Duration,
}

impl From<&RelayerConfig> for Settings {
    fn from(config: &RelayerConfig) -> Self {
        Self {
            source_bridge: config.source.bridge_address,
            destination_bridge: config.destination.bridge_address,
            confirmations: config.block_confirmations,
            poll_interval: config.poll_interval(),
        }
    }
}

/// What one cycle did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleSummary {
    /// Source height observed by the watcher
    pub source_height: Option<u64>,
    /// Deposits newly confirmed this cycle
    pub confirmed: usize,
    /// Deposits carried over from earlier failed attempts
    pub retried: usize,
    pub submitted: Vec<TxHash>,
    pub skipped: usize,
    pub failed: usize,
    pub receipts: ReceiptSummary,
}

/// Drives the relay loop: poll, relay, report, sleep.
pub struct Orchestrator<S, D, H> {
    watcher: ConfirmationWatcher<S>,
    relay: IdempotentRelay<D>,
    reporter: LivenessReporter<H>,
    poll_interval: Duration,
    state: OrchestratorState,
    highest_height: Option<u64>,
    retry_queue: Vec<DepositEvent>,
    metrics: Metrics,
}

impl<S, D, H> Orchestrator<S, D, H>
where
    S: LedgerClient,
    D: LedgerClient,
    H: HealthSink,
{
    /// Check both ledgers and assemble the loop.
    ///
    /// Fails if either ledger is unreachable or the destination chain id
    /// cannot be read.
    pub async fn start(
        source: S,
        destination: D,
        sink: H,
        signer: PrivateKeySigner,
        settings: Settings,
    ) -> eyre::Result<Self> {
        debug!(state = ?OrchestratorState::Starting, "Checking ledger connectivity");

        if !source.is_reachable().await {
            bail!("Source chain ({}) is unreachable", source.name());
        }
        if !destination.is_reachable().await {
            bail!("Destination chain ({}) is unreachable", destination.name());
        }

        let chain_id = destination
            .chain_id()
            .await
            .wrap_err("Failed to read destination chain id")?;

        let relayer = signer.address();
        info!(
            relayer = %relayer,
            destination_chain_id = chain_id,
            confirmations = settings.confirmations,
            poll_interval_secs = settings.poll_interval.as_secs(),
            "Connected to both chains"
        );

        Ok(Self {
            watcher: ConfirmationWatcher::new(source, settings.source_bridge, settings.confirmations),
            relay: IdempotentRelay::new(destination, settings.destination_bridge, chain_id, signer),
            reporter: LivenessReporter::new(sink, relayer),
            poll_interval: settings.poll_interval,
            state: OrchestratorState::Running,
            highest_height: None,
            retry_queue: Vec::new(),
            metrics: Metrics::new(),
        })
    }

    pub const fn state(&self) -> OrchestratorState {
        self.state
    }

    pub const fn watcher(&self) -> &ConfirmationWatcher<S> {
        &self.watcher
    }

    pub const fn relay(&self) -> &IdempotentRelay<D> {
        &self.relay
    }

    pub const fn reporter(&self) -> &LivenessReporter<H> {
        &self.reporter
    }

    /// Deposits whose last relay attempt failed.
    pub fn retry_queue(&self) -> &[DepositEvent] {
        &self.retry_queue
    }

    /// Run cycles until `shutdown` resolves or a cycle fails.
    ///
    /// A failed cycle sends one `ERROR` report and returns the error.
    pub async fn run<F>(&mut self, shutdown: F) -> eyre::Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let result = tokio::select! {
                _ = &mut shutdown => None,
                result = self.run_cycle() => Some(result),
            };

            match result {
                None => break,
                Some(Ok(summary)) => debug!(?summary, "Cycle complete"),
                Some(Err(e)) => {
                    error!(error = ?e, "Unhandled error in relay loop, stopping");
                    self.state = OrchestratorState::Fatal;

                    let height = self.watcher.last_height().unwrap_or_default();
                    self.reporter.report_now(Status::Error, height, 0).await;

                    return Err(e);
                }
            }

            let interrupted = tokio::select! {
                _ = &mut shutdown => true,
                _ = tokio::time::sleep(self.poll_interval) => false,
            };
            if interrupted {
                break;
            }
        }

        info!("Shutdown signal received, exiting relay loop");
        self.state = OrchestratorState::ShuttingDown;

        Ok(())
    }

    /// Run a single poll / relay / report cycle.
    pub async fn run_cycle(&mut self) -> eyre::Result<CycleSummary> {
        let started = Instant::now();
        let result = self.cycle().await;
        self.metrics.record_cycle(result.is_ok(), started.elapsed());
        result
    }

    async fn cycle(&mut self) -> eyre::Result<CycleSummary> {
        let confirmed = self.watcher.poll().await;
        let source_height = self.watcher.last_height();

        self.check_source_height(source_height)?;

        let mut summary = CycleSummary {
            source_height,
            confirmed: confirmed.len(),
            retried: self.retry_queue.len(),
            ..Default::default()
        };

        if !confirmed.is_empty() {
            info!(count = confirmed.len(), "Found new confirmed deposits");
        }

        let mut pending = std::mem::take(&mut self.retry_queue);
        pending.extend(confirmed);

        for event in pending {
            let outcome = self.relay.relay(&event).await;
            self.metrics.record_release(outcome.label());

            match outcome {
                RelayOutcome::Submitted(tx_hash) => summary.submitted.push(tx_hash),
                RelayOutcome::Skipped => summary.skipped += 1,
                RelayOutcome::Failed(_) => {
                    summary.failed += 1;
                    self.retry_queue.push(event);
                }
            }
        }

        if !self.retry_queue.is_empty() {
            warn!(count = self.retry_queue.len(), "Deposits queued for retry");
        }

        summary.receipts = self.relay.check_receipts().await;

        self.reporter
            .report(
                Status::Operational,
                source_height.unwrap_or_default(),
                summary.confirmed,
            )
            .await;

        self.metrics.record_confirmed_deposits(summary.confirmed);
        self.metrics
            .record_receipts(summary.receipts.confirmed, summary.receipts.reverted);
        self.metrics
            .set_awaiting_receipt(self.relay.state().awaiting_receipt().len());
        self.metrics.set_retry_queue(self.retry_queue.len());
        if let Some(height) = source_height {
            self.metrics.set_source_height(height);
        }

        Ok(summary)
    }

    /// Fail if the source chain went back further than the confirmation depth.
    fn check_source_height(&mut self, height: Option<u64>) -> eyre::Result<()> {
        let Some(height) = height else {
            return Ok(());
        };

        if let Some(highest) = self.highest_height {
            let depth = self.watcher.confirmations();
            if height.saturating_add(depth) < highest {
                bail!(
                    "Source chain height regressed from {} to {}, beyond the {} block confirmation depth",
                    highest,
                    height,
                    depth
                );
            }
        }

        self.highest_height = Some(self.highest_height.map_or(height, |h| h.max(height)));
        Ok(())
    }
}

/// Connect the source ledger client described by `config`.
///
/// `start_block` overrides the configured first block of the log scan.
pub fn source_client(
    config: &RelayerConfig,
    start_block: Option<u64>,
) -> eyre::Result<RpcLedgerClient<impl Provider + Clone>> {
    let client = client::connect(&config.source.rpc_url, "source")?
        .with_timeout(config.rpc_timeout())
        .with_redelivery_window(config.block_confirmations)
        .with_start_block(start_block.or(config.start_block));

    Ok(client)
}

/// Connect the destination ledger client described by `config`.
pub fn destination_client(
    config: &RelayerConfig,
) -> eyre::Result<RpcLedgerClient<impl Provider + Clone>> {
    let client = client::connect(&config.destination.rpc_url, "destination")?
        .with_timeout(config.rpc_timeout());

    Ok(client)
}

/// Parse the relayer signing key.
pub fn relayer_signer(config: &RelayerConfig) -> eyre::Result<PrivateKeySigner> {
    config
        .relayer_private_key
        .expose()
        .parse()
        .map_err(|_| eyre!("RELAYER_PRIVATE_KEY is not a valid private key"))
}

/// Initialise the tracing subscriber, `RUST_LOG` overriding the `info` default.
pub fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
