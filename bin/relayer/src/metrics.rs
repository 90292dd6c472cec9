//! Prometheus metrics for the relayer.
//!
//! All metrics are recorded through the [`Metrics`] handle. Without an
//! installed exporter the calls are no-ops.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Metrics {
    _private: (),
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Create a new metrics instance and register all metric descriptions.
    pub fn new() -> Self {
        Self::register_descriptions();
        Self { _private: () }
    }

    fn register_descriptions() {
        // Cycle metrics
        describe_counter!("relayer_cycles_total", "Total number of relay cycles executed");
        describe_counter!(
            "relayer_cycles_failure_total",
            "Total number of relay cycles that ended in an error"
        );
        describe_histogram!(
            "relayer_cycle_duration_seconds",
            "Duration of each relay cycle in seconds"
        );

        // Deposit metrics
        describe_counter!(
            "relayer_deposits_confirmed_total",
            "Total number of source deposits that reached confirmation depth"
        );
        describe_gauge!(
            "relayer_source_block_height",
            "Latest source chain height observed by the watcher"
        );

        // Release metrics
        describe_counter!(
            "relayer_releases_total",
            "Total relay attempts by outcome (submitted, skipped, failed)"
        );
        describe_counter!(
            "relayer_release_receipts_total",
            "Total release receipts observed by status (confirmed, reverted)"
        );
        describe_gauge!(
            "relayer_releases_awaiting_receipt",
            "Number of submitted releases without a receipt"
        );
        describe_gauge!(
            "relayer_retry_queue_length",
            "Number of deposits waiting for another relay attempt"
        );
    }

    /// Record a completed cycle.
    pub fn record_cycle(&self, success: bool, duration: Duration) {
        counter!("relayer_cycles_total").increment(1);
        histogram!("relayer_cycle_duration_seconds").record(duration.as_secs_f64());

        if !success {
            counter!("relayer_cycles_failure_total").increment(1);
        }
    }

    pub fn record_confirmed_deposits(&self, count: usize) {
        counter!("relayer_deposits_confirmed_total").increment(count as u64);
    }

    pub fn set_source_height(&self, height: u64) {
        gauge!("relayer_source_block_height").set(height as f64);
    }

    /// Record one relay attempt by outcome label.
    pub fn record_release(&self, outcome: &'static str) {
        counter!("relayer_releases_total", "outcome" => outcome).increment(1);
    }

    pub fn record_receipts(&self, confirmed: usize, reverted: usize) {
        counter!("relayer_release_receipts_total", "status" => "confirmed")
            .increment(confirmed as u64);
        counter!("relayer_release_receipts_total", "status" => "reverted")
            .increment(reverted as u64);
    }

    pub fn set_awaiting_receipt(&self, count: usize) {
        gauge!("relayer_releases_awaiting_receipt").set(count as f64);
    }

    pub fn set_retry_queue(&self, count: usize) {
        gauge!("relayer_retry_queue_length").set(count as f64);
    }
}

/// Install the Prometheus metrics exporter and start the HTTP server.
///
/// Returns an error if the server fails to bind to the specified port.
pub fn install_prometheus_exporter(port: u16) -> eyre::Result<()> {
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::net::SocketAddr;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| eyre::eyre!("Failed to install Prometheus exporter: {}", e))?;

    Ok(())
}
