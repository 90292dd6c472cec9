use crate::{sink::HealthSink, LivenessReport, Status};
use alloy_primitives::Address;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Minimum spacing between two pushes.
pub const REPORT_INTERVAL: Duration = Duration::from_secs(60);

/// Rate-limited liveness reporting.
///
/// At most one push is attempted per interval. The interval restarts on every
/// attempt, whether or not the sink accepted the report.
pub struct LivenessReporter<S> {
    sink: S,
    relayer_id: Address,
    interval: Duration,
    last_emission: Option<Instant>,
}

impl<S> LivenessReporter<S>
where
    S: HealthSink,
{
    pub const fn new(sink: S, relayer_id: Address) -> Self {
        Self {
            sink,
            relayer_id,
            interval: REPORT_INTERVAL,
            last_emission: None,
        }
    }

    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Push a report unless one was attempted within the interval.
    ///
    /// Returns true if a push was attempted.
    pub async fn report(&mut self, status: Status, last_source_block: u64, pending: usize) -> bool {
        if let Some(last) = self.last_emission {
            if last.elapsed() < self.interval {
                debug!(%status, "Liveness report rate limited");
                return false;
            }
        }

        self.report_now(status, last_source_block, pending).await;
        true
    }

    /// Push a report regardless of the rate limit.
    pub async fn report_now(&mut self, status: Status, last_source_block: u64, pending: usize) {
        let report = LivenessReport {
            relayer_id: self.relayer_id,
            status,
            timestamp: unix_now(),
            last_source_block,
            pending_transactions: pending,
        };

        self.last_emission = Some(Instant::now());

        match self.sink.push(&report).await {
            Ok(()) => info!(%status, last_source_block, pending, "Reported liveness"),
            Err(e) => warn!(%status, error = %e, "Failed to report liveness"),
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
