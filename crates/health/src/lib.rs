//! Liveness reporting to an external health-check endpoint.
//!
//! [`LivenessReporter`] rate limits pushes to a [`HealthSink`]; sink failures
//! are logged and never surface to the caller.

pub mod reporter;
pub mod sink;

pub use reporter::LivenessReporter;
pub use sink::{HealthSink, HttpHealthSink, SinkError};

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Relayer status carried in a [`LivenessReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Operational,
    Error,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Operational => write!(f, "OPERATIONAL"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// Payload pushed to the health sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LivenessReport {
    /// Relayer account address
    pub relayer_id: Address,
    pub status: Status,
    /// Unix time in seconds
    pub timestamp: u64,
    /// Latest observed source chain height
    pub last_source_block: u64,
    /// Deposits handled in the reporting cycle
    pub pending_transactions: usize,
}
