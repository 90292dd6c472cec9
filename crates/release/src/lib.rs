//! Idempotent relay of confirmed deposits to the destination bridge.
//!
//! Each cross-chain transfer id is submitted for release at most once per
//! process. Failures leave the id unrecorded so the same deposit can be
//! retried on a later cycle.

pub mod relay;
pub mod state;
pub mod transaction;

#[cfg(test)]
pub(crate) mod test_utils;

use alloy_primitives::TxHash;
use client::ClientError;
pub use relay::{IdempotentRelay, ReceiptSummary};
pub use state::{RelayState, Release, ReleaseStatus};
pub use transaction::ReleaseTransaction;

/// Result of relaying one deposit.
#[derive(Debug)]
pub enum RelayOutcome {
    /// Release broadcast to the destination chain
    Submitted(TxHash),
    /// Transfer id already relayed by this process
    Skipped,
    /// Nothing was broadcast; the deposit stays eligible for retry
    Failed(ClientError),
}

impl RelayOutcome {
    pub const fn is_submitted(&self) -> bool {
        matches!(self, Self::Submitted(_))
    }

    pub const fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Short label used for metrics.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Submitted(_) => "submitted",
            Self::Skipped => "skipped",
            Self::Failed(_) => "failed",
        }
    }
}
