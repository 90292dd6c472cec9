//! Releases submitted by this process, keyed by cross-chain transfer id.

use alloy_primitives::{TxHash, B256};
use std::collections::HashMap;

/// Execution status of a submitted release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseStatus {
    /// Accepted by the destination node, receipt not seen yet
    Submitted,
    /// Mined and executed
    Confirmed,
    /// Mined and reverted; never resubmitted automatically
    Reverted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    /// Destination transaction carrying the release
    pub tx_hash: TxHash,
    pub status: ReleaseStatus,
}

/// Ids submitted for release. An id is recorded once, on successful
/// broadcast, and is never removed: whatever its status, it is not
/// submitted again.
#[derive(Debug, Default)]
pub struct RelayState {
    releases: HashMap<B256, Release>,
}

impl RelayState {
    pub fn contains(&self, id: &B256) -> bool {
        self.releases.contains_key(id)
    }

    pub fn get(&self, id: &B256) -> Option<&Release> {
        self.releases.get(id)
    }

    /// Record a broadcast release. Returns false, leaving the existing entry
    /// untouched, if `id` was already recorded.
    pub fn record_submitted(&mut self, id: B256, tx_hash: TxHash) -> bool {
        if self.releases.contains_key(&id) {
            return false;
        }
        self.releases.insert(
            id,
            Release {
                tx_hash,
                status: ReleaseStatus::Submitted,
            },
        );
        true
    }

    pub fn set_status(&mut self, id: &B256, status: ReleaseStatus) {
        if let Some(release) = self.releases.get_mut(id) {
            release.status = status;
        }
    }

    /// Releases still waiting for a receipt.
    pub fn awaiting_receipt(&self) -> Vec<(B256, TxHash)> {
        self.releases
            .iter()
            .filter(|(_, release)| release.status == ReleaseStatus::Submitted)
            .map(|(id, release)| (*id, release.tx_hash))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.releases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }
}
