//! Confirmation-gated deposit watcher.
//!
//! Polls the source chain for `TokensDeposited` logs and surfaces each one
//! exactly once, in the first poll where its block is at least
//! `confirmations` blocks below the chain tip.

use crate::event::DepositEvent;
use alloy_primitives::{Address, TxHash};
use alloy_rpc_types_eth::Filter;
use alloy_sol_types::SolEvent;
use binding::bridge::ISourceBridge::TokensDeposited;
use client::{ClientError, LedgerClient};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Source transaction hashes already surfaced as confirmed.
///
/// A hash enters once, when first returned, and never leaves.
#[derive(Debug, Default)]
pub struct ConfirmationState {
    seen: HashSet<TxHash>,
}

impl ConfirmationState {
    pub fn contains(&self, hash: &TxHash) -> bool {
        self.seen.contains(hash)
    }

    /// Record `hash`. Returns false if it was already present.
    pub fn insert(&mut self, hash: TxHash) -> bool {
        self.seen.insert(hash)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

pub struct ConfirmationWatcher<L> {
    client: L,
    bridge: Address,
    confirmations: u64,
    state: ConfirmationState,
    last_height: Option<u64>,
}

impl<L> ConfirmationWatcher<L>
where
    L: LedgerClient,
{
    pub fn new(client: L, bridge: Address, confirmations: u64) -> Self {
        Self {
            client,
            bridge,
            confirmations,
            state: ConfirmationState::default(),
            last_height: None,
        }
    }

    pub const fn client(&self) -> &L {
        &self.client
    }

    pub const fn confirmations(&self) -> u64 {
        self.confirmations
    }

    /// Source height observed by the most recent successful height query.
    pub const fn last_height(&self) -> Option<u64> {
        self.last_height
    }

    pub const fn state(&self) -> &ConfirmationState {
        &self.state
    }

    /// Poll once for newly confirmed deposits.
    ///
    /// Returned events are ordered by block number, then log index, then
    /// arrival. Any failure is logged and yields no events for this cycle.
    pub async fn poll(&mut self) -> Vec<DepositEvent> {
        match self.try_poll().await {
            Ok(events) => events,
            Err(e) if e.is_connectivity() => {
                warn!(chain = self.client.name(), error = %e, "Source chain unavailable, skipping poll");
                vec![]
            }
            Err(e) => {
                warn!(chain = self.client.name(), error = %e, "Error while polling for deposits");
                vec![]
            }
        }
    }

    async fn try_poll(&mut self) -> Result<Vec<DepositEvent>, ClientError> {
        let height = self.client.latest_block_height().await?;
        self.last_height = Some(height);

        let filter = Filter::new()
            .address(self.bridge)
            .event_signature(TokensDeposited::SIGNATURE_HASH)
            .to_block(height);
        let logs = self.client.fetch_logs_since(&filter).await?;

        let mut confirmed = Vec::new();
        for log in &logs {
            if log.removed {
                debug!(tx_hash = ?log.transaction_hash, "Ignoring removed log");
                continue;
            }

            let event = match DepositEvent::try_from(log) {
                Ok(event) => event,
                Err(e) => {
                    warn!(
                        tx_hash = ?log.transaction_hash,
                        block = ?log.block_number,
                        error = %e,
                        "Skipping undecodable deposit log"
                    );
                    continue;
                }
            };

            if self.state.contains(&event.source_tx_hash) {
                continue;
            }

            // a lagging node can report a tip below the log's block
            let depth = height.checked_sub(event.block_number);
            if depth.is_some_and(|depth| depth >= self.confirmations) {
                confirmed.push(event);
            } else {
                debug!(
                    tx_hash = %event.source_tx_hash,
                    block = event.block_number,
                    confirmations = depth.unwrap_or_default(),
                    required = self.confirmations,
                    "Deposit pending confirmation"
                );
            }
        }

        // stable, so equal (block, log index) keep arrival order
        confirmed.sort_by_key(|event| (event.block_number, event.log_index));

        let state = &mut self.state;
        confirmed.retain(|event| state.insert(event.source_tx_hash));

        for event in &confirmed {
            info!(
                tx_hash = %event.source_tx_hash,
                block = event.block_number,
                cross_chain_tx_id = %event.cross_chain_tx_id,
                "Confirmed deposit"
            );
        }

        Ok(confirmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{deposit_log, MockLedger, BRIDGE};
    use alloy_primitives::B256;

    fn hash(byte: u8) -> TxHash {
        TxHash::repeat_byte(byte)
    }

    fn id(byte: u8) -> B256 {
        B256::repeat_byte(byte)
    }

    #[tokio::test]
    async fn test_event_surfaces_at_confirmation_depth() {
        let log = deposit_log(100, 0, hash(1), id(0xab));
        let ledger = MockLedger::new([105, 108, 112, 113], vec![log]);
        let mut watcher = ConfirmationWatcher::new(ledger, BRIDGE, 12);

        assert!(watcher.poll().await.is_empty()); // 5 confirmations
        assert!(watcher.poll().await.is_empty()); // 8 confirmations

        let events = watcher.poll().await; // 12 confirmations
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].source_tx_hash, hash(1));
        assert_eq!(events[0].cross_chain_tx_id, id(0xab));

        // redelivered by the node, but already surfaced
        assert!(watcher.poll().await.is_empty());
        assert_eq!(watcher.state().len(), 1);
        assert_eq!(watcher.last_height(), Some(113));
    }

    #[tokio::test]
    async fn test_filter_carries_observed_height() {
        let ledger = MockLedger::new([105, 108], vec![]);
        let mut watcher = ConfirmationWatcher::new(ledger, BRIDGE, 12);

        watcher.poll().await;
        watcher.poll().await;

        assert_eq!(
            *watcher.client().fetches.lock().unwrap(),
            vec![Some(105), Some(108)]
        );
    }

    #[tokio::test]
    async fn test_zero_confirmations_surfaces_tip_block() {
        let log = deposit_log(50, 0, hash(1), id(1));
        let ledger = MockLedger::new([50], vec![log]);
        let mut watcher = ConfirmationWatcher::new(ledger, BRIDGE, 0);

        assert_eq!(watcher.poll().await.len(), 1);
    }

    #[tokio::test]
    async fn test_block_above_reported_tip_is_not_confirmed() {
        let log = deposit_log(120, 0, hash(1), id(1));
        let ledger = MockLedger::new([110], vec![log]);
        let mut watcher = ConfirmationWatcher::new(ledger, BRIDGE, 0);

        assert!(watcher.poll().await.is_empty());
        assert!(watcher.state().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_delivery_in_one_fetch() {
        let log = deposit_log(100, 0, hash(1), id(1));
        let ledger = MockLedger::new([200], vec![log.clone(), log]);
        let mut watcher = ConfirmationWatcher::new(ledger, BRIDGE, 12);

        assert_eq!(watcher.poll().await.len(), 1);
    }

    #[tokio::test]
    async fn test_second_log_in_same_transaction_is_deduplicated() {
        // dedup is keyed by transaction hash, so only the first log survives
        let logs = vec![
            deposit_log(100, 1, hash(1), id(2)),
            deposit_log(100, 0, hash(1), id(1)),
        ];
        let ledger = MockLedger::new([200], logs);
        let mut watcher = ConfirmationWatcher::new(ledger, BRIDGE, 12);

        let events = watcher.poll().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].cross_chain_tx_id, id(1));
    }

    #[tokio::test]
    async fn test_events_ordered_by_block_then_log_index() {
        let logs = vec![
            deposit_log(102, 0, hash(4), id(4)),
            deposit_log(100, 2, hash(2), id(2)),
            deposit_log(101, 0, hash(3), id(3)),
            deposit_log(100, 1, hash(1), id(1)),
        ];
        let ledger = MockLedger::new([200], logs);
        let mut watcher = ConfirmationWatcher::new(ledger, BRIDGE, 12);

        let order: Vec<TxHash> = watcher
            .poll()
            .await
            .into_iter()
            .map(|event| event.source_tx_hash)
            .collect();

        assert_eq!(order, vec![hash(1), hash(2), hash(3), hash(4)]);
    }

    #[tokio::test]
    async fn test_only_confirmed_subset_returned() {
        let logs = vec![
            deposit_log(100, 0, hash(1), id(1)),
            deposit_log(105, 0, hash(2), id(2)),
        ];
        let ledger = MockLedger::new([112, 117], logs);
        let mut watcher = ConfirmationWatcher::new(ledger, BRIDGE, 12);

        let first = watcher.poll().await;
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].source_tx_hash, hash(1));

        let second = watcher.poll().await;
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].source_tx_hash, hash(2));
    }

    #[tokio::test]
    async fn test_unreachable_source_yields_nothing() {
        let ledger = MockLedger::default();
        let mut watcher = ConfirmationWatcher::new(ledger, BRIDGE, 12);

        assert!(watcher.poll().await.is_empty());
        assert_eq!(watcher.last_height(), None);
        assert!(watcher.client().fetches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_does_not_lose_events() {
        let log = deposit_log(100, 0, hash(1), id(1));
        let ledger = MockLedger::new([200, 201], vec![log]);
        *ledger.fail_fetch.lock().unwrap() = true;
        let mut watcher = ConfirmationWatcher::new(ledger, BRIDGE, 12);

        assert!(watcher.poll().await.is_empty());
        assert_eq!(watcher.last_height(), Some(200));

        *watcher.client().fail_fetch.lock().unwrap() = false;
        assert_eq!(watcher.poll().await.len(), 1);
    }

    #[tokio::test]
    async fn test_removed_and_undecodable_logs_skipped() {
        let mut removed = deposit_log(100, 0, hash(1), id(1));
        removed.removed = true;
        let mut foreign = deposit_log(100, 1, hash(2), id(2));
        foreign.inner.data = Default::default();
        let good = deposit_log(100, 2, hash(3), id(3));

        let ledger = MockLedger::new([200], vec![removed, foreign, good]);
        let mut watcher = ConfirmationWatcher::new(ledger, BRIDGE, 12);

        let events = watcher.poll().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].source_tx_hash, hash(3));
    }
}
