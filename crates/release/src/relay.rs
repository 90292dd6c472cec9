//! Exactly-once relay of confirmed deposits to the destination bridge.

use crate::{
    state::{RelayState, ReleaseStatus},
    transaction::ReleaseTransaction,
    RelayOutcome,
};
use alloy_network::EthereumWallet;
use alloy_primitives::{Address, TxHash};
use alloy_signer_local::PrivateKeySigner;
use client::{ClientError, LedgerClient};
use deposit::DepositEvent;
use tracing::{debug, error, info, warn};

/// Counts from one pass over releases awaiting a receipt.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptSummary {
    pub confirmed: usize,
    pub reverted: usize,
    pub pending: usize,
}

/// Relays confirmed deposits to the destination bridge, at most once per
/// cross-chain transfer id.
pub struct IdempotentRelay<L> {
    client: L,
    bridge: Address,
    chain_id: u64,
    relayer: Address,
    wallet: EthereumWallet,
    state: RelayState,
}

impl<L> IdempotentRelay<L>
where
    L: LedgerClient,
{
    /// Create a relay signing with `signer` for destination chain `chain_id`.
    pub fn new(client: L, bridge: Address, chain_id: u64, signer: PrivateKeySigner) -> Self {
        let relayer = signer.address();

        Self {
            client,
            bridge,
            chain_id,
            relayer,
            wallet: EthereumWallet::from(signer),
            state: RelayState::default(),
        }
    }

    /// Relayer account address.
    pub const fn relayer(&self) -> Address {
        self.relayer
    }

    pub const fn client(&self) -> &L {
        &self.client
    }

    pub const fn state(&self) -> &RelayState {
        &self.state
    }

    /// Relay a confirmed deposit.
    ///
    /// The transfer id is recorded once the destination node accepted the
    /// release, or once a signed release was sent without an answer. A
    /// `Failed` deposit can be relayed again later.
    pub async fn relay(&mut self, event: &DepositEvent) -> RelayOutcome {
        let id = event.cross_chain_tx_id;

        if let Some(release) = self.state.get(&id) {
            info!(
                cross_chain_tx_id = %id,
                source_tx_hash = %event.source_tx_hash,
                release_tx_hash = %release.tx_hash,
                "Deposit already relayed, skipping"
            );
            return RelayOutcome::Skipped;
        }

        match self.submit(event).await {
            Ok(tx_hash) => {
                self.state.record_submitted(id, tx_hash);
                RelayOutcome::Submitted(tx_hash)
            }
            Err(ClientError::BroadcastTimeout { tx_hash, secs, .. }) => {
                // the node may have pooled it; resending would spend a second nonce
                warn!(
                    cross_chain_tx_id = %id,
                    tx_hash = %tx_hash,
                    secs,
                    "Broadcast timed out, recording release as submitted"
                );
                self.state.record_submitted(id, tx_hash);
                RelayOutcome::Submitted(tx_hash)
            }
            Err(e) => {
                warn!(
                    cross_chain_tx_id = %id,
                    source_tx_hash = %event.source_tx_hash,
                    error = %e,
                    "Failed to relay deposit, will retry on a later cycle"
                );
                RelayOutcome::Failed(e)
            }
        }
    }

    /// Build, estimate, sign and broadcast the release for `event`.
    async fn submit(&self, event: &DepositEvent) -> Result<TxHash, ClientError> {
        let nonce = self.client.account_nonce(self.relayer).await?;
        let gas_price = self.client.gas_price().await?;

        let mut release = ReleaseTransaction::for_deposit(
            event,
            self.bridge,
            self.relayer,
            nonce,
            gas_price,
            self.chain_id,
        );

        // used as-is, no buffer on top of the estimate
        let gas_limit = self.client.estimate_gas(&release.to_request()).await?;
        release.gas_limit = Some(gas_limit);

        debug!(
            nonce,
            gas_price,
            gas_limit,
            "{}",
            release.description()
        );

        let tx_hash = self
            .client
            .sign_and_broadcast(release.to_request(), &self.wallet)
            .await?;

        info!(
            chain = self.client.name(),
            tx_hash = %tx_hash,
            cross_chain_tx_id = %release.cross_chain_tx_id,
            recipient = %release.recipient,
            amount = %release.amount,
            nonce,
            "Sent releaseTokens transaction"
        );

        Ok(tx_hash)
    }

    /// Check receipts of releases that have not resolved yet.
    ///
    /// Reverted releases are reported and left recorded; they are never
    /// resubmitted automatically.
    pub async fn check_receipts(&mut self) -> ReceiptSummary {
        let mut summary = ReceiptSummary::default();

        for (id, tx_hash) in self.state.awaiting_receipt() {
            match self.client.transaction_receipt(tx_hash).await {
                Ok(Some(true)) => {
                    info!(cross_chain_tx_id = %id, tx_hash = %tx_hash, "Release confirmed");
                    self.state.set_status(&id, ReleaseStatus::Confirmed);
                    summary.confirmed += 1;
                }
                Ok(Some(false)) => {
                    error!(
                        cross_chain_tx_id = %id,
                        tx_hash = %tx_hash,
                        "Release reverted on destination chain, manual action required"
                    );
                    self.state.set_status(&id, ReleaseStatus::Reverted);
                    summary.reverted += 1;
                }
                Ok(None) => summary.pending += 1,
                Err(e) => {
                    debug!(tx_hash = %tx_hash, error = %e, "Receipt query failed");
                    summary.pending += 1;
                }
            }
        }

        summary
    }
}
