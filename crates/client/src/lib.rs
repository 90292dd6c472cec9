//! Ledger client capability.
//!
//! A [`LedgerClient`] is everything the relayer needs from a single chain:
//! height queries, log retrieval, nonce / gas queries and raw transaction
//! broadcast. Two instances run side by side, one per chain, and are used
//! asymmetrically (the source is only read, the destination is written to).

mod rpc;

use alloy_network::EthereumWallet;
use alloy_primitives::{Address, TxHash};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types_eth::{Filter, Log, TransactionRequest};
pub use rpc::RpcLedgerClient;
use std::future::Future;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Error parsing or validating URLs
    #[error("Invalid RPC URL: {0}")]
    InvalidUrl(String),

    /// The node did not answer at all
    #[error("{chain} is unreachable: {reason}")]
    Unreachable { chain: String, reason: String },

    /// A call did not complete within the per-call timeout
    #[error("{chain}: {call} timed out after {secs}s")]
    Timeout {
        chain: String,
        call: &'static str,
        secs: u64,
    },

    /// The node answered with an error
    #[error("{chain}: {call} failed: {reason}")]
    Rpc {
        chain: String,
        call: &'static str,
        reason: String,
    },

    /// Gas estimation was rejected (usually means the call would revert)
    #[error("{chain}: gas estimation failed: {reason}")]
    Estimation { chain: String, reason: String },

    /// Building or signing the transaction envelope failed
    #[error("Signing error: {0}")]
    Signing(String),

    /// The node rejected the signed transaction
    #[error("{chain}: broadcast rejected: {reason}")]
    Broadcast { chain: String, reason: String },

    /// A signed transaction was sent but the node did not answer in time.
    /// It may still be in the pool under `tx_hash`.
    #[error("{chain}: eth_sendRawTransaction of {tx_hash} timed out after {secs}s")]
    BroadcastTimeout {
        chain: String,
        tx_hash: TxHash,
        secs: u64,
    },
}

impl ClientError {
    /// True for errors caused by the node being unavailable rather than
    /// rejecting what was asked of it.
    pub const fn is_connectivity(&self) -> bool {
        matches!(
            self,
            Self::Unreachable { .. } | Self::Timeout { .. } | Self::BroadcastTimeout { .. }
        )
    }
}

/// Capability over a single chain's RPC surface.
pub trait LedgerClient: Send + Sync {
    /// Human readable chain name used in logs.
    fn name(&self) -> &str;

    /// Returns true if the node answers.
    fn is_reachable(&self) -> impl Future<Output = bool> + Send;

    /// Chain id reported by the node.
    fn chain_id(&self) -> impl Future<Output = Result<u64, ClientError>> + Send;

    /// Latest block height.
    fn latest_block_height(&self) -> impl Future<Output = Result<u64, ClientError>> + Send;

    /// Fetch log entries matching `filter` since the previous fetch.
    ///
    /// The client owns the "since" cursor. Entries that were not yet
    /// confirmed at the filter's `to_block` must be delivered again on the
    /// next call; callers deduplicate.
    fn fetch_logs_since(
        &self,
        filter: &Filter,
    ) -> impl Future<Output = Result<Vec<Log>, ClientError>> + Send;

    /// Pending-inclusive transaction count of `address`.
    fn account_nonce(
        &self,
        address: Address,
    ) -> impl Future<Output = Result<u64, ClientError>> + Send;

    /// Current legacy gas price in wei.
    fn gas_price(&self) -> impl Future<Output = Result<u128, ClientError>> + Send;

    /// Estimate gas for `tx`.
    fn estimate_gas(
        &self,
        tx: &TransactionRequest,
    ) -> impl Future<Output = Result<u64, ClientError>> + Send;

    /// Sign `tx` with `wallet` and broadcast it.
    ///
    /// Success means the node accepted the transaction into its pool, not
    /// that it executed. When the send times out the error is
    /// [`ClientError::BroadcastTimeout`] carrying the signed hash.
    fn sign_and_broadcast(
        &self,
        tx: TransactionRequest,
        wallet: &EthereumWallet,
    ) -> impl Future<Output = Result<TxHash, ClientError>> + Send;

    /// Execution status of a mined transaction, `None` while it is pending.
    fn transaction_receipt(
        &self,
        hash: TxHash,
    ) -> impl Future<Output = Result<Option<bool>, ClientError>> + Send;
}

/// Convenience function to create an ethereum rpc provider from url.
pub fn create_provider(rpc_url: &str) -> Result<impl Provider + Clone, ClientError> {
    let url = rpc_url
        .parse()
        .map_err(|e| ClientError::InvalidUrl(format!("{}", e)))?;
    let provider = ProviderBuilder::new().connect_http(url);

    Ok(provider)
}

/// Connect a named [`RpcLedgerClient`] to `rpc_url`.
///
/// No request is made here; use [`LedgerClient::is_reachable`] to probe.
pub fn connect(
    rpc_url: &str,
    name: &str,
) -> Result<RpcLedgerClient<impl Provider + Clone>, ClientError> {
    let provider = create_provider(rpc_url)?;

    Ok(RpcLedgerClient::new(provider, name))
}
