//! JSON-RPC ledger client backed by an alloy [`Provider`].

use crate::{ClientError, LedgerClient};
use alloy_consensus::TxEnvelope;
use alloy_network::{eip2718::Encodable2718, EthereumWallet, TransactionBuilder};
use alloy_primitives::{Address, TxHash};
use alloy_provider::Provider;
use alloy_rpc_types_eth::{Filter, Log, TransactionRequest};
use std::{
    fmt::Display,
    future::IntoFuture,
    sync::{Mutex, PoisonError},
    time::Duration,
};
use tokio_retry::{strategy::ExponentialBackoff, Retry};
use tracing::{debug, warn};

/// Default per-call timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// 500 block safety margin under the common 10k eth_getLogs range limit
const CHUNK_SIZE: u64 = 9_500;

/// Ledger client talking to a node over JSON-RPC.
///
/// Every call is bounded by a timeout so a hung node cannot stall the relay
/// loop. Log retrieval keeps its own cursor and redelivers the trailing
/// `redelivery_window` blocks on each fetch, so logs that were still waiting
/// for confirmations are seen again.
pub struct RpcLedgerClient<P> {
    provider: P,
    name: String,
    timeout: Duration,
    redelivery_window: u64,
    cursor: Mutex<Option<u64>>,
}

impl<P> RpcLedgerClient<P>
where
    P: Provider + Clone,
{
    pub fn new(provider: P, name: impl Into<String>) -> Self {
        Self {
            provider,
            name: name.into(),
            timeout: DEFAULT_TIMEOUT,
            redelivery_window: 0,
            cursor: Mutex::new(None),
        }
    }

    /// Override the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Number of trailing blocks re-scanned on every log fetch.
    ///
    /// Must be at least the confirmation depth used by the consumer.
    pub fn with_redelivery_window(mut self, blocks: u64) -> Self {
        self.redelivery_window = blocks;
        self
    }

    /// First block of the first log fetch. Defaults to the chain tip.
    pub fn with_start_block(self, block: Option<u64>) -> Self {
        Self {
            cursor: Mutex::new(block),
            ..self
        }
    }

    /// First block of the next log fetch, `None` until the first fetch.
    pub(crate) fn cursor(&self) -> Option<u64> {
        *self.cursor.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `fut` under the per-call timeout.
    async fn timed<F, T, E>(&self, call: &'static str, fut: F) -> Result<Result<T, E>, ClientError>
    where
        F: IntoFuture<Output = Result<T, E>>,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| ClientError::Timeout {
                chain: self.name.clone(),
                call,
                secs: self.timeout.as_secs(),
            })
    }

    /// Run `fut` under the timeout and map node errors to [`ClientError::Rpc`].
    async fn rpc<F, T, E>(&self, call: &'static str, fut: F) -> Result<T, ClientError>
    where
        F: IntoFuture<Output = Result<T, E>>,
        E: Display,
    {
        self.timed(call, fut).await?.map_err(|e| ClientError::Rpc {
            chain: self.name.clone(),
            call,
            reason: e.to_string(),
        })
    }

    /// Scan `[from_block, to_block]` in chunks.
    async fn scan_logs(
        &self,
        filter: &Filter,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<Log>, ClientError> {
        let mut all_logs = Vec::new();
        let mut current = from_block;

        while current <= to_block {
            let chunk_end = current.saturating_add(CHUNK_SIZE - 1).min(to_block);

            let chunk_logs = self
                .scan_chunk_with_retry(filter, current, chunk_end)
                .await?;

            all_logs.extend(chunk_logs);
            current = chunk_end + 1;
        }

        Ok(all_logs)
    }

    /// Scan a single chunk with retry and exponential backoff.
    async fn scan_chunk_with_retry(
        &self,
        filter: &Filter,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<Log>, ClientError> {
        Retry::spawn(retry_strategy(), || async {
            let chunk = filter.clone().from_block(from_block).to_block(to_block);
            self.rpc("eth_getLogs", self.provider.get_logs(&chunk))
                .await
                .map_err(|e| {
                    warn!(
                        chain = %self.name,
                        from = from_block,
                        to = to_block,
                        error = %e,
                        "Log chunk scan failed, will retry"
                    );
                    e
                })
        })
        .await
    }
}

/// Delays between log chunk attempts: 100ms, 200ms, 400ms, 800ms, 1.6s.
///
/// `ExponentialBackoff` raises `from_millis` to the attempt number, so the
/// base stays at 2 and `factor` scales it to milliseconds.
fn retry_strategy() -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(2)
        .factor(50)
        .max_delay(Duration::from_secs(2))
        .take(5)
}

/// Cursor position after a fetch that covered `[from_block, to_block]`.
///
/// The trailing `window` blocks stay inside the next fetch.
pub(crate) fn next_cursor(from_block: u64, to_block: u64, window: u64) -> u64 {
    to_block
        .saturating_add(1)
        .saturating_sub(window)
        .max(from_block)
}

impl<P> LedgerClient for RpcLedgerClient<P>
where
    P: Provider + Clone,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn is_reachable(&self) -> bool {
        match self.chain_id().await {
            Ok(_) => true,
            Err(e) => {
                debug!(chain = %self.name, error = %e, "Reachability probe failed");
                false
            }
        }
    }

    async fn chain_id(&self) -> Result<u64, ClientError> {
        self.timed("eth_chainId", self.provider.get_chain_id())
            .await?
            .map_err(|e| ClientError::Unreachable {
                chain: self.name.clone(),
                reason: e.to_string(),
            })
    }

    async fn latest_block_height(&self) -> Result<u64, ClientError> {
        self.rpc("eth_blockNumber", self.provider.get_block_number())
            .await
    }

    async fn fetch_logs_since(&self, filter: &Filter) -> Result<Vec<Log>, ClientError> {
        let to_block = match filter.get_to_block() {
            Some(block) => block,
            None => self.latest_block_height().await?,
        };

        let from_block = *self
            .cursor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_insert(to_block);

        if from_block > to_block {
            // node behind our cursor (load balancer lag), nothing new yet
            return Ok(vec![]);
        }

        debug!(
            chain = %self.name,
            from = from_block,
            to = to_block,
            "Fetching logs"
        );

        let logs = self.scan_logs(filter, from_block, to_block).await?;

        *self.cursor.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(next_cursor(from_block, to_block, self.redelivery_window));

        Ok(logs)
    }

    async fn account_nonce(&self, address: Address) -> Result<u64, ClientError> {
        // pending, so back-to-back releases in one cycle get distinct nonces
        self.rpc(
            "eth_getTransactionCount",
            self.provider.get_transaction_count(address).pending(),
        )
        .await
    }

    async fn gas_price(&self) -> Result<u128, ClientError> {
        self.rpc("eth_gasPrice", self.provider.get_gas_price()).await
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64, ClientError> {
        self.timed("eth_estimateGas", self.provider.estimate_gas(tx.clone()))
            .await?
            .map_err(|e| ClientError::Estimation {
                chain: self.name.clone(),
                reason: e.to_string(),
            })
    }

    async fn sign_and_broadcast(
        &self,
        tx: TransactionRequest,
        wallet: &EthereumWallet,
    ) -> Result<TxHash, ClientError> {
        // Build and sign the typed transaction
        let envelope: TxEnvelope = tx
            .build(wallet)
            .await
            .map_err(|e| ClientError::Signing(e.to_string()))?;

        // Known before sending, so a lost answer still identifies the transaction
        let tx_hash = *envelope.tx_hash();

        // Encode to EIP-2718 bytes
        let mut encoded = Vec::new();
        envelope.encode_2718(&mut encoded);

        let pending = self
            .timed(
                "eth_sendRawTransaction",
                self.provider.send_raw_transaction(&encoded),
            )
            .await
            .map_err(|_| ClientError::BroadcastTimeout {
                chain: self.name.clone(),
                tx_hash,
                secs: self.timeout.as_secs(),
            })?
            .map_err(|e| ClientError::Broadcast {
                chain: self.name.clone(),
                reason: e.to_string(),
            })?;

        Ok(*pending.tx_hash())
    }

    async fn transaction_receipt(&self, hash: TxHash) -> Result<Option<bool>, ClientError> {
        let receipt = self
            .rpc(
                "eth_getTransactionReceipt",
                self.provider.get_transaction_receipt(hash),
            )
            .await?;

        Ok(receipt.map(|r| r.status()))
    }
}
