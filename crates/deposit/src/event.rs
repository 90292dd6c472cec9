//! Deposit events decoded from source bridge logs.

use alloy_primitives::{Address, TxHash, B256, U256};
use alloy_rpc_types_eth::Log;
use alloy_sol_types::SolEvent;
use binding::bridge::ISourceBridge::TokensDeposited;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    /// Log has no block number or transaction hash yet
    #[error("log is pending (no block number or transaction hash)")]
    Pending,

    #[error("log does not decode as TokensDeposited: {0}")]
    Abi(#[from] alloy_sol_types::Error),

    #[error("destination chain id {0} does not fit in u64")]
    ChainIdOverflow(U256),
}

/// A confirmed-or-not deposit observed on the source chain.
///
/// Immutable once observed. `cross_chain_tx_id` is the idempotency key for
/// releases; `source_tx_hash` only identifies the source transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositEvent {
    /// Source chain transaction that emitted the log
    pub source_tx_hash: TxHash,
    /// Source chain block containing the log
    pub block_number: u64,
    /// Position of the log in its block
    pub log_index: u64,
    /// Depositor on the source chain
    pub sender: Address,
    /// Beneficiary on the destination chain
    pub recipient: Address,
    /// Amount locked
    pub amount: U256,
    /// Chain the deposit is bound for
    pub destination_chain_id: u64,
    /// Cross-chain transfer id (`transactionId` in the event)
    pub cross_chain_tx_id: B256,
}

impl TryFrom<&Log> for DepositEvent {
    type Error = DecodeError;

    fn try_from(log: &Log) -> Result<Self, Self::Error> {
        let (Some(block_number), Some(source_tx_hash)) = (log.block_number, log.transaction_hash)
        else {
            return Err(DecodeError::Pending);
        };

        let event = TokensDeposited::decode_log(&log.inner)?;
        let destination_chain_id = u64::try_from(event.destinationChainId)
            .map_err(|_| DecodeError::ChainIdOverflow(event.destinationChainId))?;

        Ok(Self {
            source_tx_hash,
            block_number,
            log_index: log.log_index.unwrap_or_default(),
            sender: event.sender,
            recipient: event.recipient,
            amount: event.amount,
            destination_chain_id,
            cross_chain_tx_id: event.transactionId,
        })
    }
}
