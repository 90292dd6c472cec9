use alloy_primitives::{address, Address, TxHash, B256, U256};
use alloy_rpc_types_eth::{Filter, Log, TransactionRequest};
use alloy_sol_types::SolEvent;
use binding::bridge::ISourceBridge::TokensDeposited;
use client::{ClientError, LedgerClient};
use std::{collections::VecDeque, sync::Mutex};

pub const BRIDGE: Address = address!("1111111111111111111111111111111111111111");

/// Build a `TokensDeposited` log as a node would return it.
pub fn deposit_log(block: u64, log_index: u64, tx_hash: TxHash, id: B256) -> Log {
    let event = TokensDeposited {
        sender: Address::repeat_byte(1),
        recipient: Address::repeat_byte(2),
        amount: U256::from(1_000_000),
        destinationChainId: U256::from(10),
        transactionId: id,
    };

    Log {
        inner: alloy_primitives::Log {
            address: BRIDGE,
            data: event.encode_log_data(),
        },
        block_hash: None,
        block_number: Some(block),
        block_timestamp: None,
        transaction_hash: Some(tx_hash),
        transaction_index: Some(0),
        log_index: Some(log_index),
        removed: false,
    }
}

fn rpc_error(call: &'static str) -> ClientError {
    ClientError::Rpc {
        chain: "source".into(),
        call,
        reason: "mock failure".into(),
    }
}

/// Source chain mock. Each poll pops the next scripted height; the log set
/// is returned on every fetch, like a node redelivering the unconfirmed window.
#[derive(Default)]
pub struct MockLedger {
    pub heights: Mutex<VecDeque<Option<u64>>>,
    pub logs: Mutex<Vec<Log>>,
    pub fail_fetch: Mutex<bool>,
    pub fetches: Mutex<Vec<Option<u64>>>,
}

impl MockLedger {
    pub fn new(heights: impl IntoIterator<Item = u64>, logs: Vec<Log>) -> Self {
        Self {
            heights: Mutex::new(heights.into_iter().map(Some).collect()),
            logs: Mutex::new(logs),
            ..Default::default()
        }
    }
}

impl LedgerClient for MockLedger {
    fn name(&self) -> &str {
        "source"
    }

    async fn is_reachable(&self) -> bool {
        true
    }

    async fn chain_id(&self) -> Result<u64, ClientError> {
        Ok(1)
    }

    async fn latest_block_height(&self) -> Result<u64, ClientError> {
        match self.heights.lock().unwrap().pop_front() {
            Some(Some(height)) => Ok(height),
            _ => Err(ClientError::Unreachable {
                chain: "source".into(),
                reason: "mock offline".into(),
            }),
        }
    }

    async fn fetch_logs_since(&self, filter: &Filter) -> Result<Vec<Log>, ClientError> {
        self.fetches.lock().unwrap().push(filter.get_to_block());
        if *self.fail_fetch.lock().unwrap() {
            return Err(rpc_error("eth_getLogs"));
        }
        Ok(self.logs.lock().unwrap().clone())
    }

    async fn account_nonce(&self, _address: Address) -> Result<u64, ClientError> {
        unimplemented!("source chain is read only")
    }

    async fn gas_price(&self) -> Result<u128, ClientError> {
        unimplemented!("source chain is read only")
    }

    async fn estimate_gas(&self, _tx: &TransactionRequest) -> Result<u64, ClientError> {
        unimplemented!("source chain is read only")
    }

    async fn sign_and_broadcast(
        &self,
        _tx: TransactionRequest,
        _wallet: &alloy_network::EthereumWallet,
    ) -> Result<TxHash, ClientError> {
        unimplemented!("source chain is read only")
    }

    async fn transaction_receipt(&self, _hash: TxHash) -> Result<Option<bool>, ClientError> {
        unimplemented!("source chain is read only")
    }
}
