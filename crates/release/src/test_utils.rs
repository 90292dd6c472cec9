use alloy_network::EthereumWallet;
use alloy_primitives::{address, Address, TxHash, B256, U256};
use alloy_rpc_types_eth::{Filter, Log, TransactionRequest};
use alloy_signer_local::PrivateKeySigner;
use client::{ClientError, LedgerClient};
use deposit::DepositEvent;
use std::{collections::HashMap, sync::Mutex};

pub const BRIDGE: Address = address!("2222222222222222222222222222222222222222");

// well-known test key, never funded
const TEST_KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

pub fn signer() -> PrivateKeySigner {
    TEST_KEY.parse().unwrap()
}

pub fn deposit(source_tx: u8, id: u8) -> DepositEvent {
    DepositEvent {
        source_tx_hash: TxHash::repeat_byte(source_tx),
        block_number: 100,
        log_index: 0,
        sender: Address::repeat_byte(1),
        recipient: Address::repeat_byte(2),
        amount: U256::from(1_000_000),
        destination_chain_id: 10,
        cross_chain_tx_id: B256::repeat_byte(id),
    }
}

fn failure(call: &'static str) -> ClientError {
    ClientError::Rpc {
        chain: "destination".into(),
        call,
        reason: "mock failure".into(),
    }
}

/// Destination chain mock recording every broadcast.
pub struct MockDestination {
    pub nonce: Mutex<u64>,
    pub fail_nonce: Mutex<bool>,
    pub fail_estimate: Mutex<bool>,
    pub fail_broadcast: Mutex<bool>,
    /// Pool the transaction but answer with a timeout
    pub timeout_broadcast: Mutex<bool>,
    pub estimates: Mutex<usize>,
    pub broadcasts: Mutex<Vec<TransactionRequest>>,
    pub receipts: Mutex<HashMap<TxHash, bool>>,
    pub fail_receipts: Mutex<bool>,
}

impl Default for MockDestination {
    fn default() -> Self {
        Self {
            nonce: Mutex::new(0),
            fail_nonce: Mutex::new(false),
            fail_estimate: Mutex::new(false),
            fail_broadcast: Mutex::new(false),
            timeout_broadcast: Mutex::new(false),
            estimates: Mutex::new(0),
            broadcasts: Mutex::new(vec![]),
            receipts: Mutex::new(HashMap::new()),
            fail_receipts: Mutex::new(false),
        }
    }
}

impl MockDestination {
    pub fn broadcast_count(&self) -> usize {
        self.broadcasts.lock().unwrap().len()
    }
}

impl LedgerClient for MockDestination {
    fn name(&self) -> &str {
        "destination"
    }

    async fn is_reachable(&self) -> bool {
        true
    }

    async fn chain_id(&self) -> Result<u64, ClientError> {
        Ok(10)
    }

    async fn latest_block_height(&self) -> Result<u64, ClientError> {
        Ok(1_000)
    }

    async fn fetch_logs_since(&self, _filter: &Filter) -> Result<Vec<Log>, ClientError> {
        Ok(vec![])
    }

    async fn account_nonce(&self, _address: Address) -> Result<u64, ClientError> {
        if *self.fail_nonce.lock().unwrap() {
            return Err(failure("eth_getTransactionCount"));
        }
        Ok(*self.nonce.lock().unwrap())
    }

    async fn gas_price(&self) -> Result<u128, ClientError> {
        Ok(2_000_000_000)
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64, ClientError> {
        *self.estimates.lock().unwrap() += 1;
        if *self.fail_estimate.lock().unwrap() {
            return Err(ClientError::Estimation {
                chain: "destination".into(),
                reason: "execution reverted".into(),
            });
        }
        assert!(tx.gas.is_none(), "estimate must run before the gas limit is set");
        Ok(55_000)
    }

    async fn sign_and_broadcast(
        &self,
        tx: TransactionRequest,
        _wallet: &EthereumWallet,
    ) -> Result<TxHash, ClientError> {
        if *self.fail_broadcast.lock().unwrap() {
            return Err(ClientError::Broadcast {
                chain: "destination".into(),
                reason: "nonce too low".into(),
            });
        }
        let mut broadcasts = self.broadcasts.lock().unwrap();
        broadcasts.push(tx);
        *self.nonce.lock().unwrap() += 1;

        let tx_hash = TxHash::with_last_byte(broadcasts.len() as u8);
        if *self.timeout_broadcast.lock().unwrap() {
            return Err(ClientError::BroadcastTimeout {
                chain: "destination".into(),
                tx_hash,
                secs: 30,
            });
        }
        Ok(tx_hash)
    }

    async fn transaction_receipt(&self, hash: TxHash) -> Result<Option<bool>, ClientError> {
        if *self.fail_receipts.lock().unwrap() {
            return Err(failure("eth_getTransactionReceipt"));
        }
        Ok(self.receipts.lock().unwrap().get(&hash).copied())
    }
}
