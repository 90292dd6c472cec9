//! `releaseTokens` transactions built from confirmed deposits.

use alloy_network::TransactionBuilder;
use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_rpc_types_eth::TransactionRequest;
use alloy_sol_types::SolCall;
use binding::bridge::IDestinationBridge;
use deposit::DepositEvent;

/// A `releaseTokens` call on the destination bridge.
///
/// Built fresh for every relay attempt and dropped after broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseTransaction {
    /// Destination bridge contract
    pub bridge: Address,
    /// Relayer account sending the transaction
    pub from: Address,
    /// Beneficiary of the release
    pub recipient: Address,
    /// Amount to release
    pub amount: U256,
    /// Cross-chain transfer id being settled
    pub cross_chain_tx_id: B256,
    pub nonce: u64,
    /// Legacy gas price in wei
    pub gas_price: u128,
    /// Unset until gas has been estimated
    pub gas_limit: Option<u64>,
    pub chain_id: u64,
}

impl ReleaseTransaction {
    /// Release for `event`, without a gas limit.
    pub const fn for_deposit(
        event: &DepositEvent,
        bridge: Address,
        from: Address,
        nonce: u64,
        gas_price: u128,
        chain_id: u64,
    ) -> Self {
        Self {
            bridge,
            from,
            recipient: event.recipient,
            amount: event.amount,
            cross_chain_tx_id: event.cross_chain_tx_id,
            nonce,
            gas_price,
            gas_limit: None,
            chain_id,
        }
    }

    /// ABI encoded `releaseTokens(recipient, amount, sourceTransactionId)`.
    pub fn calldata(&self) -> Bytes {
        IDestinationBridge::releaseTokensCall {
            recipient: self.recipient,
            amount: self.amount,
            sourceTransactionId: self.cross_chain_tx_id,
        }
        .abi_encode()
        .into()
    }

    pub fn to_request(&self) -> TransactionRequest {
        let mut tx = TransactionRequest::default()
            .with_from(self.from)
            .with_to(self.bridge)
            .with_input(self.calldata())
            .with_nonce(self.nonce)
            .with_gas_price(self.gas_price)
            .with_chain_id(self.chain_id);
        tx.gas = self.gas_limit;
        tx
    }

    /// Amount in the token's base units; the bridge does not know its decimals.
    pub fn description(&self) -> String {
        format!(
            "Release {} tokens to {} for {}",
            self.amount,
            self.recipient,
            self.cross_chain_tx_id
        )
    }
}
