//! Bridge contract bindings.
//!
//! Includes both sides of the lock/release bridge:
//! - ISourceBridge (deposit side, event only)
//! - IDestinationBridge (release side)

use alloy_sol_types::sol;

sol! {
    /// Source bridge - locks tokens and announces the cross-chain transfer
    interface ISourceBridge {
        /// Emitted when tokens are locked for a transfer to another chain.
        ///
        /// `transactionId` is the cross-chain idempotency key; it is stable
        /// across resubmissions of the same transfer intent.
        event TokensDeposited(
            address indexed sender,
            address indexed recipient,
            uint256 amount,
            uint256 destinationChainId,
            bytes32 indexed transactionId
        );
    }

    /// Destination bridge - releases tokens for a deposit seen on the source chain
    interface IDestinationBridge {
        /// Release `amount` to `recipient` for the given source transfer id
        function releaseTokens(
            address recipient,
            uint256 amount,
            bytes32 sourceTransactionId
        ) external;
    }
}
