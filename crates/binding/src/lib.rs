//! Contract bindings for the bridge contracts.
//!
//! This crate consolidates the Solidity interfaces the relayer touches:
//! - Source bridge (emits `TokensDeposited` when tokens are locked)
//! - Destination bridge (`releaseTokens`, called by the relayer)
//!
//! All bindings are generated using alloy's `sol!` macro.

pub mod bridge;
