//! Deposit watching for the bridge relayer.
//!
//! This crate decodes `TokensDeposited` logs from the source bridge and
//! releases them to the relay only once they are buried under enough blocks
//! that a reorganisation is unlikely to revert them.

pub mod event;
pub mod watcher;

#[cfg(test)]
pub(crate) mod test_utils;

pub use event::{DecodeError, DepositEvent};
pub use watcher::{ConfirmationState, ConfirmationWatcher};
