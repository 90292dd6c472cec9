//! Configuration types for the bridge relayer.
//!
//! This crate provides:
//! - Relayer configuration (both chains, relayer key, health endpoint)
//! - Loading from command line flags, environment variables or a TOML file
//! - Defaults and validation

pub mod args;
pub mod relayer;

pub use args::RelayerArgs;
pub use relayer::{ChainConfig, ConfigError, RelayerConfig, RelayerKey};
