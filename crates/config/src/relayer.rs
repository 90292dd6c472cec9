//! Relayer configuration.
//!
//! Built from command line / environment arguments ([`crate::RelayerArgs`])
//! or from a TOML file.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::{fmt, path::Path, time::Duration};
use thiserror::Error;

pub const SOURCE_CHAIN_RPC_URL: &str = "SOURCE_CHAIN_RPC_URL";
pub const DESTINATION_CHAIN_RPC_URL: &str = "DESTINATION_CHAIN_RPC_URL";
pub const SOURCE_BRIDGE_CONTRACT_ADDRESS: &str = "SOURCE_BRIDGE_CONTRACT_ADDRESS";
pub const DESTINATION_BRIDGE_CONTRACT_ADDRESS: &str = "DESTINATION_BRIDGE_CONTRACT_ADDRESS";
pub const RELAYER_PRIVATE_KEY: &str = "RELAYER_PRIVATE_KEY";
pub const HEALTHCHECK_URL: &str = "HEALTHCHECK_URL";
pub const POLL_INTERVAL_SECONDS: &str = "POLL_INTERVAL_SECONDS";
pub const BLOCK_CONFIRMATIONS: &str = "BLOCK_CONFIRMATIONS";
pub const RPC_TIMEOUT_SECONDS: &str = "RPC_TIMEOUT_SECONDS";
pub const START_BLOCK: &str = "START_BLOCK";
pub const METRICS_PORT: &str = "METRICS_PORT";

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 15;
pub const DEFAULT_BLOCK_CONFIRMATIONS: u64 = 12;
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 30;

const fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

const fn default_block_confirmations() -> u64 {
    DEFAULT_BLOCK_CONFIRMATIONS
}

const fn default_rpc_timeout_secs() -> u64 {
    DEFAULT_RPC_TIMEOUT_SECS
}

#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required key is absent or empty
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    /// A key is present but unusable
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Private key of the relayer account. Never printed.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelayerKey(String);

impl RelayerKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Hex encoded key, with or without `0x`.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RelayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RelayerKey(<redacted>)")
    }
}

/// One side of the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// RPC endpoint url
    pub rpc_url: String,
    /// Bridge contract address on this chain
    pub bridge_address: Address,
}

/// Top-level relayer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayerConfig {
    /// Chain where deposits are observed
    pub source: ChainConfig,

    /// Chain where releases are submitted
    pub destination: ChainConfig,

    /// Key of the account that signs release transactions
    pub relayer_private_key: RelayerKey,

    /// Liveness monitoring endpoint
    pub healthcheck_url: String,

    /// Seconds between orchestrator cycles
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Blocks that must follow a deposit before it is relayed
    #[serde(default = "default_block_confirmations")]
    pub block_confirmations: u64,

    /// Per-call RPC timeout in seconds
    #[serde(default = "default_rpc_timeout_secs")]
    pub rpc_timeout_secs: u64,

    /// First source block to scan. Defaults to the chain tip at startup.
    #[serde(default)]
    pub start_block: Option<u64>,

    /// Port for the Prometheus exporter. Disabled when unset.
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

impl RelayerConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;

        Ok(config)
    }

    /// Validate values that parse but cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.rpc_url.trim().is_empty() {
            return Err(ConfigError::Missing(SOURCE_CHAIN_RPC_URL));
        }

        if self.destination.rpc_url.trim().is_empty() {
            return Err(ConfigError::Missing(DESTINATION_CHAIN_RPC_URL));
        }

        if self.source.bridge_address == Address::ZERO {
            return Err(invalid(SOURCE_BRIDGE_CONTRACT_ADDRESS, "must not be zero"));
        }

        if self.destination.bridge_address == Address::ZERO {
            return Err(invalid(DESTINATION_BRIDGE_CONTRACT_ADDRESS, "must not be zero"));
        }

        if self.relayer_private_key.expose().trim().is_empty() {
            return Err(ConfigError::Missing(RELAYER_PRIVATE_KEY));
        }

        if self.healthcheck_url.trim().is_empty() {
            return Err(ConfigError::Missing(HEALTHCHECK_URL));
        }

        if self.poll_interval_secs == 0 {
            return Err(invalid(POLL_INTERVAL_SECONDS, "must be at least 1"));
        }

        if self.rpc_timeout_secs == 0 {
            return Err(invalid(RPC_TIMEOUT_SECONDS, "must be at least 1"));
        }

        Ok(())
    }

    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub const fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }
}

pub(crate) fn invalid(key: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        reason: reason.into(),
    }
}
