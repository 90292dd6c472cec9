//! Command line and environment configuration.
//!
//! Every key can be given as a flag or through its environment variable.
//! Required keys may be omitted only when a `--config` file is passed, so
//! binaries flattening [`RelayerArgs`] must define a `config` argument.

use crate::relayer::{
    ChainConfig, ConfigError, RelayerConfig, RelayerKey, BLOCK_CONFIRMATIONS,
    DEFAULT_BLOCK_CONFIRMATIONS, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_RPC_TIMEOUT_SECS,
    DESTINATION_BRIDGE_CONTRACT_ADDRESS, DESTINATION_CHAIN_RPC_URL, HEALTHCHECK_URL,
    METRICS_PORT, POLL_INTERVAL_SECONDS, RELAYER_PRIVATE_KEY, RPC_TIMEOUT_SECONDS,
    SOURCE_BRIDGE_CONTRACT_ADDRESS, SOURCE_CHAIN_RPC_URL, START_BLOCK,
};
use alloy_primitives::Address;
use clap::Args;

#[derive(Debug, Clone, Args)]
pub struct RelayerArgs {
    /// Source chain RPC endpoint
    #[arg(long, env = SOURCE_CHAIN_RPC_URL, required_unless_present = "config")]
    pub source_rpc_url: Option<String>,

    /// Source bridge contract emitting deposits
    #[arg(long, env = SOURCE_BRIDGE_CONTRACT_ADDRESS, required_unless_present = "config")]
    pub source_bridge: Option<Address>,

    /// Destination chain RPC endpoint
    #[arg(long, env = DESTINATION_CHAIN_RPC_URL, required_unless_present = "config")]
    pub destination_rpc_url: Option<String>,

    /// Destination bridge contract receiving releases
    #[arg(long, env = DESTINATION_BRIDGE_CONTRACT_ADDRESS, required_unless_present = "config")]
    pub destination_bridge: Option<Address>,

    /// Relayer signing key, hex with or without 0x
    #[arg(
        long,
        env = RELAYER_PRIVATE_KEY,
        hide_env_values = true,
        required_unless_present = "config"
    )]
    pub relayer_private_key: Option<String>,

    /// Liveness monitoring endpoint
    #[arg(long, env = HEALTHCHECK_URL, required_unless_present = "config")]
    pub healthcheck_url: Option<String>,

    /// Seconds between relay cycles
    #[arg(long, env = POLL_INTERVAL_SECONDS, default_value_t = DEFAULT_POLL_INTERVAL_SECS)]
    pub poll_interval_secs: u64,

    /// Blocks that must follow a deposit before it is relayed
    #[arg(long, env = BLOCK_CONFIRMATIONS, default_value_t = DEFAULT_BLOCK_CONFIRMATIONS)]
    pub block_confirmations: u64,

    /// Per-call RPC timeout in seconds
    #[arg(long, env = RPC_TIMEOUT_SECONDS, default_value_t = DEFAULT_RPC_TIMEOUT_SECS)]
    pub rpc_timeout_secs: u64,

    /// First source block to scan, chain tip when unset
    #[arg(long, env = START_BLOCK)]
    pub start_block: Option<u64>,

    /// Port for the Prometheus exporter, disabled when unset
    #[arg(long, env = METRICS_PORT)]
    pub metrics_port: Option<u16>,
}

impl TryFrom<RelayerArgs> for RelayerConfig {
    type Error = ConfigError;

    fn try_from(args: RelayerArgs) -> Result<Self, Self::Error> {
        let config = Self {
            source: ChainConfig {
                rpc_url: args
                    .source_rpc_url
                    .ok_or(ConfigError::Missing(SOURCE_CHAIN_RPC_URL))?,
                bridge_address: args
                    .source_bridge
                    .ok_or(ConfigError::Missing(SOURCE_BRIDGE_CONTRACT_ADDRESS))?,
            },
            destination: ChainConfig {
                rpc_url: args
                    .destination_rpc_url
                    .ok_or(ConfigError::Missing(DESTINATION_CHAIN_RPC_URL))?,
                bridge_address: args
                    .destination_bridge
                    .ok_or(ConfigError::Missing(DESTINATION_BRIDGE_CONTRACT_ADDRESS))?,
            },
            relayer_private_key: args
                .relayer_private_key
                .map(RelayerKey::new)
                .ok_or(ConfigError::Missing(RELAYER_PRIVATE_KEY))?,
            healthcheck_url: args
                .healthcheck_url
                .ok_or(ConfigError::Missing(HEALTHCHECK_URL))?,
            poll_interval_secs: args.poll_interval_secs,
            block_confirmations: args.block_confirmations,
            rpc_timeout_secs: args.rpc_timeout_secs,
            start_block: args.start_block,
            metrics_port: args.metrics_port,
        };
        config.validate()?;

        Ok(config)
    }
}
