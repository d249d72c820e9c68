use alloy_primitives::Address;
use config::{NetworkConfig, NetworkConfigBuilder, TimingConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_METRICS_PORT: u16 = 9090;
const DEFAULT_MONITOR_INTERVAL_SECS: u64 = 30;

/// Top-level orchestrator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base RPC endpoint url
    pub rpc_url: String,

    /// Address whose balances are monitored and who owns vault positions
    pub owner_address: Address,

    /// Override of the underlying token address
    #[serde(default)]
    pub usdc_address: Option<Address>,

    /// Override of the vault address
    #[serde(default)]
    pub vault_address: Option<Address>,

    /// Prometheus exporter port
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Seconds between balance monitor cycles
    #[serde(default = "default_monitor_interval_secs")]
    pub monitor_interval_secs: u64,

    #[serde(default)]
    pub timing: TimingConfig,
}

const fn default_metrics_port() -> u16 {
    DEFAULT_METRICS_PORT
}

const fn default_monitor_interval_secs() -> u64 {
    DEFAULT_MONITOR_INTERVAL_SECS
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> eyre::Result<Self> {
        let config: Self = toml::from_str(contents)?;
        Ok(config)
    }

    /// Base network settings with this file's overrides applied.
    pub fn network_config(&self) -> NetworkConfig {
        let mut builder = NetworkConfigBuilder::base();
        if let Some(usdc) = self.usdc_address {
            builder = builder.usdc(usdc);
        }
        if let Some(vault) = self.vault_address {
            builder = builder.vault(vault);
        }
        builder.build()
    }
}
