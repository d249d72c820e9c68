//! Network configuration for the vault flows.
//!
//! Provides chain-specific addresses and parameters for Base mainnet, with a
//! builder for overriding them (forks, local test chains).

use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};

/// Base mainnet chain id.
pub const BASE_CHAIN_ID: u64 = 8453;

/// Complete network configuration for the vault flows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Chain ID the wallet must be connected to
    pub chain_id: u64,
    /// Underlying stable asset (USDC)
    pub usdc: Address,
    /// Vault contract address (spender for approvals, target for deposit/withdraw)
    pub vault: Address,
    /// Decimals shared by the underlying asset and vault shares
    pub decimals: u8,
    /// Block explorer base url for transaction links
    pub explorer_url: String,
}

impl NetworkConfig {
    /// Base mainnet configuration.
    pub fn base() -> Self {
        Self {
            chain_id: BASE_CHAIN_ID,
            // https://basescan.org/address/0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913
            usdc: address!("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"),
            // https://basescan.org/address/0x119d2bc7bb9b94f5518ce30169457ff358b47535
            vault: address!("0x119d2bc7bb9b94f5518ce30169457ff358b47535"),
            decimals: 6,
            explorer_url: "https://basescan.org".to_string(),
        }
    }

    /// Explorer link for a transaction hash.
    pub fn tx_url(&self, tx_hash: impl std::fmt::Display) -> String {
        format!("{}/tx/{}", self.explorer_url.trim_end_matches('/'), tx_hash)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::base()
    }
}

/// Builder for custom network configurations.
#[derive(Debug, Clone)]
pub struct NetworkConfigBuilder {
    config: NetworkConfig,
}

impl NetworkConfigBuilder {
    /// Start with Base mainnet defaults.
    pub fn base() -> Self {
        Self {
            config: NetworkConfig::base(),
        }
    }

    /// Override the chain id.
    pub const fn chain_id(mut self, chain_id: u64) -> Self {
        self.config.chain_id = chain_id;
        self
    }

    /// Override the underlying asset address.
    pub const fn usdc(mut self, address: Address) -> Self {
        self.config.usdc = address;
        self
    }

    /// Override the vault address.
    pub const fn vault(mut self, address: Address) -> Self {
        self.config.vault = address;
        self
    }

    /// Override the asset decimals.
    pub const fn decimals(mut self, decimals: u8) -> Self {
        self.config.decimals = decimals;
        self
    }

    /// Override the block explorer.
    pub fn explorer_url(mut self, url: impl Into<String>) -> Self {
        self.config.explorer_url = url.into();
        self
    }

    /// Build the network configuration.
    pub fn build(self) -> NetworkConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_config() {
        let config = NetworkConfig::base();
        assert_eq!(config.chain_id, 8453);
        assert_eq!(config.decimals, 6);
        assert_eq!(
            config.usdc,
            address!("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913")
        );
    }

    #[test]
    fn test_custom_config_builder() {
        let custom_vault = address!("1111111111111111111111111111111111111111");

        let config = NetworkConfigBuilder::base()
            .vault(custom_vault)
            .chain_id(31337)
            .build();

        assert_eq!(config.vault, custom_vault);
        assert_eq!(config.chain_id, 31337);
        assert_eq!(config.usdc, NetworkConfig::base().usdc);
    }

    #[test]
    fn test_tx_url() {
        let config = NetworkConfigBuilder::base()
            .explorer_url("https://example.org/")
            .build();
        assert_eq!(config.tx_url("0xabc"), "https://example.org/tx/0xabc");
    }
}
