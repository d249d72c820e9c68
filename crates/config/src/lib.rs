//! Configuration types for the vault orchestrator.
//!
//! This crate provides:
//! - Network configuration for Base (chain id, token and vault addresses)
//! - Timing configuration (submission timeout, polling, retry budgets)

pub mod network;
pub mod timing;

pub use network::{NetworkConfig, NetworkConfigBuilder, BASE_CHAIN_ID};
pub use timing::TimingConfig;
