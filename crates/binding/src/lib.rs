//! Contract bindings for all external contracts.
//!
//! This crate consolidates the Solidity interfaces the vault flows talk to:
//! - ERC20 tokens (the underlying stable asset)
//! - The custodial ERC4626-style vault
//!
//! All bindings are generated using alloy's `sol!` macro.

pub mod token;
pub mod vault;
