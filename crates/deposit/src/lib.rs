//! Deposit of the underlying asset into the vault.
//!
//! A deposit first passes the [`AllowanceGate`], which approves the vault to
//! pull the underlying only when the current allowance falls short. The
//! [`DepositPlan`] then describes the call, the effect the watcher looks for,
//! and the balance condition that marks the deposit as settled.

pub mod allowance;

pub use allowance::{AllowanceGate, AllowanceStatus};

use action::{ExpectedEffect, VaultCall};
use alloy_primitives::{Address, U256};
use balance::ChainStateSnapshot;

/// A deposit of `assets` by `owner`, relative to the balances read before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositPlan {
    pub vault: Address,
    pub owner: Address,
    pub assets: U256,
    pub baseline: ChainStateSnapshot,
}

impl DepositPlan {
    pub const fn new(
        vault: Address,
        owner: Address,
        assets: U256,
        baseline: ChainStateSnapshot,
    ) -> Self {
        Self {
            vault,
            owner,
            assets,
            baseline,
        }
    }

    /// `vault.deposit(assets, owner)`
    pub const fn call(&self) -> VaultCall {
        VaultCall::Deposit {
            vault: self.vault,
            assets: self.assets,
            receiver: self.owner,
        }
    }

    /// Vault balance grows.
    pub fn effect(&self) -> ExpectedEffect {
        ExpectedEffect::Deposit {
            baseline: self.baseline.clone(),
        }
    }

    /// The underlying balance reflects the transfer into the vault.
    pub fn is_settled(&self, snapshot: &ChainStateSnapshot) -> bool {
        snapshot.underlying_balance <= self.baseline.underlying_balance.saturating_sub(self.assets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn snapshot(underlying: u64, vault: u64) -> ChainStateSnapshot {
        ChainStateSnapshot {
            owner: Address::repeat_byte(1),
            underlying_balance: U256::from(underlying),
            vault_balance: U256::from(vault),
            observed_at: SystemTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn test_deposit_call_credits_owner() {
        let plan = DepositPlan::new(
            Address::repeat_byte(9),
            Address::repeat_byte(1),
            U256::from(1_000_000),
            snapshot(10_000_000, 0),
        );

        assert_eq!(
            plan.call(),
            VaultCall::Deposit {
                vault: Address::repeat_byte(9),
                assets: U256::from(1_000_000),
                receiver: Address::repeat_byte(1),
            }
        );
    }

    #[test]
    fn test_settled_once_underlying_dropped() {
        let plan = DepositPlan::new(
            Address::ZERO,
            Address::repeat_byte(1),
            U256::from(1_000_000),
            snapshot(10_000_000, 0),
        );

        // Replica still serving the pre-deposit balance.
        assert!(!plan.is_settled(&snapshot(10_000_000, 1_000_000)));
        assert!(plan.is_settled(&snapshot(9_000_000, 1_000_000)));
        assert!(plan.is_settled(&snapshot(8_500_000, 1_000_000)));
    }
}
