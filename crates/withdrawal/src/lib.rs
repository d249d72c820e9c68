//! Withdrawal of the underlying asset from the vault.
//!
//! The vault burns shares to release assets. [`ShareEstimator`] caps how many
//! shares a withdrawal may burn, and [`WithdrawPlan`] describes the call, the
//! effect the watcher looks for, and when the withdrawal counts as settled.

pub mod shares;

pub use shares::ShareEstimator;

use action::{ExpectedEffect, VaultCall};
use alloy_primitives::{Address, U256};
use balance::ChainStateSnapshot;

/// A withdrawal of `assets` back to `owner`, relative to the balances read
/// before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawPlan {
    pub vault: Address,
    pub owner: Address,
    pub assets: U256,
    /// Upper bound on shares burned
    pub max_shares: U256,
    pub baseline: ChainStateSnapshot,
}

impl WithdrawPlan {
    pub const fn new(
        vault: Address,
        owner: Address,
        assets: U256,
        max_shares: U256,
        baseline: ChainStateSnapshot,
    ) -> Self {
        Self {
            vault,
            owner,
            assets,
            max_shares,
            baseline,
        }
    }

    /// `vault.withdraw(assets, owner, owner, maxShares)`
    pub const fn call(&self) -> VaultCall {
        VaultCall::Withdraw {
            vault: self.vault,
            assets: self.assets,
            receiver: self.owner,
            owner: self.owner,
            max_shares: self.max_shares,
        }
    }

    /// Vault balance shrinks.
    pub fn effect(&self) -> ExpectedEffect {
        ExpectedEffect::Withdraw {
            baseline: self.baseline.clone(),
        }
    }

    /// The underlying balance reflects the assets released by the vault.
    pub fn is_settled(&self, snapshot: &ChainStateSnapshot) -> bool {
        snapshot.underlying_balance >= self.baseline.underlying_balance.saturating_add(self.assets)
    }
}
