//! Read-side of the vault flows.
//!
//! This crate provides the read-only view of the chain the orchestrator
//! relies on: a [`ChainReader`] over the token and vault view functions, the
//! [`ChainStateSnapshot`] value it produces, the decimal [`AmountCodec`], the
//! [`RetryVerifier`] that waits out RPC replica lag, and the
//! [`BalanceReconciler`] that is the only publisher of balances.

pub mod amount;
pub mod debt;
pub mod monitor;
pub mod reconcile;
pub mod verify;

pub use amount::{AmountCodec, CodecError};
pub use debt::TotalDebtCache;
pub use monitor::ContractReader;
pub use reconcile::{BalanceReconciler, PublishedBalances};
pub use verify::{ReadRetry, RetryVerifier, Verification};

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::{future::Future, time::SystemTime};

/// Balances of one owner, read in a single pass.
///
/// Never mutated; a newer read replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainStateSnapshot {
    /// The address holding the balances
    pub owner: Address,
    /// Underlying asset balance (base units)
    pub underlying_balance: U256,
    /// Vault share balance (base units)
    pub vault_balance: U256,
    /// Wall-clock time the read completed
    pub observed_at: SystemTime,
}

/// A single view-function read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainQuery {
    /// `token.balanceOf(owner)`
    UnderlyingBalance { owner: Address },
    /// `vault.balanceOf(owner)`
    VaultBalance { owner: Address },
    /// `token.allowance(owner, spender)`
    Allowance { owner: Address, spender: Address },
    /// Native balance, pays for gas
    NativeBalance { owner: Address },
    /// `vault.previewWithdraw(assets)`
    PreviewWithdraw { assets: U256 },
    /// `vault.totalDebt()`
    TotalDebt,
}

/// Read-only accessor for the token and vault view functions.
pub trait ChainReader: Send + Sync {
    /// Perform a single read.
    fn query(&self, query: ChainQuery) -> impl Future<Output = eyre::Result<U256>> + Send;

    /// Read both balances of `owner` in one pass.
    fn snapshot(
        &self,
        owner: Address,
    ) -> impl Future<Output = eyre::Result<ChainStateSnapshot>> + Send {
        async move {
            let underlying_balance = self.query(ChainQuery::UnderlyingBalance { owner }).await?;
            let vault_balance = self.query(ChainQuery::VaultBalance { owner }).await?;

            Ok(ChainStateSnapshot {
                owner,
                underlying_balance,
                vault_balance,
                observed_at: SystemTime::now(),
            })
        }
    }

    /// Allowance `owner` has granted `spender` on the underlying token.
    fn allowance(
        &self,
        owner: Address,
        spender: Address,
    ) -> impl Future<Output = eyre::Result<U256>> + Send {
        self.query(ChainQuery::Allowance { owner, spender })
    }
}
