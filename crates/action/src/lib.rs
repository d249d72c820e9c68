//! Mutating calls against the vault and the machinery that decides whether
//! they succeeded.
//!
//! A call is sent through a [`ChainWriter`]. The [`TransactionSubmitter`]
//! races the direct acknowledgement against a fixed timeout while the
//! [`ConfirmationWatcher`] polls chain state for the call's effect; the
//! [`Race`] picks whichever observes the outcome first.

pub mod classify;
pub mod error;
pub mod progress;
pub mod race;
pub mod submit;
pub mod watch;
pub mod writer;

pub use classify::{classify, classify_report, ErrorCategory, Failure};
pub use error::CallError;
pub use progress::{Phase, ProgressState, ProgressTracker};
pub use race::{Race, RaceResult};
pub use submit::{SubmissionOutcome, TransactionSubmitter};
pub use watch::{ConfirmationWatcher, ExpectedEffect, Observation};
pub use writer::ContractWriter;

use alloy_primitives::{Address, TxHash, U256};
use balance::{AmountCodec, CodecError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fmt, future::Future};

/// The user-visible operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Approve,
    Deposit,
    Withdraw,
}

impl ActionKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Deposit => "deposit",
            Self::Withdraw => "withdraw",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-triggered operation. Immutable once submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub kind: ActionKind,
    /// Amount as entered by the user
    pub amount: Decimal,
    /// `amount` in contract base units
    pub base_units: U256,
    pub initiator: Address,
    pub target_contract: Address,
}

impl Action {
    /// Build an action, rejecting amounts the codec refuses.
    pub fn new(
        kind: ActionKind,
        amount: Decimal,
        codec: &AmountCodec,
        initiator: Address,
        target_contract: Address,
    ) -> Result<Self, CodecError> {
        let base_units = codec.encode(amount)?;
        Ok(Self {
            kind,
            amount,
            base_units,
            initiator,
            target_contract,
        })
    }

    /// Get a human-readable description of this action.
    pub fn description(&self) -> String {
        format!(
            "{} {} from {} via {}",
            self.kind, self.amount, self.initiator, self.target_contract
        )
    }
}

/// Encoded contract call sent by a [`ChainWriter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultCall {
    /// `token.approve(spender, amount)`
    Approve {
        token: Address,
        spender: Address,
        amount: U256,
    },
    /// `vault.deposit(assets, receiver)`
    Deposit {
        vault: Address,
        assets: U256,
        receiver: Address,
    },
    /// `vault.withdraw(assets, receiver, owner, maxShares)`
    Withdraw {
        vault: Address,
        assets: U256,
        receiver: Address,
        owner: Address,
        max_shares: U256,
    },
}

impl VaultCall {
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::Approve { .. } => ActionKind::Approve,
            Self::Deposit { .. } => ActionKind::Deposit,
            Self::Withdraw { .. } => ActionKind::Withdraw,
        }
    }

    /// Base units moved (or approved) by the call.
    pub const fn amount(&self) -> U256 {
        match self {
            Self::Approve { amount, .. } => *amount,
            Self::Deposit { assets, .. } | Self::Withdraw { assets, .. } => *assets,
        }
    }
}

/// What is known about a call once its effect is confirmed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptSummary {
    /// Transaction hash, if the call was seen broadcast
    pub tx_hash: Option<TxHash>,
    /// Block number where the transaction was included
    pub block_number: Option<u64>,
    /// Gas used
    pub gas_used: Option<u64>,
}

/// Write access to the chain through the wallet's signer.
pub trait ChainWriter: Send + Sync {
    /// Sign and broadcast `call`. Resolves once the node accepted it.
    fn send(&self, call: &VaultCall) -> impl Future<Output = Result<TxHash, CallError>> + Send;

    /// Wait for the transaction to be included.
    ///
    /// A receipt with a failed status is [`CallError::Reverted`].
    fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
    ) -> impl Future<Output = Result<ReceiptSummary, CallError>> + Send;
}
