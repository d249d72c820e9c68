//! Map failures of any origin to the fixed set of user-facing categories.

use crate::CallError;
use alloy_provider::PendingTransactionError;
use alloy_transport::TransportError;
use balance::CodecError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// User-facing failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    InvalidAmount,
    UserRejected,
    InsufficientGas,
    ContractReverted,
    NetworkTimeout,
    RpcSyncDelay,
    Unknown,
}

impl ErrorCategory {
    /// Fixed message shown for the category.
    pub const fn user_message(self) -> &'static str {
        match self {
            Self::InvalidAmount => "Enter an amount greater than zero.",
            Self::UserRejected => "Action cancelled in your wallet.",
            Self::InsufficientGas => {
                "Your wallet does not have enough ETH on Base to pay for gas. \
                 Please fund your wallet and try again."
            }
            Self::ContractReverted => {
                "The contract reverted the transaction. \
                 Please check your balance and approval, then try again."
            }
            Self::NetworkTimeout => {
                "Transaction timed out. \
                 Please check your wallet or BaseScan to verify the transaction status."
            }
            Self::RpcSyncDelay => {
                "The transaction likely succeeded but the network is still syncing. \
                 Please wait a few seconds and refresh."
            }
            Self::Unknown => "Something went wrong. Please try again.",
        }
    }

    /// Label used in metrics and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidAmount => "invalid_amount",
            Self::UserRejected => "user_rejected",
            Self::InsufficientGas => "insufficient_gas",
            Self::ContractReverted => "contract_reverted",
            Self::NetworkTimeout => "network_timeout",
            Self::RpcSyncDelay => "rpc_sync_delay",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified failure, ready to be shown to the user.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
pub struct Failure {
    pub category: ErrorCategory,
    pub message: String,
}

impl Failure {
    pub fn new(category: ErrorCategory) -> Self {
        Self {
            category,
            message: category.user_message().to_string(),
        }
    }
}

impl From<ErrorCategory> for Failure {
    fn from(category: ErrorCategory) -> Self {
        Self::new(category)
    }
}

impl From<&CallError> for Failure {
    fn from(err: &CallError) -> Self {
        let mut failure = Self::new(classify(err));
        if let CallError::Reverted {
            reason: Some(reason),
        } = err
        {
            failure.message = format!("{} ({reason})", failure.message);
        }
        failure
    }
}

/// Classify a call error. Total: every variant maps to exactly one category.
pub const fn classify(err: &CallError) -> ErrorCategory {
    match err {
        CallError::Rejected => ErrorCategory::UserRejected,
        CallError::InsufficientFunds(_) => ErrorCategory::InsufficientGas,
        CallError::Reverted { .. } => ErrorCategory::ContractReverted,
        CallError::Transport(_) | CallError::Malformed(_) => ErrorCategory::Unknown,
    }
}

/// Classify an arbitrary error report by inspecting its typed source.
pub fn classify_report(report: &eyre::Report) -> Failure {
    if let Some(err) = report.downcast_ref::<Failure>() {
        return err.clone();
    }
    if let Some(err) = report.downcast_ref::<CallError>() {
        return Failure::from(err);
    }
    if report.downcast_ref::<CodecError>().is_some() {
        return Failure::new(ErrorCategory::InvalidAmount);
    }
    if let Some(err) = report.downcast_ref::<alloy_contract::Error>() {
        return Failure::from(&CallError::from_contract_error(err));
    }
    if let Some(err) = report.downcast_ref::<TransportError>() {
        return Failure::from(&CallError::from_transport_error(err));
    }
    if let Some(err) = report.downcast_ref::<PendingTransactionError>() {
        return Failure::from(&CallError::from_pending_error(err));
    }
    Failure::new(ErrorCategory::Unknown)
}
