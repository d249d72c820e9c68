//! Upstream fault conditions of a mutating call.

use alloy_json_rpc::ErrorPayload;
use alloy_provider::PendingTransactionError;
use alloy_sol_types::decode_revert_reason;
use alloy_transport::TransportError;
use thiserror::Error;

/// EIP-1193: the user rejected the request.
pub const USER_REJECTED_CODE: i64 = 4001;

/// EIP-1474: execution reverted, revert data in `data`.
pub const EXECUTION_REVERTED_CODE: i64 = 3;

/// Closed set of ways a call can fail.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CallError {
    /// The signer declined before broadcast
    #[error("Request rejected by the signer")]
    Rejected,

    /// Not enough native balance to pay for gas
    #[error("Insufficient funds for gas: {0}")]
    InsufficientFunds(String),

    /// On-chain execution failed
    #[error("Execution reverted: {}", .reason.as_deref().unwrap_or("no reason given"))]
    Reverted { reason: Option<String> },

    /// Node or network failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response could not be interpreted
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl CallError {
    /// Whether the call definitely did not take effect.
    pub const fn is_definitive(&self) -> bool {
        matches!(
            self,
            Self::Rejected | Self::InsufficientFunds(_) | Self::Reverted { .. }
        )
    }

    pub fn from_contract_error(err: &alloy_contract::Error) -> Self {
        if let Some(data) = err.as_revert_data() {
            return Self::Reverted {
                reason: decode_revert_reason(&data),
            };
        }

        match err {
            alloy_contract::Error::TransportError(e) => Self::from_transport_error(e),
            other => Self::Malformed(other.to_string()),
        }
    }

    pub fn from_transport_error(err: &TransportError) -> Self {
        err.as_error_resp()
            .map_or_else(|| Self::Transport(err.to_string()), Self::from_error_payload)
    }

    pub fn from_pending_error(err: &PendingTransactionError) -> Self {
        match err {
            PendingTransactionError::TransportError(e) => Self::from_transport_error(e),
            other => Self::Transport(other.to_string()),
        }
    }

    pub fn from_error_payload(payload: &ErrorPayload) -> Self {
        if let Some(data) = payload.as_revert_data() {
            return Self::Reverted {
                reason: decode_revert_reason(&data),
            };
        }

        match payload.code {
            USER_REJECTED_CODE => Self::Rejected,
            EXECUTION_REVERTED_CODE => Self::Reverted { reason: None },
            // Nodes report these two only through the message text.
            _ if payload.message.contains("insufficient funds") => {
                Self::InsufficientFunds(payload.message.to_string())
            }
            _ if payload.message.contains("execution reverted") => Self::Reverted { reason: None },
            _ => Self::Transport(payload.to_string()),
        }
    }
}

impl From<alloy_contract::Error> for CallError {
    fn from(err: alloy_contract::Error) -> Self {
        Self::from_contract_error(&err)
    }
}

impl From<TransportError> for CallError {
    fn from(err: TransportError) -> Self {
        Self::from_transport_error(&err)
    }
}

impl From<PendingTransactionError> for CallError {
    fn from(err: PendingTransactionError) -> Self {
        Self::from_pending_error(&err)
    }
}
