//! Per-action progress published to observers.

use crate::{ErrorCategory, Failure};
use alloy_primitives::TxHash;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

/// Phases in the order an action moves through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    Idle,
    Approving,
    Submitting,
    Confirming,
    Verifying,
    Success,
    Error,
}

impl Phase {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Approving => "approving",
            Self::Submitting => "submitting",
            Self::Confirming => "confirming",
            Self::Verifying => "verifying",
            Self::Success => "success",
            Self::Error => "error",
        }
    }

    /// Phases only move forward; `Error` may interrupt any non-terminal phase.
    fn can_move_to(self, next: Self) -> bool {
        !self.is_terminal() && (next >= self || next == Self::Error)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressState {
    pub phase: Phase,
    /// Seconds left before the submission deadline
    pub countdown_seconds: u64,
    pub message: String,
    /// Hash of the last broadcast transaction
    pub tx_hash: Option<TxHash>,
    /// Set once an approval for this action is verified on chain
    pub approval_confirmed: bool,
    /// Present only in the `Error` phase
    pub error: Option<ErrorCategory>,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            countdown_seconds: 0,
            message: String::new(),
            tx_hash: None,
            approval_confirmed: false,
            error: None,
        }
    }
}

/// Owns the progress of one action kind and enforces phase ordering.
#[derive(Debug)]
pub struct ProgressTracker {
    state: watch::Sender<ProgressState>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            state: watch::Sender::new(ProgressState::default()),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ProgressState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> ProgressState {
        self.state.borrow().clone()
    }

    pub fn phase(&self) -> Phase {
        self.state.borrow().phase
    }

    pub fn tx_hash(&self) -> Option<TxHash> {
        self.state.borrow().tx_hash
    }

    /// Start a new action from a clean state.
    pub fn begin(&self) {
        self.state.send_replace(ProgressState::default());
    }

    /// Move to `phase`. Returns false if the transition would go backwards
    /// or leave a terminal phase.
    pub fn advance(&self, phase: Phase, message: impl Into<String>) -> bool {
        let message = message.into();
        let moved = self.state.send_if_modified(|state| {
            if state.phase != phase && !state.phase.can_move_to(phase) {
                return false;
            }
            if state.phase != phase {
                state.countdown_seconds = 0;
            }
            state.phase = phase;
            state.message = message.clone();
            true
        });

        if moved {
            debug!(phase = phase.as_str(), %message, "Progress");
        } else {
            warn!(
                from = self.phase().as_str(),
                to = phase.as_str(),
                "Ignoring out-of-order progress update"
            );
        }
        moved
    }

    /// Update the message without changing phase.
    pub fn note(&self, message: impl Into<String>) {
        let message = message.into();
        self.state.send_if_modified(|state| {
            if state.phase.is_terminal() {
                return false;
            }
            state.message = message;
            true
        });
    }

    pub fn countdown(&self, seconds: u64) {
        self.state.send_if_modified(|state| {
            if state.phase.is_terminal() || state.countdown_seconds == seconds {
                return false;
            }
            state.countdown_seconds = seconds;
            true
        });
    }

    /// Record a broadcast. A broadcast while submitting means the action is
    /// now waiting for confirmation.
    pub fn broadcast(&self, tx_hash: TxHash, message: impl Into<String>) {
        let message = message.into();
        self.state.send_if_modified(|state| {
            if state.phase.is_terminal() {
                return false;
            }
            state.tx_hash = Some(tx_hash);
            state.message = message;
            if state.phase == Phase::Submitting {
                state.phase = Phase::Confirming;
            }
            true
        });
    }

    pub fn approval_confirmed(&self) {
        self.state.send_if_modified(|state| {
            if state.phase.is_terminal() || state.approval_confirmed {
                return false;
            }
            state.approval_confirmed = true;
            true
        });
    }

    /// Terminate with a failure.
    pub fn fail(&self, failure: &Failure) -> bool {
        self.state.send_if_modified(|state| {
            if state.phase.is_terminal() {
                return false;
            }
            state.phase = Phase::Error;
            state.error = Some(failure.category);
            state.message = failure.message.clone();
            state.countdown_seconds = 0;
            true
        })
    }
}
