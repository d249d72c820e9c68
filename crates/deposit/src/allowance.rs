//! Approve the vault to pull the underlying, only when needed.

use action::{
    classify_report, ChainWriter, ErrorCategory, ExpectedEffect, Failure, Phase, ProgressTracker,
    Race, RaceResult, ReceiptSummary, SubmissionOutcome, VaultCall,
};
use alloy_primitives::{Address, U256};
use balance::{ChainReader, ReadRetry, RetryVerifier, Verification};
use config::TimingConfig;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Result of [`AllowanceGate::ensure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowanceStatus {
    /// The existing allowance already covers the amount
    Ready,
    /// An approval was sent and the allowance now covers the amount
    ApprovalSubmitted(SubmissionOutcome),
}

#[derive(Debug, Clone)]
pub struct AllowanceGate {
    token: Address,
    reads: ReadRetry,
    verifier: RetryVerifier,
    settle: Duration,
}

impl AllowanceGate {
    pub const fn new(
        token: Address,
        reads: ReadRetry,
        verifier: RetryVerifier,
        settle: Duration,
    ) -> Self {
        Self {
            token,
            reads,
            verifier,
            settle,
        }
    }

    pub fn from_timing(token: Address, timing: &TimingConfig) -> Self {
        Self::new(
            token,
            ReadRetry::new(timing.read_retry_attempts, timing.read_retry_base()),
            RetryVerifier::new(
                timing.allowance_verify_retries,
                timing.allowance_verify_delay(),
            ),
            timing.allowance_settle(),
        )
    }

    /// Make sure `spender` may pull `amount` of the token from `owner`.
    ///
    /// Nothing is written when the current allowance suffices. Otherwise an
    /// approval for exactly `amount` is raced against the allowance watcher
    /// and the new allowance is verified before returning.
    pub async fn ensure<W, R>(
        &self,
        race: &Race<'_, W, R>,
        owner: Address,
        spender: Address,
        amount: U256,
        progress: &ProgressTracker,
    ) -> Result<AllowanceStatus, Failure>
    where
        W: ChainWriter,
        R: ChainReader,
    {
        let reader = race.reader;
        let current = self
            .reads
            .run("allowance", || reader.allowance(owner, spender))
            .await
            .map_err(|e| classify_report(&e))?;

        if current >= amount {
            debug!(
                owner = %owner,
                spender = %spender,
                allowance = %current,
                required = %amount,
                "Allowance sufficient, no approval needed"
            );
            return Ok(AllowanceStatus::Ready);
        }

        info!(
            owner = %owner,
            spender = %spender,
            allowance = %current,
            required = %amount,
            "Allowance insufficient, requesting approval"
        );
        progress.advance(Phase::Approving, "Approving USDC for the vault...");

        let call = VaultCall::Approve {
            token: self.token,
            spender,
            amount,
        };
        let effect = ExpectedEffect::Allowance {
            spender,
            required: amount,
        };

        let outcome = match race.run(&call, owner, &effect, progress).await {
            RaceResult::Submitted(SubmissionOutcome::Failed { error }) => {
                return Err(Failure::from(&error));
            }
            RaceResult::Submitted(outcome) => outcome,
            RaceResult::Detected(_) => SubmissionOutcome::Confirmed {
                receipt: ReceiptSummary {
                    tx_hash: progress.tx_hash(),
                    ..ReceiptSummary::default()
                },
            },
        };

        match outcome {
            SubmissionOutcome::AmbiguousTimeout => {
                progress.note("Approval not acknowledged, checking allowance on chain...");
            }
            _ => progress.note("Approval confirmed, waiting for the allowance to sync..."),
        }

        let verification = self
            .verifier
            .verify(
                || reader.allowance(owner, spender),
                |allowance| *allowance >= amount,
            )
            .await;

        if let Verification::Exhausted { last } = verification {
            warn!(
                owner = %owner,
                last = ?last,
                required = %amount,
                attempts = self.verifier.max_retries(),
                "Allowance never reached the approved amount"
            );
            return Err(Failure::new(ErrorCategory::RpcSyncDelay));
        }

        progress.approval_confirmed();
        progress.note("Approval confirmed.");

        // Gas estimation for the deposit can still see the old allowance.
        sleep(self.settle).await;

        Ok(AllowanceStatus::ApprovalSubmitted(outcome))
    }
}
