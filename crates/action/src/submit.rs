//! Send a call and wait for its receipt, bounded by a fixed deadline.

use crate::{CallError, ChainWriter, ProgressTracker, ReceiptSummary, VaultCall};
use alloy_primitives::TxHash;
use config::TimingConfig;
use std::time::Duration;
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};
use tracing::{info, warn};

/// How a submission ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// The call's effect is confirmed on chain
    Confirmed { receipt: ReceiptSummary },
    /// Neither an acknowledgement nor a failure arrived before the deadline.
    /// The transaction may still be mined.
    AmbiguousTimeout,
    /// The call definitely failed or the node refused it
    Failed { error: CallError },
}

/// A direct path that stopped short of a receipt.
struct Interrupted {
    error: CallError,
    /// Set once the call was broadcast
    tx_hash: Option<TxHash>,
}

/// Races the direct path (send, then receipt) against a deadline and
/// publishes a countdown while it waits.
#[derive(Debug, Clone)]
pub struct TransactionSubmitter {
    timeout: Duration,
    tick: Duration,
    explorer_url: String,
}

impl TransactionSubmitter {
    pub fn new(timeout: Duration, tick: Duration, explorer_url: impl Into<String>) -> Self {
        Self {
            timeout,
            tick,
            explorer_url: explorer_url.into(),
        }
    }

    pub fn from_timing(timing: &TimingConfig, explorer_url: impl Into<String>) -> Self {
        Self::new(
            timing.submission_timeout(),
            timing.countdown_tick(),
            explorer_url,
        )
    }

    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Submit `call` and resolve exactly once.
    pub async fn submit<W: ChainWriter>(
        &self,
        writer: &W,
        call: &VaultCall,
        progress: &ProgressTracker,
    ) -> SubmissionOutcome {
        let start = Instant::now();
        let deadline = start + self.timeout;
        let mut ticker = interval_at(start, self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let direct = self.direct(writer, call, progress);
        tokio::pin!(direct);
        let mut direct_pending = true;

        let outcome = loop {
            tokio::select! {
                biased;

                result = &mut direct, if direct_pending => {
                    match result {
                        Ok(receipt) => break SubmissionOutcome::Confirmed { receipt },
                        Err(Interrupted { error, tx_hash: Some(tx_hash) }) if !error.is_definitive() => {
                            // Broadcast, so it may still land. Only the deadline decides now.
                            warn!(
                                kind = %call.kind(),
                                %tx_hash,
                                %error,
                                "Lost track of the receipt, waiting for the deadline"
                            );
                            direct_pending = false;
                        }
                        Err(Interrupted { error, .. }) => {
                            warn!(kind = %call.kind(), %error, "Submission failed");
                            break SubmissionOutcome::Failed { error };
                        }
                    }
                }
                () = sleep_until(deadline) => {
                    warn!(
                        kind = %call.kind(),
                        timeout_secs = self.timeout.as_secs(),
                        "No acknowledgement before the deadline"
                    );
                    break SubmissionOutcome::AmbiguousTimeout;
                }
                now = ticker.tick() => {
                    let remaining = deadline.saturating_duration_since(now);
                    progress.countdown(remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0));
                }
            }
        };

        progress.countdown(0);
        outcome
    }

    async fn direct<W: ChainWriter>(
        &self,
        writer: &W,
        call: &VaultCall,
        progress: &ProgressTracker,
    ) -> Result<ReceiptSummary, Interrupted> {
        let tx_hash = writer.send(call).await.map_err(|error| Interrupted {
            error,
            tx_hash: None,
        })?;
        let url = format!("{}/tx/{tx_hash}", self.explorer_url.trim_end_matches('/'));
        info!(kind = %call.kind(), %tx_hash, %url, "Transaction sent");
        progress.broadcast(tx_hash, format!("Transaction sent: {url}"));

        let receipt = writer
            .wait_for_receipt(tx_hash)
            .await
            .map_err(|error| Interrupted {
                error,
                tx_hash: Some(tx_hash),
            })?;
        info!(
            kind = %call.kind(),
            %tx_hash,
            block = ?receipt.block_number,
            gas_used = ?receipt.gas_used,
            "Transaction confirmed"
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Phase;
    use alloy_primitives::{Address, TxHash, U256};
    use std::future::{pending, Future};

    enum Script {
        Confirm,
        Reject,
        NeverAck,
        SentThenHang,
        ReceiptLost,
        ReceiptReverted,
    }

    struct ScriptedWriter(Script);

    impl ChainWriter for ScriptedWriter {
        fn send(&self, _call: &VaultCall) -> impl Future<Output = Result<TxHash, CallError>> + Send {
            let result = match self.0 {
                Script::Reject => Some(Err(CallError::Rejected)),
                Script::NeverAck => None,
                _ => Some(Ok(TxHash::repeat_byte(0xab))),
            };
            async move {
                match result {
                    Some(result) => result,
                    None => pending().await,
                }
            }
        }

        fn wait_for_receipt(
            &self,
            tx_hash: TxHash,
        ) -> impl Future<Output = Result<ReceiptSummary, CallError>> + Send {
            let hang = matches!(self.0, Script::SentThenHang);
            let failure = match self.0 {
                Script::ReceiptLost => Some(CallError::Transport("connection reset".into())),
                Script::ReceiptReverted => Some(CallError::Reverted { reason: None }),
                _ => None,
            };
            async move {
                if hang {
                    pending::<()>().await;
                }
                if let Some(error) = failure {
                    return Err(error);
                }
                Ok(ReceiptSummary {
                    tx_hash: Some(tx_hash),
                    block_number: Some(10),
                    gas_used: Some(50_000),
                })
            }
        }
    }

    fn call() -> VaultCall {
        VaultCall::Deposit {
            vault: Address::ZERO,
            assets: U256::from(1),
            receiver: Address::ZERO,
        }
    }

    fn submitter() -> TransactionSubmitter {
        TransactionSubmitter::new(
            Duration::from_secs(30),
            Duration::from_secs(1),
            "https://basescan.org",
        )
    }

    fn submitting() -> ProgressTracker {
        let progress = ProgressTracker::new();
        progress.begin();
        progress.advance(Phase::Submitting, "Submitting");
        progress
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirmed() {
        let progress = submitting();
        let outcome = submitter()
            .submit(&ScriptedWriter(Script::Confirm), &call(), &progress)
            .await;

        let SubmissionOutcome::Confirmed { receipt } = outcome else {
            panic!("expected confirmation, got {outcome:?}");
        };
        assert_eq!(receipt.block_number, Some(10));

        let state = progress.current();
        assert_eq!(state.phase, Phase::Confirming);
        assert_eq!(state.tx_hash, Some(TxHash::repeat_byte(0xab)));
        assert!(state.message.contains("https://basescan.org/tx/0xabab"));
        assert_eq!(state.countdown_seconds, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejection_fails() {
        let progress = submitting();
        let outcome = submitter()
            .submit(&ScriptedWriter(Script::Reject), &call(), &progress)
            .await;

        assert_eq!(
            outcome,
            SubmissionOutcome::Failed {
                error: CallError::Rejected
            }
        );
        assert_eq!(progress.tx_hash(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_silence_is_ambiguous_after_timeout() {
        let progress = submitting();
        let mut rx = progress.subscribe();
        let start = Instant::now();

        let outcome = submitter()
            .submit(&ScriptedWriter(Script::NeverAck), &call(), &progress)
            .await;

        assert_eq!(outcome, SubmissionOutcome::AmbiguousTimeout);
        assert_eq!(start.elapsed(), Duration::from_secs(30));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().countdown_seconds, 0);
        assert_eq!(progress.phase(), Phase::Submitting);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_receipt_is_ambiguous() {
        let progress = submitting();
        let outcome = submitter()
            .submit(&ScriptedWriter(Script::SentThenHang), &call(), &progress)
            .await;

        assert_eq!(outcome, SubmissionOutcome::AmbiguousTimeout);
        assert_eq!(progress.phase(), Phase::Confirming);
        assert_eq!(progress.tx_hash(), Some(TxHash::repeat_byte(0xab)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_is_published() {
        let progress = submitting();
        let mut rx = progress.subscribe();
        rx.borrow_and_update();

        let submitter = submitter();
        let writer = ScriptedWriter(Script::NeverAck);
        let call = call();
        let submission = submitter.submit(&writer, &call, &progress);
        tokio::pin!(submission);

        let observed = tokio::select! {
            _ = &mut submission => None,
            _ = tokio::time::sleep(Duration::from_millis(10_500)) => Some(progress.current().countdown_seconds),
        };

        assert_eq!(observed, Some(20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_lost_receipt_after_broadcast_is_ambiguous() {
        let progress = submitting();
        let start = Instant::now();

        let outcome = submitter()
            .submit(&ScriptedWriter(Script::ReceiptLost), &call(), &progress)
            .await;

        assert_eq!(outcome, SubmissionOutcome::AmbiguousTimeout);
        assert_eq!(start.elapsed(), Duration::from_secs(30));
        assert_eq!(progress.phase(), Phase::Confirming);
        assert_eq!(progress.current().countdown_seconds, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reverted_receipt_fails_at_once() {
        let progress = submitting();
        let start = Instant::now();

        let outcome = submitter()
            .submit(&ScriptedWriter(Script::ReceiptReverted), &call(), &progress)
            .await;

        assert_eq!(
            outcome,
            SubmissionOutcome::Failed {
                error: CallError::Reverted { reason: None }
            }
        );
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
