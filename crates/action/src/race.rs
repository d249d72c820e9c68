//! Direct acknowledgement versus state polling: first observer wins.

use crate::{
    ChainWriter, ConfirmationWatcher, ExpectedEffect, Observation, ProgressTracker,
    SubmissionOutcome, TransactionSubmitter, VaultCall,
};
use alloy_primitives::Address;
use balance::ChainReader;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RaceResult {
    /// The submitter resolved first
    Submitted(SubmissionOutcome),
    /// The watcher saw the effect before the direct path resolved
    Detected(Observation),
}

/// Everything needed to send a call and observe its outcome.
pub struct Race<'a, W, R> {
    pub writer: &'a W,
    pub reader: &'a R,
    pub submitter: &'a TransactionSubmitter,
    pub watcher: &'a ConfirmationWatcher,
}

impl<W, R> Race<'_, W, R>
where
    W: ChainWriter,
    R: ChainReader,
{
    /// Submit `call` while watching for `effect`. The loser is dropped, so
    /// exactly one result comes back.
    pub async fn run(
        &self,
        call: &VaultCall,
        owner: Address,
        effect: &ExpectedEffect,
        progress: &ProgressTracker,
    ) -> RaceResult {
        tokio::select! {
            biased;

            outcome = self.submitter.submit(self.writer, call, progress) => {
                RaceResult::Submitted(outcome)
            }
            observation = self.watcher.watch(self.reader, owner, effect) => {
                info!(kind = %call.kind(), "Effect observed before the wallet acknowledged");
                progress.countdown(0);
                RaceResult::Detected(observation)
            }
        }
    }

    /// Keep watching for `effect` after an ambiguous submission, for at most
    /// `window`.
    pub async fn follow_up(
        &self,
        owner: Address,
        effect: &ExpectedEffect,
        window: Duration,
    ) -> Option<Observation> {
        match tokio::time::timeout(window, self.watcher.watch(self.reader, owner, effect)).await {
            Ok(observation) => Some(observation),
            Err(_) => {
                warn!(
                    effect = effect.name(),
                    window_secs = window.as_secs(),
                    "Effect not observed after submission timeout"
                );
                None
            }
        }
    }
}
