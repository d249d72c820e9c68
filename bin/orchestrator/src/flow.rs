//! The deposit and withdraw flows.
//!
//! Both flows share one pipeline: send the call while the watcher polls for
//! its effect, follow up after an ambiguous timeout, wait out replica lag,
//! then publish balances through the reconciler. Every failure on the way is
//! classified, so the entry points always resolve to an [`ActionReport`].

use crate::{
    inflight::InFlight,
    metrics::{Detector, Metrics},
};
use action::{
    classify_report, Action, ActionKind, ChainWriter, ConfirmationWatcher, ErrorCategory,
    ExpectedEffect, Failure, Phase, ProgressState, ProgressTracker, Race, RaceResult,
    SubmissionOutcome, TransactionSubmitter, VaultCall,
};
use alloy_primitives::{Address, U256};
use balance::{
    AmountCodec, BalanceReconciler, ChainQuery, ChainReader, ChainStateSnapshot,
    PublishedBalances, ReadRetry, RetryVerifier,
};
use config::{NetworkConfig, TimingConfig};
use deposit::{AllowanceGate, AllowanceStatus, DepositPlan};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use std::{future::Future, time::Duration};
use tokio::{
    sync::{watch, Mutex},
    time::Instant,
};
use tracing::{debug, info, warn};
use withdrawal::{ShareEstimator, WithdrawPlan};

/// How a call to [`ActionOrchestrator::deposit`] or
/// [`ActionOrchestrator::withdraw`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionReport {
    /// The effect is on chain and the new balances were published
    Success(PublishedBalances),
    /// The action ended in the `Error` phase
    Failed(Failure),
    /// An action of the same kind is already running; nothing was done
    Busy,
}

impl ActionReport {
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub const fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

pub struct ActionOrchestrator<W, R> {
    writer: W,
    reader: R,
    owner: Address,
    network: NetworkConfig,
    codec: AmountCodec,
    submitter: TransactionSubmitter,
    watcher: ConfirmationWatcher,
    follow_up_window: Duration,
    gate: AllowanceGate,
    shares: ShareEstimator,
    reads: ReadRetry,
    balance_verifier: RetryVerifier,
    reconciler: BalanceReconciler<R>,
    deposit_progress: ProgressTracker,
    withdraw_progress: ProgressTracker,
    inflight: InFlight,
    /// Held by the running write. Each flow judges its effect against its own
    /// baseline, so a deposit and a withdraw of one owner take turns.
    write_slot: Mutex<()>,
    metrics: Metrics,
}

impl<W, R> ActionOrchestrator<W, R>
where
    W: ChainWriter,
    R: ChainReader + Clone,
{
    pub fn new(
        writer: W,
        reader: R,
        owner: Address,
        network: NetworkConfig,
        timing: &TimingConfig,
    ) -> Self {
        let reads = ReadRetry::new(timing.read_retry_attempts, timing.read_retry_base());

        Self {
            codec: AmountCodec::new(network.decimals),
            submitter: TransactionSubmitter::from_timing(timing, network.explorer_url.clone()),
            watcher: ConfirmationWatcher::new(timing.watch_interval()),
            follow_up_window: timing.follow_up_window(),
            gate: AllowanceGate::from_timing(network.usdc, timing),
            shares: ShareEstimator::new(timing.share_buffer_bps, reads),
            reads,
            balance_verifier: RetryVerifier::new(
                timing.balance_verify_retries,
                timing.balance_verify_delay(),
            ),
            reconciler: BalanceReconciler::new(reader.clone()),
            deposit_progress: ProgressTracker::new(),
            withdraw_progress: ProgressTracker::new(),
            inflight: InFlight::new(),
            write_slot: Mutex::new(()),
            metrics: Metrics::new(),
            writer,
            reader,
            owner,
            network,
        }
    }

    pub const fn owner(&self) -> Address {
        self.owner
    }

    pub const fn network(&self) -> &NetworkConfig {
        &self.network
    }

    pub const fn codec(&self) -> &AmountCodec {
        &self.codec
    }

    /// Follow the progress of actions of `kind`.
    pub fn progress(&self, kind: ActionKind) -> watch::Receiver<ProgressState> {
        self.tracker(kind).subscribe()
    }

    /// Follow published balances.
    pub fn balances(&self) -> watch::Receiver<Option<PublishedBalances>> {
        self.reconciler.subscribe()
    }

    /// Number of balance publications so far.
    pub fn publications(&self) -> u64 {
        self.reconciler.publications()
    }

    /// Deposit `amount` of the underlying into the vault.
    pub async fn deposit(&self, amount: Decimal) -> ActionReport {
        self.execute(ActionKind::Deposit, self.run_deposit(amount))
            .await
    }

    /// Withdraw `amount` of the underlying from the vault.
    pub async fn withdraw(&self, amount: Decimal) -> ActionReport {
        self.execute(ActionKind::Withdraw, self.run_withdraw(amount))
            .await
    }

    fn tracker(&self, kind: ActionKind) -> &ProgressTracker {
        match kind {
            ActionKind::Withdraw => &self.withdraw_progress,
            ActionKind::Approve | ActionKind::Deposit => &self.deposit_progress,
        }
    }

    fn race(&self) -> Race<'_, W, R> {
        Race {
            writer: &self.writer,
            reader: &self.reader,
            submitter: &self.submitter,
            watcher: &self.watcher,
        }
    }

    /// Run one action to a terminal phase under the in-flight guard.
    async fn execute<F>(&self, kind: ActionKind, flow: F) -> ActionReport
    where
        F: Future<Output = Result<PublishedBalances, Failure>>,
    {
        let Some(_guard) = self.inflight.try_acquire(self.owner, kind) else {
            warn!(owner = %self.owner, %kind, "Action already in progress");
            self.metrics.record_action_busy(kind);
            return ActionReport::Busy;
        };

        let progress = self.tracker(kind);
        progress.begin();
        self.metrics.record_action_started(kind);
        let started = Instant::now();

        let _slot = match self.write_slot.try_lock() {
            Ok(slot) => slot,
            Err(_) => {
                info!(%kind, "Waiting for the other action to finish");
                progress.note("Waiting for the other action to finish...");
                self.write_slot.lock().await
            }
        };

        match flow.await {
            Ok(published) => {
                progress.advance(Phase::Success, format!("{} successful!", title(kind)));
                self.metrics.record_action_success(kind, started.elapsed());
                info!(
                    %kind,
                    underlying = %published.snapshot.underlying_balance,
                    vault = %published.snapshot.vault_balance,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Action succeeded"
                );
                ActionReport::Success(published)
            }
            Err(failure) => {
                progress.fail(&failure);
                self.metrics
                    .record_action_failure(kind, failure.category, started.elapsed());
                warn!(%kind, category = %failure.category, message = %failure.message, "Action failed");
                ActionReport::Failed(failure)
            }
        }
    }

    async fn run_deposit(&self, amount: Decimal) -> Result<PublishedBalances, Failure> {
        let progress = &self.deposit_progress;
        let action = self.prepare(ActionKind::Deposit, amount)?;
        self.ensure_gas().await?;
        let baseline = self.baseline().await?;

        let race = self.race();
        let status = self
            .gate
            .ensure(
                &race,
                self.owner,
                self.network.vault,
                action.base_units,
                progress,
            )
            .await?;
        if let AllowanceStatus::ApprovalSubmitted(outcome) = status {
            debug!(?outcome, "Approval settled");
        }

        let plan = DepositPlan::new(self.network.vault, self.owner, action.base_units, baseline);
        progress.advance(Phase::Submitting, "Submitting deposit...");
        self.settle(&race, &plan.call(), &plan.effect(), |s| plan.is_settled(s), progress)
            .await
    }

    async fn run_withdraw(&self, amount: Decimal) -> Result<PublishedBalances, Failure> {
        let progress = &self.withdraw_progress;
        let action = self.prepare(ActionKind::Withdraw, amount)?;
        self.ensure_gas().await?;
        let baseline = self.baseline().await?;

        let max_shares = self
            .shares
            .max_shares(&self.reader, action.base_units)
            .await;
        let plan = WithdrawPlan::new(
            self.network.vault,
            self.owner,
            action.base_units,
            max_shares,
            baseline,
        );

        progress.advance(Phase::Submitting, "Submitting withdrawal...");
        self.settle(
            &self.race(),
            &plan.call(),
            &plan.effect(),
            |s| plan.is_settled(s),
            progress,
        )
        .await
    }

    /// Validate the amount. Runs before any network call.
    fn prepare(&self, kind: ActionKind, amount: Decimal) -> Result<Action, Failure> {
        let action = Action::new(kind, amount, &self.codec, self.owner, self.network.vault)
            .map_err(|e| {
                warn!(%kind, %amount, error = %e, "Rejected amount");
                Failure::new(ErrorCategory::InvalidAmount)
            })?;

        info!(
            action = %action.description(),
            base_units = %action.base_units,
            "Starting action"
        );
        Ok(action)
    }

    /// Fail fast when the owner cannot pay for gas at all.
    async fn ensure_gas(&self) -> Result<(), Failure> {
        let native = self
            .reads
            .run("native balance", || {
                self.reader
                    .query(ChainQuery::NativeBalance { owner: self.owner })
            })
            .await
            .map_err(|e| classify_report(&e))?;

        self.metrics
            .set_native_balance(u128::try_from(native).unwrap_or(u128::MAX) as f64);
        if native == U256::ZERO {
            warn!(owner = %self.owner, "No native balance to pay for gas");
            return Err(Failure::new(ErrorCategory::InsufficientGas));
        }
        Ok(())
    }

    async fn baseline(&self) -> Result<ChainStateSnapshot, Failure> {
        self.reads
            .run("balances", || self.reader.snapshot(self.owner))
            .await
            .map_err(|e| classify_report(&e))
    }

    /// Send `call`, establish its effect, and publish the resulting balances.
    async fn settle<P>(
        &self,
        race: &Race<'_, W, R>,
        call: &VaultCall,
        effect: &ExpectedEffect,
        settled: P,
        progress: &ProgressTracker,
    ) -> Result<PublishedBalances, Failure>
    where
        P: Fn(&ChainStateSnapshot) -> bool,
    {
        let kind = call.kind();

        let detector = match race.run(call, self.owner, effect, progress).await {
            RaceResult::Submitted(SubmissionOutcome::Confirmed { receipt }) => {
                debug!(%kind, ?receipt, "Confirmed by receipt");
                Detector::Receipt
            }
            RaceResult::Detected(_) => Detector::Watcher,
            RaceResult::Submitted(SubmissionOutcome::Failed { error }) => {
                return Err(Failure::from(&error));
            }
            RaceResult::Submitted(SubmissionOutcome::AmbiguousTimeout) => {
                self.metrics.record_ambiguous_timeout(kind);
                progress.advance(
                    Phase::Confirming,
                    "Transaction timed out. Checking if it succeeded on-chain...",
                );
                if race
                    .follow_up(self.owner, effect, self.follow_up_window)
                    .await
                    .is_none()
                {
                    return Err(Failure::new(ErrorCategory::NetworkTimeout));
                }
                Detector::FollowUp
            }
        };
        self.metrics.record_detection(kind, detector);

        progress.advance(
            Phase::Verifying,
            format!("{} confirmed! Updating balances...", title(kind)),
        );

        let verification = self
            .balance_verifier
            .verify(|| self.reader.snapshot(self.owner), settled)
            .await;
        let consistent = verification.is_ok();
        let published = self.reconciler.reconcile(self.owner, verification).await;

        if let Ok(published) = &published {
            self.record_balances(&published.snapshot);
        }
        if !consistent {
            if let Err(e) = &published {
                warn!(%kind, error = %e, "Fallback balance read failed");
            }
            return Err(Failure::new(ErrorCategory::RpcSyncDelay));
        }
        published.map_err(|e| classify_report(&e))
    }

    fn record_balances(&self, snapshot: &ChainStateSnapshot) {
        let underlying = self.codec.decode(snapshot.underlying_balance);
        let vault = self.codec.decode(snapshot.vault_balance);
        if let (Ok(underlying), Ok(vault)) = (underlying, vault) {
            self.metrics.set_balances(
                underlying.to_f64().unwrap_or_default(),
                vault.to_f64().unwrap_or_default(),
            );
        }
    }
}

const fn title(kind: ActionKind) -> &'static str {
    match kind {
        ActionKind::Approve => "Approval",
        ActionKind::Deposit => "Deposit",
        ActionKind::Withdraw => "Withdrawal",
    }
}
