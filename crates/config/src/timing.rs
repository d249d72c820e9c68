//! Timeouts, polling intervals and retry budgets.
//!
//! Every field has a default matching what is observed in practice on Base,
//! so a config file only needs to list what it overrides.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// How long the direct submission path may take before it is ambiguous
    pub submission_timeout_secs: u64,
    /// Countdown tick emitted to progress while a submission is pending
    pub countdown_tick_millis: u64,
    /// Interval between confirmation watcher polls
    pub watch_interval_secs: u64,
    /// Watcher polls allowed after an ambiguous timeout before giving up
    pub follow_up_polls: u32,
    /// Allowance reads allowed while waiting for replicas to catch up
    pub allowance_verify_retries: u32,
    /// Delay between allowance verification reads
    pub allowance_verify_delay_millis: u64,
    /// Extra propagation delay after allowance is verified
    pub allowance_settle_millis: u64,
    /// Balance reads allowed while waiting for replicas to catch up
    pub balance_verify_retries: u32,
    /// Delay between balance verification reads
    pub balance_verify_delay_millis: u64,
    /// Buffer applied on top of `previewWithdraw`, in basis points
    pub share_buffer_bps: u32,
    /// How long an aggregate `totalDebt` read stays fresh
    pub total_debt_ttl_secs: u64,
    /// Attempts for baseline reads before they count as failed
    pub read_retry_attempts: usize,
    /// First backoff delay for baseline reads
    pub read_retry_base_millis: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            submission_timeout_secs: 30,
            countdown_tick_millis: 1_000,
            watch_interval_secs: 5,
            follow_up_polls: 6,
            allowance_verify_retries: 8,
            allowance_verify_delay_millis: 3_000,
            allowance_settle_millis: 2_000,
            balance_verify_retries: 5,
            balance_verify_delay_millis: 2_000,
            share_buffer_bps: 100,
            total_debt_ttl_secs: 30,
            read_retry_attempts: 5,
            read_retry_base_millis: 100,
        }
    }
}

impl TimingConfig {
    pub const fn submission_timeout(&self) -> Duration {
        Duration::from_secs(self.submission_timeout_secs)
    }

    pub const fn countdown_tick(&self) -> Duration {
        Duration::from_millis(self.countdown_tick_millis)
    }

    pub const fn watch_interval(&self) -> Duration {
        Duration::from_secs(self.watch_interval_secs)
    }

    /// Window the watcher keeps polling after the direct path timed out.
    pub fn follow_up_window(&self) -> Duration {
        self.watch_interval() * self.follow_up_polls
    }

    pub const fn allowance_verify_delay(&self) -> Duration {
        Duration::from_millis(self.allowance_verify_delay_millis)
    }

    pub const fn allowance_settle(&self) -> Duration {
        Duration::from_millis(self.allowance_settle_millis)
    }

    pub const fn balance_verify_delay(&self) -> Duration {
        Duration::from_millis(self.balance_verify_delay_millis)
    }

    pub const fn total_debt_ttl(&self) -> Duration {
        Duration::from_secs(self.total_debt_ttl_secs)
    }

    pub const fn read_retry_base(&self) -> Duration {
        Duration::from_millis(self.read_retry_base_millis)
    }
}
