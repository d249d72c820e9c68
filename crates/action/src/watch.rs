//! Poll chain state until a call's effect becomes visible.
//!
//! A wallet can broadcast and mine a transaction while its acknowledgement
//! never reaches us. Polling for the effect makes completion detectable
//! independently of the direct path.

use alloy_primitives::{Address, U256};
use balance::{ChainReader, ChainStateSnapshot};
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// State change a call is expected to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectedEffect {
    /// Vault balance grows above the pre-action read
    Deposit { baseline: ChainStateSnapshot },
    /// Vault balance drops below the pre-action read
    Withdraw { baseline: ChainStateSnapshot },
    /// Allowance to `spender` reaches `required`
    Allowance { spender: Address, required: U256 },
}

/// A read that can satisfy an [`ExpectedEffect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    Balances(ChainStateSnapshot),
    Allowance(U256),
}

impl ExpectedEffect {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Deposit { .. } => "deposit",
            Self::Withdraw { .. } => "withdraw",
            Self::Allowance { .. } => "allowance",
        }
    }

    /// Read the state this effect is judged on.
    pub async fn observe<R: ChainReader>(
        &self,
        reader: &R,
        owner: Address,
    ) -> eyre::Result<Observation> {
        match self {
            Self::Deposit { .. } | Self::Withdraw { .. } => {
                Ok(Observation::Balances(reader.snapshot(owner).await?))
            }
            Self::Allowance { spender, .. } => {
                Ok(Observation::Allowance(reader.allowance(owner, *spender).await?))
            }
        }
    }

    pub fn is_satisfied(&self, observation: &Observation) -> bool {
        match (self, observation) {
            (Self::Deposit { baseline }, Observation::Balances(now)) => {
                now.vault_balance > baseline.vault_balance
            }
            (Self::Withdraw { baseline }, Observation::Balances(now)) => {
                now.vault_balance < baseline.vault_balance
            }
            (Self::Allowance { required, .. }, Observation::Allowance(allowance)) => {
                allowance >= required
            }
            _ => false,
        }
    }
}

/// Polls on a fixed interval until the expected effect is observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationWatcher {
    interval: Duration,
}

impl ConfirmationWatcher {
    pub const fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Resolve with the first observation satisfying `effect`.
    ///
    /// Never resolves if the effect never appears; bound it with a timeout or
    /// race it. Dropping the future stops polling. Read failures are skipped.
    pub async fn watch<R: ChainReader>(
        &self,
        reader: &R,
        owner: Address,
        effect: &ExpectedEffect,
    ) -> Observation {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut poll = 0u32;

        loop {
            ticker.tick().await;
            poll += 1;

            match effect.observe(reader, owner).await {
                Ok(observation) if effect.is_satisfied(&observation) => {
                    info!(effect = effect.name(), poll, "Effect observed on chain");
                    return observation;
                }
                Ok(_) => debug!(effect = effect.name(), poll, "Effect not visible yet"),
                Err(e) => debug!(effect = effect.name(), poll, error = %e, "Watcher read failed"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use balance::ChainQuery;
    use std::{
        future::Future,
        sync::{
            atomic::{AtomicU32, Ordering},
            Arc,
        },
        time::SystemTime,
    };

    fn snapshot(vault_balance: u64) -> ChainStateSnapshot {
        ChainStateSnapshot {
            owner: Address::ZERO,
            underlying_balance: U256::from(1_000),
            vault_balance: U256::from(vault_balance),
            observed_at: SystemTime::UNIX_EPOCH,
        }
    }

    /// Vault balance becomes 10 on the `appears_on`-th read; earlier
    /// reads alternate between failing and returning 0.
    #[derive(Clone)]
    struct DelayedEffect {
        reads: Arc<AtomicU32>,
        appears_on: u32,
    }

    impl ChainReader for DelayedEffect {
        fn query(&self, query: ChainQuery) -> impl Future<Output = eyre::Result<U256>> + Send {
            let read = match query {
                ChainQuery::VaultBalance { .. } => self.reads.fetch_add(1, Ordering::SeqCst) + 1,
                _ => 0,
            };
            let appears_on = self.appears_on;
            async move {
                match (query, read) {
                    (ChainQuery::VaultBalance { .. }, n) if n >= appears_on => Ok(U256::from(10)),
                    (ChainQuery::VaultBalance { .. }, n) if n % 2 == 1 => eyre::bail!("replica down"),
                    (ChainQuery::Allowance { .. }, _) => Ok(U256::from(500)),
                    _ => Ok(U256::ZERO),
                }
            }
        }
    }

    #[test]
    fn test_effect_predicates() {
        let deposit = ExpectedEffect::Deposit {
            baseline: snapshot(5),
        };
        assert!(deposit.is_satisfied(&Observation::Balances(snapshot(6))));
        assert!(!deposit.is_satisfied(&Observation::Balances(snapshot(5))));
        assert!(!deposit.is_satisfied(&Observation::Allowance(U256::MAX)));

        let withdraw = ExpectedEffect::Withdraw {
            baseline: snapshot(5),
        };
        assert!(withdraw.is_satisfied(&Observation::Balances(snapshot(4))));
        assert!(!withdraw.is_satisfied(&Observation::Balances(snapshot(5))));

        let allowance = ExpectedEffect::Allowance {
            spender: Address::ZERO,
            required: U256::from(100),
        };
        assert!(allowance.is_satisfied(&Observation::Allowance(U256::from(100))));
        assert!(!allowance.is_satisfied(&Observation::Allowance(U256::from(99))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_skips_failures_and_stops_on_detection() {
        let reader = DelayedEffect {
            reads: Arc::new(AtomicU32::new(0)),
            appears_on: 4,
        };
        let watcher = ConfirmationWatcher::new(Duration::from_secs(5));
        let effect = ExpectedEffect::Deposit {
            baseline: snapshot(0),
        };
        let start = Instant::now();

        let observation = watcher.watch(&reader, Address::ZERO, &effect).await;

        let Observation::Balances(seen) = observation else {
            panic!("expected balances, got {observation:?}");
        };
        assert_eq!(seen.vault_balance, U256::from(10));
        assert_eq!(start.elapsed(), Duration::from_secs(20));
        assert_eq!(reader.reads.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_allowance() {
        let reader = DelayedEffect {
            reads: Arc::new(AtomicU32::new(0)),
            appears_on: u32::MAX,
        };
        let watcher = ConfirmationWatcher::new(Duration::from_secs(5));
        let effect = ExpectedEffect::Allowance {
            spender: Address::ZERO,
            required: U256::from(500),
        };

        let observation = watcher.watch(&reader, Address::ZERO, &effect).await;
        assert_eq!(observation, Observation::Allowance(U256::from(500)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_never_resolves_without_effect() {
        let reader = DelayedEffect {
            reads: Arc::new(AtomicU32::new(0)),
            appears_on: u32::MAX,
        };
        let watcher = ConfirmationWatcher::new(Duration::from_secs(5));
        let effect = ExpectedEffect::Withdraw {
            baseline: snapshot(0),
        };

        let result = tokio::time::timeout(
            Duration::from_secs(30),
            watcher.watch(&reader, Address::ZERO, &effect),
        )
        .await;
        assert!(result.is_err());
    }
}
