//! Single publisher of externally-visible balances.
//!
//! Every balance a caller sees goes through [`BalanceReconciler::reconcile`],
//! which only accepts the output of a [`RetryVerifier`](crate::RetryVerifier)
//! run. Two paths can never race to show different numbers.

use crate::{ChainReader, ChainStateSnapshot, Verification};
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::{info, warn};

/// Balances as published to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedBalances {
    pub snapshot: ChainStateSnapshot,
    /// False when the consistency check was exhausted and this is the
    /// best-known (possibly stale) read.
    pub consistent: bool,
}

pub struct BalanceReconciler<R> {
    reader: R,
    published: watch::Sender<Option<PublishedBalances>>,
    publications: AtomicU64,
}

impl<R> BalanceReconciler<R>
where
    R: ChainReader,
{
    pub fn new(reader: R) -> Self {
        let (published, _) = watch::channel(None);
        Self {
            reader,
            published,
            publications: AtomicU64::new(0),
        }
    }

    /// Receive every publication.
    pub fn subscribe(&self) -> watch::Receiver<Option<PublishedBalances>> {
        self.published.subscribe()
    }

    /// Most recent publication, if any.
    pub fn latest(&self) -> Option<PublishedBalances> {
        self.published.borrow().clone()
    }

    /// Number of publications so far.
    pub fn publications(&self) -> u64 {
        self.publications.load(Ordering::SeqCst)
    }

    /// Publish the balances of `owner` following a consistency check.
    ///
    /// A verified read is published as is. After exhaustion one
    /// unconditional re-read of both balances is published as stale, so
    /// callers still see the best-known values.
    pub async fn reconcile(
        &self,
        owner: Address,
        verification: Verification<ChainStateSnapshot>,
    ) -> eyre::Result<PublishedBalances> {
        let published = match verification {
            Verification::Ok(snapshot) => PublishedBalances {
                snapshot,
                consistent: true,
            },
            Verification::Exhausted { .. } => {
                warn!(owner = %owner, "Publishing best-known balances after sync timeout");
                let snapshot = self.reader.snapshot(owner).await?;
                PublishedBalances {
                    snapshot,
                    consistent: false,
                }
            }
        };

        info!(
            owner = %owner,
            underlying = %published.snapshot.underlying_balance,
            vault = %published.snapshot.vault_balance,
            consistent = published.consistent,
            "Balances reconciled"
        );

        self.publications.fetch_add(1, Ordering::SeqCst);
        self.published.send_replace(Some(published.clone()));

        Ok(published)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChainQuery;
    use alloy_primitives::U256;
    use std::time::SystemTime;

    struct FixedReader;

    impl ChainReader for FixedReader {
        async fn query(&self, query: ChainQuery) -> eyre::Result<U256> {
            match query {
                ChainQuery::UnderlyingBalance { .. } => Ok(U256::from(7)),
                ChainQuery::VaultBalance { .. } => Ok(U256::from(3)),
                _ => eyre::bail!("unexpected query {query:?}"),
            }
        }
    }

    fn snapshot(underlying: u64, vault: u64) -> ChainStateSnapshot {
        ChainStateSnapshot {
            owner: Address::ZERO,
            underlying_balance: U256::from(underlying),
            vault_balance: U256::from(vault),
            observed_at: SystemTime::now(),
        }
    }

    #[tokio::test]
    async fn test_verified_snapshot_is_published_without_rereading() {
        let reconciler = BalanceReconciler::new(FixedReader);
        let mut rx = reconciler.subscribe();

        let published = reconciler
            .reconcile(Address::ZERO, Verification::Ok(snapshot(1, 2)))
            .await
            .unwrap();

        assert!(published.consistent);
        assert_eq!(published.snapshot.underlying_balance, U256::from(1));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().clone(), Some(published));
        assert_eq!(reconciler.publications(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_publishes_final_read_as_stale() {
        let reconciler = BalanceReconciler::new(FixedReader);

        let published = reconciler
            .reconcile(
                Address::ZERO,
                Verification::Exhausted {
                    last: Some(snapshot(100, 0)),
                },
            )
            .await
            .unwrap();

        assert!(!published.consistent);
        assert_eq!(published.snapshot.underlying_balance, U256::from(7));
        assert_eq!(published.snapshot.vault_balance, U256::from(3));
        assert_eq!(reconciler.latest(), Some(published));
    }
}
