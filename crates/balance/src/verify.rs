//! Bounded re-reads that wait out RPC replica lag.
//!
//! A read issued right after a confirmed write can land on a replica that has
//! not seen the write yet. Nothing derived from such a read is trusted until a
//! predicate over a later read holds.

use std::{future::Future, time::Duration};
use tokio_retry::{
    strategy::{ExponentialBackoff, FixedInterval},
    Retry,
};
use tracing::{debug, warn};

/// Result of [`RetryVerifier::verify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification<T> {
    /// A read satisfied the predicate.
    Ok(T),
    /// Every attempt was used up. `last` is the final read, unless it failed.
    Exhausted { last: Option<T> },
}

impl<T> Verification<T> {
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }
}

enum Attempt<T> {
    Stale(T),
    Failed(eyre::Report),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryVerifier {
    max_retries: u32,
    delay: Duration,
}

impl RetryVerifier {
    pub const fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Read until `predicate` holds, at most `max_retries` times, sleeping
    /// `delay` between attempts. Failed reads count as attempts and are
    /// otherwise ignored.
    pub async fn verify<T, F, Fut, P>(&self, mut read: F, predicate: P) -> Verification<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = eyre::Result<T>>,
        P: Fn(&T) -> bool,
    {
        if self.max_retries == 0 {
            return Verification::Exhausted { last: None };
        }

        let strategy = FixedInterval::new(self.delay).take(self.max_retries as usize - 1);
        let predicate = &predicate;
        let max_retries = self.max_retries;
        let mut attempt = 0u32;

        let result = Retry::spawn(strategy, || {
            attempt += 1;
            let current = attempt;
            let read = read();
            async move {
                match read.await {
                    Ok(value) if predicate(&value) => {
                        debug!(attempt = current, max_retries, "Read is consistent");
                        Ok(value)
                    }
                    Ok(value) => {
                        debug!(attempt = current, max_retries, "Read is stale, waiting for sync");
                        Err(Attempt::Stale(value))
                    }
                    Err(e) => {
                        debug!(attempt = current, max_retries, error = %e, "Read failed, will retry");
                        Err(Attempt::Failed(e))
                    }
                }
            }
        })
        .await;

        match result {
            Ok(value) => Verification::Ok(value),
            Err(attempt) => {
                warn!(max_retries, "Consistency check exhausted its retry budget");
                let last = match attempt {
                    Attempt::Stale(value) => Some(value),
                    Attempt::Failed(_) => None,
                };
                Verification::Exhausted { last }
            }
        }
    }
}

/// Exponential backoff for plain reads whose failure is transient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRetry {
    attempts: usize,
    base: Duration,
}

impl ReadRetry {
    pub const fn new(attempts: usize, base: Duration) -> Self {
        Self { attempts, base }
    }

    /// Run `read` until it succeeds, doubling the delay from `base` each time.
    pub async fn run<T, F, Fut>(&self, what: &'static str, mut read: F) -> eyre::Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = eyre::Result<T>>,
    {
        // 2^n * base/2 yields base, 2*base, 4*base, ...
        let half_base = (self.base.as_millis() as u64 / 2).max(1);
        let strategy = ExponentialBackoff::from_millis(2)
            .factor(half_base)
            .take(self.attempts.saturating_sub(1));

        Retry::spawn(strategy, || {
            let read = read();
            async move {
                read.await.map_err(|e| {
                    warn!(read = what, error = %e, "Read failed, will retry");
                    e
                })
            }
        })
        .await
    }
}
