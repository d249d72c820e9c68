//! Aggregate vault deposits, cached for a short TTL.

use crate::{ChainQuery, ChainReader};
use alloy_primitives::U256;
use std::{sync::Mutex, time::Duration};
use tokio::time::Instant;
use tracing::debug;

pub struct TotalDebtCache<R> {
    reader: R,
    ttl: Duration,
    cached: Mutex<Option<(U256, Instant)>>,
}

impl<R> TotalDebtCache<R>
where
    R: ChainReader,
{
    pub const fn new(reader: R, ttl: Duration) -> Self {
        Self {
            reader,
            ttl,
            cached: Mutex::new(None),
        }
    }

    /// `totalDebt()`, served from cache while younger than the TTL.
    ///
    /// Failed reads are returned to the caller and never cached.
    pub async fn get(&self) -> eyre::Result<U256> {
        if let Some(value) = self.fresh() {
            debug!(total_debt = %value, "totalDebt served from cache");
            return Ok(value);
        }

        let value = self.reader.query(ChainQuery::TotalDebt).await?;
        if let Ok(mut cached) = self.cached.lock() {
            *cached = Some((value, Instant::now()));
        }

        Ok(value)
    }

    fn fresh(&self) -> Option<U256> {
        let cached = *self.cached.lock().ok()?;
        cached
            .filter(|(_, at)| at.elapsed() <= self.ttl)
            .map(|(value, _)| value)
    }
}
