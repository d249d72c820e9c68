//! Share cap for withdrawals.

use alloy_primitives::U256;
use balance::{ChainQuery, ChainReader, ReadRetry};
use tracing::{debug, warn};

const BPS_DENOMINATOR: u64 = 10_000;

/// Derives `maxShares` from `previewWithdraw` plus a buffer for share price
/// movement between the estimate and execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShareEstimator {
    buffer_bps: u32,
    reads: ReadRetry,
}

impl ShareEstimator {
    pub const fn new(buffer_bps: u32, reads: ReadRetry) -> Self {
        Self { buffer_bps, reads }
    }

    /// Apply the buffer to a share estimate, rounding up.
    pub fn buffered(&self, shares: U256) -> U256 {
        let numerator = U256::from(BPS_DENOMINATOR + u64::from(self.buffer_bps));
        let denominator = U256::from(BPS_DENOMINATOR);

        shares
            .checked_mul(numerator)
            .and_then(|scaled| scaled.checked_add(denominator - U256::from(1)))
            .map_or(U256::MAX, |scaled| scaled / denominator)
    }

    /// Maximum shares the withdrawal of `assets` may burn.
    ///
    /// Falls back to `U256::MAX` (no cap) when the estimate cannot be read,
    /// leaving the vault's own accounting as the only bound.
    pub async fn max_shares<R: ChainReader>(&self, reader: &R, assets: U256) -> U256 {
        let estimate = self
            .reads
            .run("previewWithdraw", || {
                reader.query(ChainQuery::PreviewWithdraw { assets })
            })
            .await;

        match estimate {
            Ok(shares) => {
                let max_shares = self.buffered(shares);
                debug!(%assets, %shares, %max_shares, buffer_bps = self.buffer_bps, "Share cap estimated");
                max_shares
            }
            Err(e) => {
                warn!(%assets, error = %e, "previewWithdraw unavailable, withdrawing without a share cap");
                U256::MAX
            }
        }
    }
}
