pub mod config;
pub mod flow;
pub mod inflight;
pub mod metrics;

pub use flow::{ActionOrchestrator, ActionReport};

use alloy_primitives::{Address, U256};
use balance::{AmountCodec, ChainQuery, ChainReader, TotalDebtCache};
use rust_decimal::Decimal;

/// Balances of one owner in token units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceReport {
    pub owner: Address,
    pub underlying: Decimal,
    pub vault: Decimal,
    pub native_wei: U256,
}

pub async fn check_balances<R>(
    reader: &R,
    owner: Address,
    codec: &AmountCodec,
) -> eyre::Result<BalanceReport>
where
    R: ChainReader,
{
    let snapshot = reader.snapshot(owner).await?;
    let native_wei = reader.query(ChainQuery::NativeBalance { owner }).await?;

    Ok(BalanceReport {
        owner,
        underlying: codec.decode(snapshot.underlying_balance)?,
        vault: codec.decode(snapshot.vault_balance)?,
        native_wei,
    })
}

/// Aggregate vault deposits in token units.
pub async fn check_total_debt<R>(
    cache: &TotalDebtCache<R>,
    codec: &AmountCodec,
) -> eyre::Result<Decimal>
where
    R: ChainReader,
{
    Ok(codec.decode(cache.get().await?)?)
}

/// Install the global subscriber. `RUST_LOG` overrides the `info` default.
pub fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
