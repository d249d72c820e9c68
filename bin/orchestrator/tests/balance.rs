//! Read-only checks against a live Base node.
//!
//! These tests require `tests/test-config.toml` and network access, so they
//! are ignored by default.
//!
//! Run with:
//! ```bash
//! cargo test --package orchestrator --test balance -- --ignored
//! ```


use balance::{AmountCodec, ContractReader, TotalDebtCache};
use config::BASE_CHAIN_ID;
use orchestrator::{check_balances, check_total_debt};
use rust_decimal::Decimal;
use setup::load_test_config;
use std::time::Duration;

#[tokio::test]
#[ignore = "requires a live Base RPC endpoint"]
async fn test_owner_balances_query() {
    let config = load_test_config();
    let network = config.network_config();

    println!("RPC: {}", config.rpc_url);
    println!("Owner: {}", config.owner_address);

    let provider = client::create_provider(&config.rpc_url)
        .await
        .expect("Failed to create provider");
    client::ensure_chain_id(&provider, BASE_CHAIN_ID)
        .await
        .expect("Endpoint is not Base");

    let reader = ContractReader::new(provider, network.usdc, network.vault);
    let codec = AmountCodec::new(network.decimals);

    let report = check_balances(&reader, config.owner_address, &codec)
        .await
        .expect("Failed to query owner balances");

    println!("Underlying: {}", report.underlying);
    println!("Vault: {}", report.vault);
    println!("Native (wei): {}", report.native_wei);

    assert_eq!(report.owner, config.owner_address);
    assert!(report.underlying >= Decimal::ZERO);
    assert!(report.vault >= Decimal::ZERO);
}

#[tokio::test]
#[ignore = "requires a live Base RPC endpoint"]
async fn test_total_debt_query() {
    let config = load_test_config();
    let network = config.network_config();

    let provider = client::create_provider(&config.rpc_url)
        .await
        .expect("Failed to create provider");
    let reader = ContractReader::new(provider, network.usdc, network.vault);
    let cache = TotalDebtCache::new(reader, Duration::from_secs(30));
    let codec = AmountCodec::new(network.decimals);

    let first = check_total_debt(&cache, &codec)
        .await
        .expect("Failed to query total debt");
    let second = check_total_debt(&cache, &codec)
        .await
        .expect("Failed to query total debt");

    println!("Total debt: {first}");
    assert_eq!(first, second, "second read is served from cache");
}
