//! Withdraw flow against the in-memory chain.
//!
//! Run with:
//! ```bash
//! cargo test --package orchestrator --test withdraw
//! ```


use action::{ActionKind, ErrorCategory, Phase, VaultCall};
use alloy_primitives::U256;
use orchestrator::ActionReport;
use rust_decimal::Decimal;
use setup::{orchestrator, record_phases, usdc, Behavior, MockChain, USDC};
use std::time::Duration;

fn max_shares_sent(chain: &MockChain) -> U256 {
    match chain.sent().as_slice() {
        [VaultCall::Withdraw { max_shares, .. }] => *max_shares,
        other => panic!("expected a single withdraw, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_withdraw() {
    let chain = MockChain::funded(0, 5 * USDC);
    let orchestrator = orchestrator(&chain);
    let phases = record_phases(orchestrator.progress(ActionKind::Withdraw));

    let report = orchestrator.withdraw(Decimal::from(2)).await;

    let ActionReport::Success(published) = report else {
        panic!("expected success, got {report:?}");
    };
    assert_eq!(published.snapshot.underlying_balance, usdc(2));
    assert_eq!(published.snapshot.vault_balance, usdc(3));

    // previewWithdraw plus 1%
    assert_eq!(max_shares_sent(&chain), U256::from(2_020_000));

    let phases = phases.await.unwrap();
    assert!(!phases.contains(&Phase::Approving));
    assert_eq!(phases.last(), Some(&Phase::Success));
}

#[tokio::test(start_paused = true)]
async fn test_withdraw_more_than_deposited_reverts() {
    let chain = MockChain::funded(10 * USDC, 3 * USDC);
    let orchestrator = orchestrator(&chain);

    let report = orchestrator.withdraw(Decimal::from(5)).await;

    let failure = report.failure().expect("withdraw should fail");
    assert_eq!(failure.category, ErrorCategory::ContractReverted);
    assert!(failure.message.contains("withdraw more than max"));

    let state = orchestrator.progress(ActionKind::Withdraw).borrow().clone();
    assert_eq!(state.phase, Phase::Error);
    assert_eq!(state.error, Some(ErrorCategory::ContractReverted));
    assert_eq!(chain.ledger().vault, usdc(3));
    assert_eq!(orchestrator.publications(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_withdraw_without_preview_is_uncapped() {
    let chain = MockChain::funded(0, 5 * USDC).without_preview();
    let orchestrator = orchestrator(&chain);

    let report = orchestrator.withdraw(Decimal::ONE).await;

    assert!(report.is_success(), "{report:?}");
    assert_eq!(max_shares_sent(&chain), U256::MAX);
}

#[tokio::test(start_paused = true)]
async fn test_withdraw_detected_by_watcher() {
    let chain = MockChain::funded(0, 5 * USDC).with_behavior(
        ActionKind::Withdraw,
        Behavior::StallReceipt {
            lands_after: Some(Duration::from_secs(3)),
        },
    );
    let orchestrator = orchestrator(&chain);

    let report = orchestrator.withdraw(Decimal::ONE).await;

    assert!(report.is_success(), "{report:?}");
    assert_eq!(chain.ledger().underlying, usdc(1));
}

#[tokio::test(start_paused = true)]
async fn test_deposit_and_withdraw_take_turns() {
    let chain = MockChain::funded(10 * USDC, 5 * USDC).with_allowance(10 * USDC);
    let orchestrator = orchestrator(&chain);

    let (deposit, withdraw) = tokio::join!(
        orchestrator.deposit(Decimal::ONE),
        orchestrator.withdraw(Decimal::ONE)
    );

    let ActionReport::Success(after_deposit) = deposit else {
        panic!("expected deposit success, got {deposit:?}");
    };
    let ActionReport::Success(after_withdraw) = withdraw else {
        panic!("expected withdraw success, got {withdraw:?}");
    };

    // The deposit got the write slot first.
    assert_eq!(after_deposit.snapshot.underlying_balance, usdc(9));
    assert_eq!(after_deposit.snapshot.vault_balance, usdc(6));
    assert_eq!(after_withdraw.snapshot.underlying_balance, usdc(10));
    assert_eq!(after_withdraw.snapshot.vault_balance, usdc(5));
    assert_eq!(
        chain.sent_kinds(),
        vec![ActionKind::Deposit, ActionKind::Withdraw]
    );
    assert_eq!(orchestrator.publications(), 2);
}
