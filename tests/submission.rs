//! Transaction submission against a simulated chain.

use std::sync::Arc;
use std::time::Duration;

use alloy::sol_types::SolCall;
use erc8004_validator::blockchain::{
    BlockchainError, Submission, SubmitOptions, TxSubmitter, WaitMode, Wallet,
};
use erc8004_validator::config::FeeConfig;
use erc8004_validator::contracts::abi::{IStakeToken, IStakingValidator};
use erc8004_validator::contracts::{ContractEndpoint, ContractKind};

mod common;
use common::{Event, MockChain, CHAIN_ID, STAKE_TOKEN, STAKING_VALIDATOR, TEST_ADDRESS, TEST_PRIVATE_KEY};

fn submitter(rpc: &Arc<MockChain>) -> TxSubmitter<MockChain> {
    let wallet = Wallet::from_private_key(TEST_PRIVATE_KEY, CHAIN_ID).unwrap();
    TxSubmitter::new(rpc.clone(), wallet, FeeConfig::default(), Duration::from_millis(10))
}

fn staking() -> ContractEndpoint {
    ContractEndpoint::new(ContractKind::StakingValidator, STAKING_VALIDATOR)
}

#[tokio::test]
async fn test_submitter_address_matches_key() {
    let rpc = MockChain::shared();
    assert_eq!(submitter(&rpc).address(), TEST_ADDRESS);
}

#[tokio::test]
async fn test_fire_and_forget_returns_without_polling() {
    let rpc = MockChain::shared();
    rpc.set_mining(false);
    let submitter = submitter(&rpc);

    let submission = submitter
        .submit(&staking(), &IStakingValidator::claimRewardsCall {}, WaitMode::FireAndForget.into())
        .await
        .unwrap();

    assert!(matches!(submission, Submission::Broadcast { .. }));
    assert!(submission.outcome().is_none());
    assert_eq!(rpc.receipt_polls(), 0);
    assert_eq!(rpc.sent_selectors(), vec![IStakingValidator::claimRewardsCall::SELECTOR]);
}

#[tokio::test]
async fn test_confirmed_submission_carries_outcome() {
    let rpc = MockChain::shared();
    let submitter = submitter(&rpc);

    let submission = submitter
        .submit(&staking(), &IStakingValidator::claimRewardsCall {}, WaitMode::receipt_secs(5).into())
        .await
        .unwrap();

    let outcome = submission.outcome().expect("confirmed");
    assert!(outcome.success);
    assert_eq!(outcome.tx_hash, submission.tx_hash());
    assert!(outcome.block_number.is_some());
}

#[tokio::test]
async fn test_default_and_overridden_gas_limit() {
    let rpc = MockChain::shared();
    let submitter = submitter(&rpc);

    let first = submitter
        .submit(&staking(), &IStakingValidator::claimRewardsCall {}, WaitMode::FireAndForget.into())
        .await
        .unwrap();
    let second = submitter
        .submit(
            &staking(),
            &IStakingValidator::claimRewardsCall {},
            SubmitOptions::new(WaitMode::FireAndForget).with_gas_limit(90_000),
        )
        .await
        .unwrap();

    assert_eq!(rpc.sent_tx(first.tx_hash()).unwrap().gas_limit, 250_000);
    assert_eq!(rpc.sent_tx(second.tx_hash()).unwrap().gas_limit, 90_000);
}

#[tokio::test]
async fn test_back_to_back_submissions_use_distinct_nonces() {
    let rpc = MockChain::shared();
    // Node keeps reporting the pre-broadcast count.
    rpc.with(|s| s.frozen_nonce = Some(7));
    let submitter = submitter(&rpc);

    let mut nonces = Vec::new();
    for _ in 0..3 {
        let submission = submitter
            .submit(&staking(), &IStakingValidator::claimRewardsCall {}, WaitMode::FireAndForget.into())
            .await
            .unwrap();
        nonces.push(rpc.sent_tx(submission.tx_hash()).unwrap().nonce);
    }

    assert_eq!(nonces, vec![7, 8, 9]);
}

#[tokio::test]
async fn test_concurrent_submissions_never_share_a_nonce() {
    let rpc = MockChain::shared();
    rpc.with(|s| s.frozen_nonce = Some(0));
    let submitter = Arc::new(submitter(&rpc));

    let mut handles = Vec::new();
    for _ in 0..5 {
        let submitter = submitter.clone();
        handles.push(tokio::spawn(async move {
            submitter
                .submit(&staking(), &IStakingValidator::claimRewardsCall {}, WaitMode::FireAndForget.into())
                .await
                .unwrap()
                .tx_hash()
        }));
    }

    let mut nonces = Vec::new();
    for handle in handles {
        let tx_hash = handle.await.unwrap();
        nonces.push(rpc.sent_tx(tx_hash).unwrap().nonce);
    }
    nonces.sort_unstable();
    assert_eq!(nonces, vec![0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn test_chain_count_ahead_of_local_wins() {
    let rpc = MockChain::shared();
    let submitter = submitter(&rpc);

    submitter
        .submit(&staking(), &IStakingValidator::claimRewardsCall {}, WaitMode::FireAndForget.into())
        .await
        .unwrap();
    // Another client used the account meanwhile.
    rpc.with(|s| s.nonce = 12);
    let submission = submitter
        .submit(&staking(), &IStakingValidator::claimRewardsCall {}, WaitMode::FireAndForget.into())
        .await
        .unwrap();

    assert_eq!(rpc.sent_tx(submission.tx_hash()).unwrap().nonce, 12);
}

#[tokio::test]
async fn test_rejected_broadcast_does_not_consume_nonce() {
    let rpc = MockChain::shared();
    rpc.with(|s| s.frozen_nonce = Some(3));
    rpc.reject::<IStakingValidator::unstakeCall>();
    let submitter = submitter(&rpc);

    let err = submitter
        .submit(&staking(), &IStakingValidator::unstakeCall {}, WaitMode::FireAndForget.into())
        .await
        .unwrap_err();
    assert!(matches!(err, BlockchainError::BroadcastFailed { method: "unstake()", .. }), "{err}");

    let submission = submitter
        .submit(&staking(), &IStakingValidator::claimRewardsCall {}, WaitMode::FireAndForget.into())
        .await
        .unwrap();
    assert_eq!(rpc.sent_tx(submission.tx_hash()).unwrap().nonce, 3);
}

#[tokio::test]
async fn test_reverted_receipt_is_execution_failure() {
    let rpc = MockChain::shared();
    rpc.revert::<IStakingValidator::claimRewardsCall>();
    let submitter = submitter(&rpc);

    let err = submitter
        .submit(&staking(), &IStakingValidator::claimRewardsCall {}, WaitMode::receipt_secs(5).into())
        .await
        .unwrap_err();

    match err {
        BlockchainError::ContractExecutionFailed {
            method,
            gas_used,
            block_number,
            ..
        } => {
            assert_eq!(method, "claimRewards()");
            assert_eq!(gas_used, 21_000);
            assert!(block_number.is_some());
        }
        other => panic!("expected execution failure, got {other}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_receipt_wait_times_out_at_deadline() {
    let rpc = MockChain::shared();
    rpc.set_mining(false);
    let submitter = submitter(&rpc);

    let started = tokio::time::Instant::now();
    let err = submitter
        .submit(&staking(), &IStakingValidator::claimRewardsCall {}, WaitMode::receipt_secs(30).into())
        .await
        .unwrap_err();
    let elapsed = started.elapsed();

    match err {
        BlockchainError::Timeout { method, timeout_secs, .. } => {
            assert_eq!(method, "claimRewards()");
            assert_eq!(timeout_secs, 30);
        }
        other => panic!("expected timeout, got {other}"),
    }
    assert!(elapsed >= Duration::from_secs(30));
    assert!(elapsed < Duration::from_secs(31));
    assert!(rpc.receipt_polls() > 1);
}

#[tokio::test]
async fn test_read_method_cannot_be_submitted() {
    let rpc = MockChain::shared();
    let submitter = submitter(&rpc);

    let err = submitter
        .submit(&staking(), &IStakingValidator::getStatsCall {}, WaitMode::FireAndForget.into())
        .await
        .unwrap_err();

    assert!(matches!(err, BlockchainError::InvalidArgument(_)));
    assert!(rpc.journal().is_empty());
}

#[tokio::test]
async fn test_method_rejected_for_other_contract() {
    let rpc = MockChain::shared();
    let submitter = submitter(&rpc);
    let token = ContractEndpoint::new(ContractKind::StakeToken, STAKE_TOKEN);

    let err = submitter
        .submit(&token, &IStakingValidator::claimRewardsCall {}, WaitMode::FireAndForget.into())
        .await
        .unwrap_err();
    assert!(matches!(err, BlockchainError::InvalidArgument(_)));

    let ok = submitter
        .submit(
            &token,
            &IStakeToken::mintCall {
                to: TEST_ADDRESS,
                amount: common::tokens(1),
            },
            WaitMode::FireAndForget.into(),
        )
        .await
        .unwrap();
    let sent = rpc.sent_tx(ok.tx_hash()).unwrap();
    assert_eq!(sent.to, STAKE_TOKEN);
    assert_eq!(
        rpc.journal().first(),
        Some(&Event::Sent {
            selector: IStakeToken::mintCall::SELECTOR,
            to: STAKE_TOKEN,
            nonce: 0,
            gas_limit: 100_000,
            tx_hash: ok.tx_hash(),
        })
    );
}
