//! Approve-then-stake saga.
//!
//! Staking needs two writes: an ERC-20 approval of the staking contract, then
//! the `stake` call that pulls the approved tokens. The second is only valid
//! once the first is mined, so the saga always waits for the approval
//! receipt before broadcasting the stake.
//!
//! ```text
//! Start ──approve──▶ Approved ──stake──▶ Staked
//!   │                   │
//!   ▼                   ▼
//! error (nothing     PartialStake (allowance granted,
//!  changed)           stake not applied)
//! ```

use std::time::Duration;

use alloy::primitives::TxHash;

use crate::blockchain::client::ChainRpc;
use crate::blockchain::transaction::{SubmitOptions, TxSubmitter};
use crate::blockchain::types::{BlockchainError, BlockchainResult, Submission, WaitMode};
use crate::blockchain::units::TokenAmount;
use crate::contracts::abi::{IStakeToken, IStakingValidator};
use crate::contracts::ContractEndpoint;

/// Saga steps, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StakeStep {
    Approve,
    Stake,
}

/// Result of a completed saga.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakeReceipt {
    pub approve_tx: TxHash,
    pub stake: Submission,
}

impl StakeReceipt {
    pub fn stake_tx(&self) -> TxHash {
        self.stake.tx_hash()
    }
}

/// Run the saga.
///
/// `approval_timeout` bounds the approval wait; `wait` applies to the stake
/// transaction itself.
pub async fn stake_tokens<R: ChainRpc>(
    submitter: &TxSubmitter<R>,
    token: &ContractEndpoint,
    staking: &ContractEndpoint,
    amount: TokenAmount,
    approval_timeout: Duration,
    wait: WaitMode,
) -> BlockchainResult<StakeReceipt> {
    tracing::info!(step = ?StakeStep::Approve, amount = %amount, spender = %staking.address, "Approving staking contract");
    let approve = IStakeToken::approveCall {
        spender: staking.address,
        amount: amount.raw(),
    };
    let approval = submitter
        .submit(
            token,
            &approve,
            SubmitOptions::new(WaitMode::Receipt {
                timeout: approval_timeout,
            }),
        )
        .await?;
    let approve_tx = approval.tx_hash();

    tracing::info!(step = ?StakeStep::Stake, amount = %amount, approve_tx = %approve_tx, "Staking tokens");
    let stake = IStakingValidator::stakeCall {
        amount: amount.raw(),
    };
    match submitter.submit(staking, &stake, SubmitOptions::new(wait)).await {
        Ok(stake) => Ok(StakeReceipt { approve_tx, stake }),
        Err(source) => {
            tracing::error!(approve_tx = %approve_tx, error = %source, "Approval granted but stake did not complete");
            Err(BlockchainError::PartialStake {
                approve_tx,
                source: Box::new(source),
            })
        }
    }
}
