//! Read projections of staking and validation contract state.

use alloy::primitives::{Address, B256, U256};
use serde::Serialize;

use crate::blockchain::units::{serialize_decimal, TokenAmount};
use crate::contracts::abi::{IStakingValidator, IValidationRegistry};

/// A validator's position on the staking contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatorInfo {
    pub staked: TokenAmount,
    pub active: bool,
    pub pending_rewards: TokenAmount,
    #[serde(serialize_with = "serialize_decimal")]
    pub validation_count: U256,
}

impl From<IStakingValidator::getValidatorInfoReturn> for ValidatorInfo {
    fn from(ret: IStakingValidator::getValidatorInfoReturn) -> Self {
        Self {
            staked: TokenAmount::from_raw(ret.stake),
            active: ret.active,
            pending_rewards: TokenAmount::from_raw(ret.rewards),
            validation_count: ret.validations,
        }
    }
}

/// Contract-wide totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StakingStats {
    pub total_staked: TokenAmount,
    pub total_rewards: TokenAmount,
    pub total_slashed: TokenAmount,
}

impl From<IStakingValidator::getStatsReturn> for StakingStats {
    fn from(ret: IStakingValidator::getStatsReturn) -> Self {
        Self {
            total_staked: TokenAmount::from_raw(ret._totalStaked),
            total_rewards: TokenAmount::from_raw(ret._totalRewards),
            total_slashed: TokenAmount::from_raw(ret._totalSlashed),
        }
    }
}

/// Stored state of one validation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationStatus {
    pub validator: Address,
    #[serde(serialize_with = "serialize_decimal")]
    pub agent_id: U256,
    pub response: u8,
    pub response_hash: B256,
    pub tag: B256,
    #[serde(serialize_with = "serialize_decimal")]
    pub last_update: U256,
}

impl From<IValidationRegistry::getValidationStatusReturn> for ValidationStatus {
    fn from(ret: IValidationRegistry::getValidationStatusReturn) -> Self {
        Self {
            validator: ret.validatorAddress,
            agent_id: ret.agentId,
            response: ret.response,
            response_hash: ret.responseHash,
            tag: ret.tag,
            last_update: ret.lastUpdate,
        }
    }
}
