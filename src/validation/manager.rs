//! Staking validation operations: stake, request and submit validations,
//! claim rewards, and read validator state.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, B256, U256};

use crate::blockchain::client::ChainRpc;
use crate::blockchain::transaction::{SubmitOptions, TxSubmitter};
use crate::blockchain::types::{BlockchainError, BlockchainResult, Submission, WaitMode};
use crate::blockchain::units::TokenAmount;
use crate::contracts::abi::{IStakeToken, IStakingValidator, IValidationRegistry};
use crate::contracts::{read, ContractEndpoint};
use crate::validation::handshake::{digest, tag_digest};
use crate::validation::records::{StakingStats, ValidationStatus, ValidatorInfo};
use crate::validation::staking::{self, StakeReceipt};

/// Highest accepted validation score.
pub const MAX_RESPONSE: u8 = 100;

/// Client for the validation registry, staking validator and stake token.
pub struct ValidationManager<R> {
    rpc: Arc<R>,
    submitter: Arc<TxSubmitter<R>>,
    validation_registry: ContractEndpoint,
    staking_validator: ContractEndpoint,
    stake_token: ContractEndpoint,
    /// Approval wait used by the stake saga when the caller does not wait.
    default_timeout: Duration,
}

impl<R> Clone for ValidationManager<R> {
    fn clone(&self) -> Self {
        Self {
            rpc: self.rpc.clone(),
            submitter: self.submitter.clone(),
            validation_registry: self.validation_registry,
            staking_validator: self.staking_validator,
            stake_token: self.stake_token,
            default_timeout: self.default_timeout,
        }
    }
}

impl<R: ChainRpc> ValidationManager<R> {
    pub fn new(
        rpc: Arc<R>,
        submitter: Arc<TxSubmitter<R>>,
        validation_registry: ContractEndpoint,
        staking_validator: ContractEndpoint,
        stake_token: ContractEndpoint,
        default_timeout: Duration,
    ) -> Self {
        Self {
            rpc,
            submitter,
            validation_registry,
            staking_validator,
            stake_token,
            default_timeout,
        }
    }

    /// Operator address.
    pub fn address(&self) -> Address {
        self.submitter.address()
    }

    pub fn staking_validator(&self) -> &ContractEndpoint {
        &self.staking_validator
    }

    /// Approve and stake `amount` to become a validator.
    pub async fn stake_tokens(&self, amount: TokenAmount, wait: WaitMode) -> BlockchainResult<StakeReceipt> {
        staking::stake_tokens(
            &self.submitter,
            &self.stake_token,
            &self.staking_validator,
            amount,
            wait.timeout().unwrap_or(self.default_timeout),
            wait,
        )
        .await
    }

    /// Start the unbonding period.
    pub async fn request_unstake(&self, wait: WaitMode) -> BlockchainResult<Submission> {
        self.submitter
            .submit(
                &self.staking_validator,
                &IStakingValidator::requestUnstakeCall {},
                SubmitOptions::new(wait),
            )
            .await
    }

    /// Withdraw stake after the unbonding period.
    pub async fn unstake(&self, wait: WaitMode) -> BlockchainResult<Submission> {
        self.submitter
            .submit(
                &self.staking_validator,
                &IStakingValidator::unstakeCall {},
                SubmitOptions::new(wait),
            )
            .await
    }

    /// Ask for validation of `agent_id`.
    ///
    /// The request hash is the digest of `request_data`; callers must vary the
    /// text per logical request. `validator` defaults to the staking contract.
    ///
    /// # Returns
    /// The request hash (the correlation key for the response) and the submission.
    pub async fn create_validation_request(
        &self,
        agent_id: U256,
        request_uri: &str,
        request_data: &str,
        validator: Option<Address>,
        wait: WaitMode,
    ) -> BlockchainResult<(B256, Submission)> {
        let request_hash = digest(request_data);
        let validator = validator.unwrap_or(self.staking_validator.address);

        tracing::info!(
            agent_id = %agent_id,
            request_uri,
            request_hash = %request_hash,
            validator = %validator,
            "Creating validation request"
        );

        let call = IValidationRegistry::validationRequestCall {
            validatorAddress: validator,
            agentId: agent_id,
            requestUri: request_uri.to_string(),
            requestHash: request_hash,
        };
        let submission = self
            .submitter
            .submit(&self.validation_registry, &call, SubmitOptions::new(wait))
            .await?;

        Ok((request_hash, submission))
    }

    /// Submit a validation result as a staked validator.
    ///
    /// `response` is a score in 0-100; anything larger fails before any
    /// network call.
    pub async fn submit_validation(
        &self,
        request_hash: B256,
        response: u8,
        response_uri: &str,
        response_data: &str,
        tag: &str,
        wait: WaitMode,
    ) -> BlockchainResult<Submission> {
        if response > MAX_RESPONSE {
            return Err(BlockchainError::InvalidArgument(format!(
                "response must be between 0 and {}, got {}",
                MAX_RESPONSE, response
            )));
        }

        let call = IStakingValidator::submitValidationCall {
            requestHash: request_hash,
            response,
            responseUri: response_uri.to_string(),
            responseHash: digest(response_data),
            tag: tag_digest(tag),
        };

        tracing::info!(request_hash = %request_hash, response, "Submitting validation result");
        self.submitter
            .submit(&self.staking_validator, &call, SubmitOptions::new(wait))
            .await
    }

    /// Claim accrued rewards.
    pub async fn claim_rewards(&self, wait: WaitMode) -> BlockchainResult<Submission> {
        self.submitter
            .submit(
                &self.staking_validator,
                &IStakingValidator::claimRewardsCall {},
                SubmitOptions::new(wait),
            )
            .await
    }

    /// Mint test stake tokens (faucet on test deployments).
    pub async fn mint_tokens(&self, to: Address, amount: TokenAmount, wait: WaitMode) -> BlockchainResult<Submission> {
        let call = IStakeToken::mintCall {
            to,
            amount: amount.raw(),
        };
        self.submitter
            .submit(&self.stake_token, &call, SubmitOptions::new(wait))
            .await
    }

    pub async fn validation_status(&self, request_hash: B256) -> BlockchainResult<ValidationStatus> {
        let call = IValidationRegistry::getValidationStatusCall {
            requestHash: request_hash,
        };
        read(self.rpc.as_ref(), &self.validation_registry, &call)
            .await
            .map(ValidationStatus::from)
    }

    /// Validator record for `validator`, or for the operator when `None`.
    pub async fn validator_info(&self, validator: Option<Address>) -> BlockchainResult<ValidatorInfo> {
        let call = IStakingValidator::getValidatorInfoCall {
            validator: validator.unwrap_or_else(|| self.address()),
        };
        read(self.rpc.as_ref(), &self.staking_validator, &call)
            .await
            .map(ValidatorInfo::from)
    }

    pub async fn staking_stats(&self) -> BlockchainResult<StakingStats> {
        read(self.rpc.as_ref(), &self.staking_validator, &IStakingValidator::getStatsCall {})
            .await
            .map(StakingStats::from)
    }

    /// Stake token balance of `account`.
    pub async fn token_balance(&self, account: Address) -> BlockchainResult<TokenAmount> {
        read(
            self.rpc.as_ref(),
            &self.stake_token,
            &IStakeToken::balanceOfCall { account },
        )
        .await
        .map(TokenAmount::from_raw)
    }

    /// Native currency balance of `account`.
    pub async fn native_balance(&self, account: Address) -> BlockchainResult<TokenAmount> {
        self.rpc.balance(account).await.map(TokenAmount::from_raw)
    }
}
