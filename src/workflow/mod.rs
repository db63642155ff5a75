//! End-to-end validation run.
//!
//! # Stages
//! ```text
//! 1 environment   balances, mint stake tokens when short
//! 2 register      register the operator as an agent (or reuse a configured ID)
//! 3 stake         approve + stake
//! 4 request       validation request for the agent
//! 5 submit        validation result as the staked validator
//! 6 claim         claim pending rewards (skipped when none)
//! 7 statistics    validator record, global totals, agent verification
//! ```
//!
//! Every write waits for its receipt. The first failing stage ends the run;
//! the report is written either way.

pub mod report;

use std::path::PathBuf;
use std::time::Duration;

use alloy::primitives::{TxHash, B256, U256};
use serde_json::{json, Value};
use thiserror::Error;

use crate::blockchain::client::ChainRpc;
use crate::blockchain::types::{BlockchainError, WaitMode};
use crate::blockchain::units::TokenAmount;
use crate::config::{ConfigError, WorkflowConfig};
use crate::identity::MetadataItem;
use crate::session::ProtocolClient;
use crate::validation::RequestData;

pub use report::{RunReport, StageReport, StageStatus, TransactionRecord};

pub const STAGE_ENVIRONMENT: &str = "stage1_environment";
pub const STAGE_REGISTER: &str = "stage2_register_agent";
pub const STAGE_STAKE: &str = "stage3_stake";
pub const STAGE_REQUEST: &str = "stage4_create_request";
pub const STAGE_SUBMIT: &str = "stage5_submit_validation";
pub const STAGE_CLAIM: &str = "stage6_claim_rewards";
pub const STAGE_STATISTICS: &str = "stage7_statistics";

/// Metadata attached to agents this workflow registers.
pub const AGENT_METADATA: [(&str, &str); 3] = [
    ("agentType", "validator"),
    ("createdBy", "aliasai-validator"),
    ("version", "1.0"),
];

/// Errors that end a workflow run.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{stage} failed: {source}")]
    Chain {
        stage: &'static str,
        #[source]
        source: BlockchainError,
    },

    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("Failed to write report {path}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn at(stage: &'static str) -> impl Fn(BlockchainError) -> WorkflowError {
    move |source| WorkflowError::Chain { stage, source }
}

/// Runs the seven stages against one [`ProtocolClient`].
pub struct ValidationWorkflow<R> {
    client: ProtocolClient<R>,
    settings: WorkflowConfig,
    report: RunReport,
    agent_id: Option<U256>,
}

impl<R: ChainRpc> ValidationWorkflow<R> {
    pub fn new(client: ProtocolClient<R>, settings: WorkflowConfig) -> Self {
        let agent_id = settings.default_agent_id.map(U256::from);
        Self {
            client,
            settings,
            report: RunReport::new(),
            agent_id,
        }
    }

    pub fn report(&self) -> &RunReport {
        &self.report
    }

    /// Run all stages and write the report.
    ///
    /// # Returns
    /// The report when every stage succeeded. On failure the report has
    /// still been written and the error names the failing stage.
    pub async fn run(mut self) -> Result<RunReport, WorkflowError> {
        tracing::info!(
            run_id = %self.report.run_id,
            agent_id = ?self.agent_id,
            stake_amount = self.settings.stake_amount_tokens,
            response_score = self.settings.response_score,
            "Starting validation workflow"
        );

        let outcome = self.run_stages().await;

        let path = PathBuf::from(&self.settings.report_path);
        let saved = self
            .report
            .save(&path)
            .map_err(|source| WorkflowError::Report { path, source });

        match outcome {
            Ok(()) => {
                saved?;
                tracing::info!(run_id = %self.report.run_id, "Validation workflow completed");
                Ok(self.report)
            }
            Err(e) => {
                if let Err(report_error) = saved {
                    tracing::error!(error = %report_error, "Report not written");
                }
                tracing::error!(run_id = %self.report.run_id, error = %e, "Validation workflow failed");
                Err(e)
            }
        }
    }

    async fn run_stages(&mut self) -> Result<(), WorkflowError> {
        let result = self.environment_check().await;
        self.finish(STAGE_ENVIRONMENT, result)?;
        self.pause().await;

        let result = self.register_agent().await;
        let agent_id = self.finish(STAGE_REGISTER, result)?;
        self.pause().await;

        let result = self.stake().await;
        self.finish(STAGE_STAKE, result)?;
        self.pause().await;

        let result = self.create_request(agent_id).await;
        let request_hash = self.finish(STAGE_REQUEST, result)?;
        self.pause().await;

        let result = self.submit_validation(request_hash).await;
        self.finish(STAGE_SUBMIT, result)?;
        self.pause().await;

        let result = self.claim_rewards().await;
        self.finish(STAGE_CLAIM, result)?;

        let result = self.statistics().await;
        self.finish(STAGE_STATISTICS, result)
    }

    /// Record a stage failure in the report.
    fn finish<T>(&mut self, stage: &'static str, result: Result<T, WorkflowError>) -> Result<T, WorkflowError> {
        if let Err(e) = &result {
            tracing::error!(stage, error = %e, "Stage failed");
            self.report.record_stage(stage, StageReport::failed(&e.to_string()));
        }
        result
    }

    async fn pause(&self) {
        if self.settings.stage_delay_secs > 0 {
            tracing::debug!(secs = self.settings.stage_delay_secs, "Waiting before next stage");
            tokio::time::sleep(Duration::from_secs(self.settings.stage_delay_secs)).await;
        }
    }

    fn wait(&self) -> WaitMode {
        WaitMode::receipt_secs(self.settings.receipt_timeout_secs)
    }

    fn record_tx(&mut self, name: &str, tx_hash: TxHash) {
        let record = self
            .report
            .record_transaction(name, tx_hash, &self.settings.explorer_tx_url);
        tracing::info!(name, tx_hash = %record.tx_hash, explorer_url = %record.explorer_url, "Transaction recorded");
    }

    async fn environment_check(&mut self) -> Result<(), WorkflowError> {
        let stage = STAGE_ENVIRONMENT;
        let validation = self.client.validation().clone();
        let account = self.client.address();

        let native = validation.native_balance(account).await.map_err(at(stage))?;
        if native.is_zero() {
            return Err(WorkflowError::InsufficientFunds(format!(
                "{} has no native balance to pay gas",
                account
            )));
        }

        let required = TokenAmount::from_tokens(self.settings.stake_amount_tokens);
        let mut token_balance = validation.token_balance(account).await.map_err(at(stage))?;
        let mut minted = None;
        if token_balance < required {
            let amount = TokenAmount::from_tokens(self.settings.mint_amount_tokens);
            tracing::warn!(balance = %token_balance, required = %required, mint = %amount, "Stake token balance short, minting");
            let submission = validation
                .mint_tokens(account, amount, self.wait())
                .await
                .map_err(at(stage))?;
            self.record_tx("Mint stake tokens", submission.tx_hash());
            token_balance = validation.token_balance(account).await.map_err(at(stage))?;
            minted = Some(amount);
        }

        tracing::info!(account = %account, native = %native, stake_token = %token_balance, "Environment ready");
        self.report.record_stage(
            stage,
            StageReport::success(json!({
                "account": account,
                "native_balance": native,
                "token_balance": token_balance,
                "minted": minted,
            })),
        );
        Ok(())
    }

    async fn register_agent(&mut self) -> Result<U256, WorkflowError> {
        let stage = STAGE_REGISTER;
        if let Some(agent_id) = self.agent_id {
            tracing::info!(agent_id = %agent_id, "Using configured agent ID, skipping registration");
            self.report.record_stage(
                stage,
                StageReport::skipped("Using pre-configured agent ID", json!({ "agent_id": agent_id.to_string() })),
            );
            return Ok(agent_id);
        }

        let owner = self.client.address();
        let token_uri = format!("{}/{}.json", self.settings.agent_uri_base.trim_end_matches('/'), owner);
        let metadata: Vec<MetadataItem> = AGENT_METADATA
            .iter()
            .map(|(key, value)| MetadataItem::text(*key, value))
            .collect();

        let registration = self
            .client
            .identity()
            .register_agent(&token_uri, &metadata, self.wait())
            .await
            .map_err(at(stage))?;
        self.record_tx("Register agent", registration.tx_hash);

        let agent_id = registration.agent_id.ok_or_else(|| {
            at(stage)(BlockchainError::EventNotFound {
                event: "Registered",
                tx_hash: registration.tx_hash,
            })
        })?;
        self.agent_id = Some(agent_id);

        self.report.record_stage(
            stage,
            StageReport::success(json!({
                "agent_id": agent_id.to_string(),
                "tx_hash": registration.tx_hash,
                "token_uri": token_uri,
                "owner": owner,
            })),
        );
        Ok(agent_id)
    }

    async fn stake(&mut self) -> Result<(), WorkflowError> {
        let stage = STAGE_STAKE;
        let validation = self.client.validation().clone();
        let amount = TokenAmount::from_tokens(self.settings.stake_amount_tokens);

        let receipt = match validation.stake_tokens(amount, self.wait()).await {
            Ok(receipt) => receipt,
            Err(e) => {
                if let BlockchainError::PartialStake { approve_tx, .. } = &e {
                    self.record_tx("Approve stake token", *approve_tx);
                }
                return Err(at(stage)(e));
            }
        };
        self.record_tx("Approve stake token", receipt.approve_tx);
        self.record_tx("Stake tokens", receipt.stake_tx());

        let info = validation.validator_info(None).await.map_err(at(stage))?;
        tracing::info!(staked = %info.staked, active = info.active, "Validator staked");
        self.report.record_stage(
            stage,
            StageReport::success(json!({
                "tx_hash": receipt.stake_tx(),
                "approve_tx": receipt.approve_tx,
                "staked_amount": info.staked,
                "is_active": info.active,
            })),
        );
        Ok(())
    }

    async fn create_request(&mut self, agent_id: U256) -> Result<B256, WorkflowError> {
        let stage = STAGE_REQUEST;
        let request_uri = format!(
            "{}/{}/request",
            self.settings.validation_uri_base.trim_end_matches('/'),
            agent_id
        );
        let request_data = RequestData::unique("Validation test");

        let (request_hash, submission) = self
            .client
            .validation()
            .create_validation_request(agent_id, &request_uri, request_data.as_str(), None, self.wait())
            .await
            .map_err(at(stage))?;
        self.record_tx("Create validation request", submission.tx_hash());

        self.report.record_stage(
            stage,
            StageReport::success(json!({
                "tx_hash": submission.tx_hash(),
                "request_hash": request_hash,
                "request_uri": request_uri,
                "request_data": request_data.as_str(),
                "agent_id": agent_id.to_string(),
            })),
        );
        Ok(request_hash)
    }

    async fn submit_validation(&mut self, request_hash: B256) -> Result<(), WorkflowError> {
        let stage = STAGE_SUBMIT;
        let validation = self.client.validation().clone();
        let agent_id = self.agent_id.unwrap_or_default();
        let score = self.settings.response_score;
        let response_uri = format!(
            "{}/{}/response",
            self.settings.validation_uri_base.trim_end_matches('/'),
            agent_id
        );
        let response_data = format!("Validation result: {}/100", score);

        let before = validation.validator_info(None).await.map_err(at(stage))?;
        let submission = validation
            .submit_validation(
                request_hash,
                score,
                &response_uri,
                &response_data,
                &self.settings.response_tag,
                self.wait(),
            )
            .await
            .map_err(at(stage))?;
        self.record_tx("Submit validation result", submission.tx_hash());

        let after = validation.validator_info(None).await.map_err(at(stage))?;
        let reward = after.pending_rewards.saturating_sub(before.pending_rewards);
        let status = validation.validation_status(request_hash).await.map_err(at(stage))?;
        tracing::info!(
            score,
            reward = %reward,
            pending = %after.pending_rewards,
            validation_count = %after.validation_count,
            "Validation submitted"
        );

        self.report.record_stage(
            stage,
            StageReport::success(json!({
                "tx_hash": submission.tx_hash(),
                "response": score,
                "reward_earned": reward,
                "validation_count": after.validation_count.to_string(),
                "validation_status": status,
            })),
        );
        Ok(())
    }

    async fn claim_rewards(&mut self) -> Result<(), WorkflowError> {
        let stage = STAGE_CLAIM;
        let validation = self.client.validation().clone();
        let account = self.client.address();

        let info = validation.validator_info(None).await.map_err(at(stage))?;
        if info.pending_rewards.is_zero() {
            tracing::warn!("No pending rewards to claim");
            self.report
                .record_stage(stage, StageReport::skipped("No pending rewards", Value::Null));
            return Ok(());
        }

        let balance_before = validation.token_balance(account).await.map_err(at(stage))?;
        let submission = validation.claim_rewards(self.wait()).await.map_err(at(stage))?;
        self.record_tx("Claim rewards", submission.tx_hash());
        let balance_after = validation.token_balance(account).await.map_err(at(stage))?;
        let claimed = balance_after.saturating_sub(balance_before);

        tracing::info!(claimed = %claimed, balance = %balance_after, "Rewards claimed");
        self.report.record_stage(
            stage,
            StageReport::success(json!({
                "tx_hash": submission.tx_hash(),
                "claimed_amount": claimed,
                "new_balance": balance_after,
            })),
        );
        Ok(())
    }

    async fn statistics(&mut self) -> Result<(), WorkflowError> {
        let stage = STAGE_STATISTICS;
        let validation = self.client.validation().clone();

        let info = validation.validator_info(None).await.map_err(at(stage))?;
        let stats = validation.staking_stats().await.map_err(at(stage))?;

        let verification = match self.agent_id {
            Some(agent_id) => {
                let verification = self
                    .client
                    .identity()
                    .verify_agent(agent_id, &AGENT_METADATA[..2])
                    .await;
                if !verification.passed() {
                    tracing::warn!(agent_id = %agent_id, mismatches = verification.mismatches.len(), "Agent verification did not pass");
                }
                Some(verification)
            }
            None => None,
        };

        tracing::info!(
            staked = %info.staked,
            validation_count = %info.validation_count,
            total_staked = %stats.total_staked,
            total_rewards = %stats.total_rewards,
            total_slashed = %stats.total_slashed,
            "Statistics collected"
        );
        self.report.record_stage(
            stage,
            StageReport::success(json!({
                "validator_info": info,
                "global_stats": stats,
                "agent_verification": verification.as_ref().map(|v| v.passed()),
                "token_uri": verification.and_then(|v| v.token_uri),
            })),
        );
        Ok(())
    }
}
