//! One operator session: a chain connection, the signing wallet and the
//! contract clients that share them.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;

use crate::blockchain::client::{establish_connection, BlockchainClient, ChainRpc};
use crate::blockchain::transaction::TxSubmitter;
use crate::blockchain::types::{BlockchainResult, ChainId};
use crate::blockchain::wallet::Wallet;
use crate::config::ResolvedConfig;
use crate::contracts::{ContractKind, Deployment};
use crate::identity::AgentRegistry;
use crate::validation::ValidationManager;

/// Connected protocol client.
///
/// Reads go through the shared `rpc` handle; every write goes through the one
/// submitter so nonces stay ordered.
pub struct ProtocolClient<R> {
    rpc: Arc<R>,
    submitter: Arc<TxSubmitter<R>>,
    deployment: Deployment,
    chain_id: ChainId,
    identity: AgentRegistry<R>,
    validation: ValidationManager<R>,
}

impl ProtocolClient<BlockchainClient> {
    /// Connect to the configured RPC endpoint over HTTP.
    pub async fn connect(config: &ResolvedConfig) -> BlockchainResult<Self> {
        let (client, chain_id) = BlockchainClient::connect(&config.rpc_url, &config.network).await?;
        Self::from_parts(Arc::new(client), chain_id, config)
    }
}

impl<R: ChainRpc> ProtocolClient<R> {
    /// Establish connectivity over an existing transport.
    pub async fn attach(rpc: Arc<R>, config: &ResolvedConfig) -> BlockchainResult<Self> {
        let chain_id = establish_connection(
            rpc.as_ref(),
            config.network.chain_id,
            config.network.connect_attempts,
            Duration::from_millis(config.network.connect_retry_delay_ms),
        )
        .await?;
        Self::from_parts(rpc, chain_id, config)
    }

    fn from_parts(rpc: Arc<R>, chain_id: ChainId, config: &ResolvedConfig) -> BlockchainResult<Self> {
        // Transactions are signed for the configured network even when the
        // node reports another.
        let wallet = Wallet::from_private_key(&config.private_key, config.network.chain_id)?;
        let submitter = Arc::new(TxSubmitter::new(
            rpc.clone(),
            wallet,
            config.fees,
            Duration::from_millis(config.network.receipt_poll_interval_ms),
        ));
        let deployment = config.deployment;

        let identity = AgentRegistry::new(
            rpc.clone(),
            submitter.clone(),
            deployment.endpoint(ContractKind::IdentityRegistry),
        );
        let validation = ValidationManager::new(
            rpc.clone(),
            submitter.clone(),
            deployment.endpoint(ContractKind::ValidationRegistry),
            deployment.endpoint(ContractKind::StakingValidator),
            deployment.endpoint(ContractKind::StakeToken),
            Duration::from_secs(config.workflow.receipt_timeout_secs),
        );

        tracing::info!(
            address = %submitter.address(),
            chain_id = chain_id.0,
            identity_registry = %deployment.identity_registry,
            validation_registry = %deployment.validation_registry,
            staking_validator = %deployment.staking_validator,
            stake_token = %deployment.stake_token,
            "Protocol client ready"
        );

        Ok(Self {
            rpc,
            submitter,
            deployment,
            chain_id,
            identity,
            validation,
        })
    }

    /// Operator address.
    pub fn address(&self) -> Address {
        self.submitter.address()
    }

    /// Chain ID reported by the node.
    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub fn deployment(&self) -> &Deployment {
        &self.deployment
    }

    pub fn rpc(&self) -> &Arc<R> {
        &self.rpc
    }

    pub fn identity(&self) -> &AgentRegistry<R> {
        &self.identity
    }

    pub fn validation(&self) -> &ValidationManager<R> {
        &self.validation
    }
}
