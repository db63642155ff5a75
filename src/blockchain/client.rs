//! Blockchain RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Connect to the JSON-RPC endpoint with bounded attempts
//! - Verify the network identifier (warn on mismatch, never abort)
//! - Query chain state (nonce, balances, receipts) and execute `eth_call`
//! - Broadcast signed transactions
//!
//! Everything above the client talks to the chain through [`ChainRpc`], so a
//! simulated endpoint can replace the network in tests.

use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use tokio::time::timeout;

use crate::blockchain::types::{
    BlockchainError, BlockchainResult, ChainId, NetworkConfig, TransactionOutcome,
};
use crate::observability::metrics;

/// Remote procedure surface of a single chain endpoint.
pub trait ChainRpc: Send + Sync + 'static {
    /// Endpoint identifier used in error context.
    fn endpoint(&self) -> &str;

    fn chain_id(&self) -> impl Future<Output = BlockchainResult<u64>> + Send;

    fn block_number(&self) -> impl Future<Output = BlockchainResult<u64>> + Send;

    fn balance(&self, address: Address) -> impl Future<Output = BlockchainResult<U256>> + Send;

    /// Transaction count including pending transactions.
    fn transaction_count(&self, address: Address) -> impl Future<Output = BlockchainResult<u64>> + Send;

    /// Execute a read-only call.
    fn call(&self, request: TransactionRequest) -> impl Future<Output = BlockchainResult<Bytes>> + Send;

    /// Broadcast an EIP-2718 encoded signed transaction.
    fn send_raw_transaction(&self, raw: Bytes) -> impl Future<Output = BlockchainResult<TxHash>> + Send;

    /// Receipt if the transaction has been mined.
    fn transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> impl Future<Output = BlockchainResult<Option<TransactionOutcome>>> + Send;
}

/// Read the chain ID with bounded attempts and compare it to `expected`.
///
/// A mismatch is logged and tolerated: some providers misreport the network.
pub async fn establish_connection<R: ChainRpc>(
    rpc: &R,
    expected: u64,
    attempts: u32,
    retry_delay: Duration,
) -> BlockchainResult<ChainId> {
    let attempts = attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        match rpc.chain_id().await {
            Ok(actual) => {
                if actual != expected {
                    let mismatch = BlockchainError::ChainMismatch { expected, actual };
                    tracing::warn!(endpoint = %rpc.endpoint(), error = %mismatch, "Continuing despite chain ID mismatch");
                }
                tracing::info!(endpoint = %rpc.endpoint(), chain_id = actual, attempt, "Connected to RPC node");
                return Ok(ChainId(actual));
            }
            Err(e) => {
                tracing::warn!(endpoint = %rpc.endpoint(), attempt, attempts, error = %e, "RPC node not reachable");
                last_error = e.to_string();
                if attempt < attempts {
                    tokio::time::sleep(retry_delay).await;
                }
            }
        }
    }

    Err(BlockchainError::Connection {
        endpoint: rpc.endpoint().to_string(),
        reason: last_error,
    })
}

/// Blockchain RPC client over an alloy HTTP provider.
#[derive(Clone)]
pub struct BlockchainClient {
    provider: Arc<dyn Provider + Send + Sync>,
    endpoint: String,
    /// Request timeout duration.
    timeout_duration: Duration,
}

impl BlockchainClient {
    /// Build the provider without touching the network.
    pub fn new(rpc_url: &url::Url, rpc_timeout: Duration) -> Self {
        let provider = ProviderBuilder::new().connect_http(rpc_url.clone());
        Self {
            provider: Arc::new(provider),
            endpoint: rpc_url.to_string(),
            timeout_duration: rpc_timeout,
        }
    }

    /// Build the provider and establish connectivity.
    ///
    /// # Returns
    /// The client and the chain ID the node reported, or `Connection` error
    /// once the configured attempts are exhausted.
    pub async fn connect(rpc_url: &url::Url, config: &NetworkConfig) -> BlockchainResult<(Self, ChainId)> {
        let client = Self::new(rpc_url, Duration::from_secs(config.rpc_timeout_secs));
        let chain_id = establish_connection(
            &client,
            config.chain_id,
            config.connect_attempts,
            Duration::from_millis(config.connect_retry_delay_ms),
        )
        .await?;
        Ok((client, chain_id))
    }

    /// Run one provider request under the client timeout.
    async fn request<T, E, F>(&self, operation: &'static str, fut: F) -> BlockchainResult<T>
    where
        F: IntoFuture<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let reason = match timeout(self.timeout_duration, fut).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("timed out after {}s", self.timeout_duration.as_secs()),
        };
        metrics::record_rpc_error(operation);
        tracing::debug!(operation, reason = %reason, "RPC request failed");
        Err(BlockchainError::Rpc {
            endpoint: self.endpoint.clone(),
            operation,
            reason,
        })
    }

    /// Get the underlying provider.
    pub fn provider(&self) -> &(dyn Provider + Send + Sync) {
        self.provider.as_ref()
    }
}

impl ChainRpc for BlockchainClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn chain_id(&self) -> BlockchainResult<u64> {
        self.request("eth_chainId", self.provider.get_chain_id()).await
    }

    async fn block_number(&self) -> BlockchainResult<u64> {
        self.request("eth_blockNumber", self.provider.get_block_number()).await
    }

    async fn balance(&self, address: Address) -> BlockchainResult<U256> {
        self.request("eth_getBalance", self.provider.get_balance(address)).await
    }

    async fn transaction_count(&self, address: Address) -> BlockchainResult<u64> {
        self.request(
            "eth_getTransactionCount",
            self.provider.get_transaction_count(address).pending(),
        )
        .await
    }

    async fn call(&self, request: TransactionRequest) -> BlockchainResult<Bytes> {
        self.request("eth_call", self.provider.call(request)).await
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> BlockchainResult<TxHash> {
        let pending = self
            .request("eth_sendRawTransaction", self.provider.send_raw_transaction(&raw))
            .await?;
        Ok(*pending.tx_hash())
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> BlockchainResult<Option<TransactionOutcome>> {
        let receipt = self
            .request("eth_getTransactionReceipt", self.provider.get_transaction_receipt(tx_hash))
            .await?;
        Ok(receipt.map(outcome_from_receipt))
    }
}

fn outcome_from_receipt(receipt: TransactionReceipt) -> TransactionOutcome {
    TransactionOutcome {
        tx_hash: receipt.transaction_hash,
        success: receipt.status(),
        gas_used: receipt.gas_used,
        block_number: receipt.block_number,
        logs: receipt.inner.logs().iter().map(|log| log.inner.clone()).collect(),
    }
}

impl std::fmt::Debug for BlockchainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockchainClient")
            .field("rpc_url", &self.endpoint)
            .field("timeout_secs", &self.timeout_duration.as_secs())
            .finish()
    }
}
