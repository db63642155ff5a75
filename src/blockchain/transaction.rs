//! Transaction building, signing, broadcast and confirmation.
//!
//! # Responsibilities
//! - Assign nonce, gas limit and EIP-1559 fees
//! - Sign with the process wallet and broadcast
//! - Follow the transaction per [`WaitMode`]
//!
//! # Nonce discipline
//! Nonce acquisition, signing and broadcast form one critical section guarded
//! by an async mutex. The next nonce is the larger of the chain's pending
//! count and the last nonce this process broadcast plus one, so back-to-back
//! fire-and-forget submissions do not collide. A slot is consumed only when
//! the node accepts the broadcast.

use std::sync::Arc;
use std::time::Duration;

use alloy::eips::eip2718::Encodable2718;
use alloy::network::TransactionBuilder;
use alloy::primitives::Address;
use alloy::rpc::types::TransactionRequest;
use tokio::sync::Mutex;
use tokio::time::{interval, timeout, Instant, MissedTickBehavior};

use crate::blockchain::client::ChainRpc;
use crate::blockchain::types::{
    BlockchainError, BlockchainResult, FeeConfig, Submission, TransactionOutcome, TxState, WaitMode,
};
use crate::blockchain::wallet::Wallet;
use crate::contracts::{ContractEndpoint, ContractMethod, Mutability};
use crate::observability::metrics;

/// Per-call overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitOptions {
    pub wait: WaitMode,
    /// Overrides the method's default gas limit.
    pub gas_limit: Option<u64>,
}

impl SubmitOptions {
    pub fn new(wait: WaitMode) -> Self {
        Self { wait, gas_limit: None }
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }
}

impl From<WaitMode> for SubmitOptions {
    fn from(wait: WaitMode) -> Self {
        Self::new(wait)
    }
}

/// Signs and submits write calls for one wallet.
pub struct TxSubmitter<R> {
    rpc: Arc<R>,
    wallet: Wallet,
    fees: FeeConfig,
    poll_interval: Duration,
    /// Next nonce this process will use, once known.
    next_nonce: Mutex<Option<u64>>,
}

impl<R: ChainRpc> TxSubmitter<R> {
    /// Create a new submitter.
    pub fn new(rpc: Arc<R>, wallet: Wallet, fees: FeeConfig, poll_interval: Duration) -> Self {
        Self {
            rpc,
            wallet,
            fees,
            poll_interval,
            next_nonce: Mutex::new(None),
        }
    }

    /// Get the wallet address.
    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    /// Submit a write call to `endpoint`.
    ///
    /// # Errors
    /// - `InvalidArgument` if `C` is a read method or belongs to another contract
    /// - `Signing` or `BroadcastFailed` if the transaction never reached the
    ///   node (no nonce consumed)
    /// - `ContractExecutionFailed` if the receipt reports failure
    /// - `Timeout` if no receipt appears within the wait window; the
    ///   transaction may still be mined later
    pub async fn submit<C: ContractMethod>(
        &self,
        endpoint: &ContractEndpoint,
        call: &C,
        options: SubmitOptions,
    ) -> BlockchainResult<Submission> {
        let method = C::SIGNATURE;
        if C::MUTABILITY != Mutability::Write {
            return Err(BlockchainError::InvalidArgument(format!(
                "{} is a read method and cannot be submitted as a transaction",
                method
            )));
        }
        if C::CONTRACT != endpoint.kind {
            return Err(BlockchainError::InvalidArgument(format!(
                "{} belongs to {}, not {}",
                method, C::CONTRACT, endpoint.kind
            )));
        }

        let gas_limit = options.gas_limit.unwrap_or(C::DEFAULT_GAS);
        let tx_hash = {
            let mut next_nonce = self.next_nonce.lock().await;

            let chain_nonce = self
                .rpc
                .transaction_count(self.wallet.address())
                .await
                .map_err(|e| broadcast_error(method, e))?;
            let nonce = next_nonce.map_or(chain_nonce, |local| local.max(chain_nonce));

            let request = TransactionRequest::default()
                .with_from(self.wallet.address())
                .with_to(endpoint.address)
                .with_input(call.abi_encode())
                .with_nonce(nonce)
                .with_chain_id(self.wallet.chain_id())
                .with_gas_limit(gas_limit)
                .with_max_fee_per_gas(self.fees.max_fee_per_gas_wei)
                .with_max_priority_fee_per_gas(self.fees.max_priority_fee_per_gas_wei);

            let envelope = request
                .build(self.wallet.network_wallet())
                .await
                .map_err(|e| BlockchainError::Signing {
                    method,
                    reason: e.to_string(),
                })?;

            let tx_hash = self
                .rpc
                .send_raw_transaction(envelope.encoded_2718().into())
                .await
                .map_err(|e| broadcast_error(method, e))?;

            *next_nonce = Some(nonce + 1);
            tx_hash
        };

        metrics::record_transaction(method, TxState::Submitted);
        tracing::info!(
            contract = %endpoint.kind,
            method,
            tx_hash = %tx_hash,
            gas_limit,
            "Transaction submitted"
        );

        match options.wait {
            WaitMode::FireAndForget => Ok(Submission::Broadcast { tx_hash }),
            WaitMode::Receipt { timeout } => self
                .wait_for_receipt(method, tx_hash, timeout)
                .await
                .map(Submission::Confirmed),
        }
    }

    /// Poll for the receipt of `tx_hash` until it appears or `limit` elapses.
    pub async fn wait_for_receipt(
        &self,
        method: &'static str,
        tx_hash: alloy::primitives::TxHash,
        limit: Duration,
    ) -> BlockchainResult<TransactionOutcome> {
        let started = Instant::now();
        metrics::record_transaction(method, TxState::Pending);

        let polled = timeout(limit, async {
            let mut ticker = interval(self.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                match self.rpc.transaction_receipt(tx_hash).await {
                    Ok(Some(outcome)) => return outcome,
                    Ok(None) => {
                        tracing::debug!(tx_hash = %tx_hash, method, "Transaction pending");
                    }
                    Err(e) => {
                        tracing::warn!(tx_hash = %tx_hash, method, error = %e, "Receipt lookup failed, still waiting");
                    }
                }
            }
        })
        .await;

        let outcome = match polled {
            Ok(outcome) => outcome,
            Err(_) => {
                metrics::record_transaction(method, TxState::TimedOut);
                tracing::warn!(
                    tx_hash = %tx_hash,
                    method,
                    timeout_secs = limit.as_secs(),
                    "No receipt within wait window; transaction outcome unknown"
                );
                return Err(BlockchainError::Timeout {
                    method,
                    tx_hash,
                    timeout_secs: limit.as_secs(),
                });
            }
        };

        if !outcome.success {
            metrics::record_transaction(method, TxState::Failed);
            tracing::error!(
                tx_hash = %tx_hash,
                method,
                gas_used = outcome.gas_used,
                block_number = ?outcome.block_number,
                "Transaction reverted"
            );
            return Err(BlockchainError::ContractExecutionFailed {
                method,
                tx_hash,
                gas_used: outcome.gas_used,
                block_number: outcome.block_number,
            });
        }

        metrics::record_transaction(method, TxState::Confirmed);
        metrics::record_confirmation(method, started.elapsed());
        tracing::info!(
            tx_hash = %tx_hash,
            method,
            gas_used = outcome.gas_used,
            block_number = ?outcome.block_number,
            "Transaction confirmed"
        );
        Ok(outcome)
    }
}

fn broadcast_error(method: &'static str, error: BlockchainError) -> BlockchainError {
    BlockchainError::BroadcastFailed {
        method,
        reason: error.to_string(),
    }
}
