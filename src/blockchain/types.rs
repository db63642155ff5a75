//! Chain-specific types and error definitions.

use std::time::Duration;

use alloy::primitives::{Log, TxHash};
use thiserror::Error;

pub use crate::config::schema::{FeeConfig, NetworkConfig};

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// Endpoint unreachable after the bounded connection attempts.
    #[error("Unable to connect to RPC node {endpoint}: {reason}")]
    Connection { endpoint: String, reason: String },

    /// An RPC request failed or timed out.
    #[error("RPC {operation} against {endpoint} failed: {reason}")]
    Rpc {
        endpoint: String,
        operation: &'static str,
        reason: String,
    },

    /// A read-only contract call failed.
    #[error("Call {method} failed: {reason}")]
    CallFailed { method: &'static str, reason: String },

    /// Building, signing or broadcasting a transaction failed.
    #[error("Broadcast of {method} failed: {reason}")]
    BroadcastFailed { method: &'static str, reason: String },

    /// Transaction was mined but its receipt reports failure.
    #[error("Transaction {tx_hash} ({method}) reverted in block {block_number:?}, gas used {gas_used}")]
    ContractExecutionFailed {
        method: &'static str,
        tx_hash: TxHash,
        gas_used: u64,
        block_number: Option<u64>,
    },

    /// No receipt observed within the wait window. The transaction may
    /// still be mined later; its outcome is unknown.
    #[error("Transaction {tx_hash} ({method}) not confirmed after {timeout_secs} seconds; outcome unknown")]
    Timeout {
        method: &'static str,
        tx_hash: TxHash,
        timeout_secs: u64,
    },

    /// A caller-supplied value violates a documented precondition.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An expected event was absent from a successful receipt.
    #[error("{event} event not found in transaction {tx_hash}")]
    EventNotFound { event: &'static str, tx_hash: TxHash },

    /// Returned call data did not match the expected ABI.
    #[error("Failed to decode {method} return data: {reason}")]
    AbiDecode { method: &'static str, reason: String },

    /// Invalid private key format or derivation error.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// The wallet could not sign a built transaction.
    #[error("Signing {method} failed: {reason}")]
    Signing { method: &'static str, reason: String },

    /// Approval confirmed but the staking call did not succeed.
    #[error("Stake incomplete: approval {approve_tx} confirmed, stake failed: {source}")]
    PartialStake {
        approve_tx: TxHash,
        #[source]
        source: Box<BlockchainError>,
    },

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// Lifecycle of a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    /// Signed and accepted by the node.
    Submitted,
    /// Waiting for a receipt.
    Pending,
    /// Receipt observed with success status.
    Confirmed,
    /// Receipt observed with failure status.
    Failed,
    /// Wait window elapsed without a receipt.
    TimedOut,
}

impl TxState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxState::Submitted => "submitted",
            TxState::Pending => "pending",
            TxState::Confirmed => "confirmed",
            TxState::Failed => "failed",
            TxState::TimedOut => "timed_out",
        }
    }
}

/// How long a submitter should follow a transaction after broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitMode {
    /// Return as soon as the node accepts the transaction.
    FireAndForget,
    /// Poll for a receipt until it appears or `timeout` elapses.
    Receipt { timeout: Duration },
}

impl WaitMode {
    pub fn receipt_secs(secs: u64) -> Self {
        WaitMode::Receipt {
            timeout: Duration::from_secs(secs),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        match self {
            WaitMode::FireAndForget => None,
            WaitMode::Receipt { timeout } => Some(*timeout),
        }
    }
}

/// Confirmed receipt projected onto what callers need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionOutcome {
    pub tx_hash: TxHash,
    pub success: bool,
    pub gas_used: u64,
    pub block_number: Option<u64>,
    /// Emitted event records, in receipt order.
    pub logs: Vec<Log>,
}

/// Result of a write submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Broadcast only; nothing is known about inclusion.
    Broadcast { tx_hash: TxHash },
    /// Receipt observed with success status.
    Confirmed(TransactionOutcome),
}

impl Submission {
    pub fn tx_hash(&self) -> TxHash {
        match self {
            Submission::Broadcast { tx_hash } => *tx_hash,
            Submission::Confirmed(outcome) => outcome.tx_hash,
        }
    }

    pub fn outcome(&self) -> Option<&TransactionOutcome> {
        match self {
            Submission::Broadcast { .. } => None,
            Submission::Confirmed(outcome) => Some(outcome),
        }
    }
}
