//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! ResolvedConfig (private key, RPC URL, fees)
//!     → wallet.rs (key loading, signing)
//!     → client.rs (RPC connection with timeouts, ChainRpc seam)
//!     → transaction.rs (nonce, sign, broadcast, confirm)
//! ```
//!
//! # Security Constraints
//! - Private keys come only from configuration or the environment
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts

pub mod client;
pub mod transaction;
pub mod types;
pub mod units;
pub mod wallet;

pub use client::{BlockchainClient, ChainRpc};
pub use transaction::{SubmitOptions, TxSubmitter};
pub use types::{BlockchainError, BlockchainResult, ChainId, Submission, TransactionOutcome, TxState, WaitMode};
pub use units::TokenAmount;
pub use wallet::Wallet;
