//! Metrics collection.
//!
//! # Responsibilities
//! - Count transactions by method and lifecycle state
//! - Record time from broadcast to receipt
//! - Count failed RPC requests by operation
//!
//! # Metrics
//! - `validator_transactions_total` (counter): by method, state
//! - `validator_confirmation_seconds` (histogram): by method
//! - `validator_rpc_errors_total` (counter): by operation
//!
//! # Design Decisions
//! - Uses the `metrics` facade; recording is a no-op until the embedding
//!   process installs a recorder
//! - Labels are static strings (method signatures, state names)

use std::time::Duration;

use metrics::{counter, histogram};

use crate::blockchain::types::TxState;

/// Record a transaction reaching `state`.
pub fn record_transaction(method: &'static str, state: TxState) {
    counter!(
        "validator_transactions_total",
        "method" => method,
        "state" => state.as_str()
    )
    .increment(1);
}

/// Record how long a transaction took to confirm.
pub fn record_confirmation(method: &'static str, elapsed: Duration) {
    histogram!("validator_confirmation_seconds", "method" => method).record(elapsed.as_secs_f64());
}

/// Record a failed RPC request.
pub fn record_rpc_error(operation: &'static str) {
    counter!("validator_rpc_errors_total", "operation" => operation).increment(1);
}
