//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Core subsystems produce:
//!     → tracing events (structured fields: method, tx_hash, state)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout, pretty or JSON)
//!     → whatever metrics recorder the host process installs
//! ```
//!
//! # Design Decisions
//! - Core control flow never depends on console output
//! - Private keys are never part of any event

pub mod logging;
pub mod metrics;
