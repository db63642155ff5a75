//! ERC-8004 staking validation client.
//!
//! Registers agent identities, stakes as a validator, runs the
//! request/response validation handshake and claims rewards against the
//! identity registry, validation registry and staking validator contracts.

pub mod blockchain;
pub mod config;
pub mod contracts;
pub mod identity;
pub mod observability;
pub mod session;
pub mod validation;
pub mod workflow;

pub use config::ResolvedConfig;
pub use session::ProtocolClient;
pub use workflow::{RunReport, ValidationWorkflow, WorkflowError};
