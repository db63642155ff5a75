//! Staking validation: the request/response handshake, the approve-then-stake
//! saga, and the validator-facing contract operations.
//!
//! # Data Flow
//! ```text
//! request_data ──digest──▶ request hash ──validationRequest──▶ registry
//!                               │
//! response_data ──digest──▶ response hash ──submitValidation──▶ staking
//! ```

pub mod handshake;
pub mod manager;
pub mod records;
pub mod staking;

pub use handshake::{digest, tag_digest, RequestData};
pub use manager::{ValidationManager, MAX_RESPONSE};
pub use records::{StakingStats, ValidationStatus, ValidatorInfo};
pub use staking::{StakeReceipt, StakeStep};
