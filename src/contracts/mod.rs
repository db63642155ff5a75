//! Contract interface set.
//!
//! # Data Flow
//! ```text
//! abi.rs (sol! interfaces, bit-exact with the deployed contracts)
//!     → descriptors.rs (contract, read/write, default gas per call type)
//!     → call.rs (reads via eth_call)
//!     → blockchain::transaction (writes via signed transactions)
//! ```

pub mod abi;
pub mod call;
pub mod descriptors;

use alloy::primitives::Address;

pub use call::read;
pub use descriptors::{ContractKind, ContractMethod, MethodDescriptor, Mutability, INTERFACE_VERSION};

/// A deployed contract: its role and address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContractEndpoint {
    pub kind: ContractKind,
    pub address: Address,
}

impl ContractEndpoint {
    pub const fn new(kind: ContractKind, address: Address) -> Self {
        Self { kind, address }
    }
}

/// Addresses of every contract the client uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deployment {
    pub identity_registry: Address,
    pub validation_registry: Address,
    pub staking_validator: Address,
    pub stake_token: Address,
}

impl Deployment {
    pub fn endpoint(&self, kind: ContractKind) -> ContractEndpoint {
        let address = match kind {
            ContractKind::IdentityRegistry => self.identity_registry,
            ContractKind::ValidationRegistry => self.validation_registry,
            ContractKind::StakingValidator => self.staking_validator,
            ContractKind::StakeToken => self.stake_token,
        };
        ContractEndpoint::new(kind, address)
    }
}
