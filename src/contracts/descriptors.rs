//! Static method registry for the contract interface set.
//!
//! Every call type generated in [`crate::contracts::abi`] is classified here
//! exactly once: owning contract, read or write, default gas limit. The
//! per-contract tables are built from the same declarations.

use alloy::sol_types::SolCall;

use crate::contracts::abi::{IIdentityRegistry, IStakeToken, IStakingValidator, IValidationRegistry};

/// Version tag of the descriptor tables.
pub const INTERFACE_VERSION: &str = "erc8004-staking-v1";

/// The contracts this client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractKind {
    IdentityRegistry,
    ValidationRegistry,
    StakingValidator,
    StakeToken,
}

impl ContractKind {
    pub const ALL: [ContractKind; 4] = [
        ContractKind::IdentityRegistry,
        ContractKind::ValidationRegistry,
        ContractKind::StakingValidator,
        ContractKind::StakeToken,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ContractKind::IdentityRegistry => "IdentityRegistry",
            ContractKind::ValidationRegistry => "ValidationRegistry",
            ContractKind::StakingValidator => "StakingValidator",
            ContractKind::StakeToken => "StakeToken",
        }
    }

    /// Descriptor table for this contract.
    pub fn methods(&self) -> &'static [MethodDescriptor] {
        match self {
            ContractKind::IdentityRegistry => IDENTITY_REGISTRY_METHODS,
            ContractKind::ValidationRegistry => VALIDATION_REGISTRY_METHODS,
            ContractKind::StakingValidator => STAKING_VALIDATOR_METHODS,
            ContractKind::StakeToken => STAKE_TOKEN_METHODS,
        }
    }

    /// Look up a method by its bare name (e.g. `"stake"`).
    pub fn find(&self, name: &str) -> Option<&'static MethodDescriptor> {
        self.methods().iter().find(|m| m.name() == name)
    }
}

impl std::fmt::Display for ContractKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether a method changes state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutability {
    /// Executed with `eth_call`; no transaction.
    Read,
    /// Must be signed and broadcast.
    Write,
}

/// Classification attached to every generated call type.
pub trait ContractMethod: SolCall + Send + Sync {
    const CONTRACT: ContractKind;
    const MUTABILITY: Mutability;
    /// Gas limit used unless the caller overrides it. Zero for reads.
    const DEFAULT_GAS: u64;
}

/// Runtime view of a [`ContractMethod`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub contract: ContractKind,
    pub signature: &'static str,
    pub selector: [u8; 4],
    pub mutability: Mutability,
    pub default_gas: u64,
}

impl MethodDescriptor {
    pub const fn of<C: ContractMethod>() -> Self {
        Self {
            contract: C::CONTRACT,
            signature: C::SIGNATURE,
            selector: C::SELECTOR,
            mutability: C::MUTABILITY,
            default_gas: C::DEFAULT_GAS,
        }
    }

    /// Method name without the parameter list.
    pub fn name(&self) -> &'static str {
        self.signature
            .split_once('(')
            .map(|(name, _)| name)
            .unwrap_or(self.signature)
    }
}

macro_rules! interface_table {
    ($table:ident, $kind:expr, { $($call:ty => $mutability:ident, $gas:expr;)* }) => {
        $(
            impl ContractMethod for $call {
                const CONTRACT: ContractKind = $kind;
                const MUTABILITY: Mutability = Mutability::$mutability;
                const DEFAULT_GAS: u64 = $gas;
            }
        )*

        static $table: &[MethodDescriptor] = &[$(MethodDescriptor::of::<$call>()),*];
    };
}

interface_table!(IDENTITY_REGISTRY_METHODS, ContractKind::IdentityRegistry, {
    IIdentityRegistry::registerCall => Write, 500_000;
    IIdentityRegistry::getMetadataCall => Read, 0;
    IIdentityRegistry::setMetadataCall => Write, 200_000;
    IIdentityRegistry::tokenURICall => Read, 0;
    IIdentityRegistry::setAgentUriCall => Write, 200_000;
});

interface_table!(VALIDATION_REGISTRY_METHODS, ContractKind::ValidationRegistry, {
    IValidationRegistry::validationRequestCall => Write, 500_000;
    IValidationRegistry::validationResponseCall => Write, 600_000;
    IValidationRegistry::getValidationStatusCall => Read, 0;
});

interface_table!(STAKING_VALIDATOR_METHODS, ContractKind::StakingValidator, {
    IStakingValidator::stakeCall => Write, 300_000;
    IStakingValidator::requestUnstakeCall => Write, 200_000;
    IStakingValidator::unstakeCall => Write, 200_000;
    IStakingValidator::submitValidationCall => Write, 600_000;
    IStakingValidator::claimRewardsCall => Write, 250_000;
    IStakingValidator::getValidatorInfoCall => Read, 0;
    IStakingValidator::getStatsCall => Read, 0;
});

interface_table!(STAKE_TOKEN_METHODS, ContractKind::StakeToken, {
    IStakeToken::balanceOfCall => Read, 0;
    IStakeToken::approveCall => Write, 100_000;
    IStakeToken::mintCall => Write, 100_000;
});
