//! Configuration validation.
//!
//! # Responsibilities
//! - Report every required value that is absent, by environment variable name
//! - Parse contract addresses and the RPC URL
//! - Validate value ranges (score <= 100, attempts > 0, fee ordering)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<ResolvedConfig, Vec<ValidationError>>
//! - Runs before any connection is attempted

use alloy::primitives::Address;
use thiserror::Error;

use crate::config::loader::{
    ENV_IDENTITY_REGISTRY, ENV_PRIVATE_KEY, ENV_RPC_URL, ENV_STAKE_TOKEN, ENV_STAKING_VALIDATOR,
    ENV_VALIDATION_REGISTRY,
};
use crate::config::schema::{
    AppConfig, FeeConfig, NetworkConfig, ObservabilityConfig, WorkflowConfig,
};
use crate::contracts::Deployment;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Required value absent; carries the environment variable name.
    #[error("missing {0}")]
    Missing(&'static str),

    /// Value present but unusable.
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Configuration with every required value present and parsed.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub rpc_url: url::Url,
    pub private_key: String,
    pub deployment: Deployment,
    pub network: NetworkConfig,
    pub fees: FeeConfig,
    pub workflow: WorkflowConfig,
    pub observability: ObservabilityConfig,
}

/// Validate a merged configuration.
pub fn validate_config(config: &AppConfig) -> Result<ResolvedConfig, Vec<ValidationError>> {
    let mut errors = Vec::new();

    let rpc_url = match config.network.rpc_url.as_deref() {
        None => {
            errors.push(ValidationError::Missing(ENV_RPC_URL));
            None
        }
        Some(raw) => match raw.parse::<url::Url>() {
            Ok(url) => Some(url),
            Err(e) => {
                errors.push(ValidationError::Invalid {
                    field: ENV_RPC_URL,
                    reason: e.to_string(),
                });
                None
            }
        },
    };

    let contracts = &config.contracts;
    let identity_registry = required_address(&contracts.identity_registry, ENV_IDENTITY_REGISTRY, &mut errors);
    let validation_registry = required_address(&contracts.validation_registry, ENV_VALIDATION_REGISTRY, &mut errors);
    let staking_validator = required_address(&contracts.staking_validator, ENV_STAKING_VALIDATOR, &mut errors);
    let stake_token = required_address(&contracts.stake_token, ENV_STAKE_TOKEN, &mut errors);

    let private_key = config.signer.private_key.clone();
    if private_key.is_none() {
        errors.push(ValidationError::Missing(ENV_PRIVATE_KEY));
    }

    if config.network.connect_attempts == 0 {
        errors.push(ValidationError::Invalid {
            field: "network.connect_attempts",
            reason: "must be at least 1".to_string(),
        });
    }
    if config.network.receipt_poll_interval_ms == 0 {
        errors.push(ValidationError::Invalid {
            field: "network.receipt_poll_interval_ms",
            reason: "must be greater than 0".to_string(),
        });
    }
    if config.fees.max_priority_fee_per_gas_wei > config.fees.max_fee_per_gas_wei {
        errors.push(ValidationError::Invalid {
            field: "fees.max_priority_fee_per_gas_wei",
            reason: "exceeds fees.max_fee_per_gas_wei".to_string(),
        });
    }
    if config.workflow.response_score > 100 {
        errors.push(ValidationError::Invalid {
            field: "workflow.response_score",
            reason: format!("{} is outside 0-100", config.workflow.response_score),
        });
    }

    match (
        rpc_url,
        private_key,
        identity_registry,
        validation_registry,
        staking_validator,
        stake_token,
    ) {
        (
            Some(rpc_url),
            Some(private_key),
            Some(identity_registry),
            Some(validation_registry),
            Some(staking_validator),
            Some(stake_token),
        ) if errors.is_empty() => Ok(ResolvedConfig {
            rpc_url,
            private_key,
            deployment: Deployment {
                identity_registry,
                validation_registry,
                staking_validator,
                stake_token,
            },
            network: config.network.clone(),
            fees: config.fees,
            workflow: config.workflow.clone(),
            observability: config.observability.clone(),
        }),
        _ => Err(errors),
    }
}

fn required_address(
    value: &Option<String>,
    field: &'static str,
    errors: &mut Vec<ValidationError>,
) -> Option<Address> {
    let raw = match value.as_deref() {
        Some(raw) => raw,
        None => {
            errors.push(ValidationError::Missing(field));
            return None;
        }
    };
    match raw.parse::<Address>() {
        Ok(address) => Some(address),
        Err(e) => {
            errors.push(ValidationError::Invalid {
                field,
                reason: e.to_string(),
            });
            None
        }
    }
}
