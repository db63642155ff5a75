//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! validator client. All types derive Serde traits for deserialization from
//! config files; environment variables are layered on top by the loader.

use serde::{Deserialize, Serialize};

/// Sepolia testnet chain ID.
pub const DEFAULT_CHAIN_ID: u64 = 11_155_111;

/// One gwei in wei.
pub const GWEI: u128 = 1_000_000_000;

/// Root configuration for the validator client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// RPC endpoint and connection behaviour.
    pub network: NetworkConfig,

    /// Deployed contract addresses.
    pub contracts: ContractsConfig,

    /// Signing account.
    pub signer: SignerConfig,

    /// Fee parameters applied to every transaction.
    pub fees: FeeConfig,

    /// Multi-stage workflow parameters.
    pub workflow: WorkflowConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// RPC endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: Option<String>,

    /// Expected chain ID (11155111 for Sepolia, 31337 for local Anvil).
    pub chain_id: u64,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Connection attempts before giving up.
    pub connect_attempts: u32,

    /// Delay between connection attempts in milliseconds.
    pub connect_retry_delay_ms: u64,

    /// Receipt polling interval in milliseconds.
    pub receipt_poll_interval_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            rpc_url: None,
            chain_id: DEFAULT_CHAIN_ID,
            rpc_timeout_secs: 10,
            connect_attempts: 3,
            connect_retry_delay_ms: 500,
            receipt_poll_interval_ms: 1000,
        }
    }
}

/// Addresses of the deployed contracts.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ContractsConfig {
    pub identity_registry: Option<String>,
    pub validation_registry: Option<String>,
    pub staking_validator: Option<String>,
    pub stake_token: Option<String>,
}

/// Signing account configuration.
#[derive(Clone, Deserialize, Default)]
#[serde(default)]
pub struct SignerConfig {
    /// Hex private key. Prefer the environment variable over the file.
    pub private_key: Option<String>,
}

// Never serialize or print the key.
impl Serialize for SignerConfig {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("SignerConfig", 1)?;
        s.serialize_field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))?;
        s.end()
    }
}

impl std::fmt::Debug for SignerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignerConfig")
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// EIP-1559 fee parameters. Fees are fixed; no estimation is performed.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct FeeConfig {
    /// Max fee per gas in wei.
    pub max_fee_per_gas_wei: u128,

    /// Max priority fee per gas in wei.
    pub max_priority_fee_per_gas_wei: u128,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            max_fee_per_gas_wei: 50 * GWEI,
            max_priority_fee_per_gas_wei: 2 * GWEI,
        }
    }
}

/// Parameters of the seven-stage validation workflow.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Skip registration and use this agent ID.
    pub default_agent_id: Option<u64>,

    /// Whole tokens to stake.
    pub stake_amount_tokens: u64,

    /// Whole tokens minted when the stake token balance is short.
    pub mint_amount_tokens: u64,

    /// Validation score submitted (0-100).
    pub response_score: u8,

    /// Tag attached to the validation response.
    pub response_tag: String,

    /// Receipt wait window in seconds.
    pub receipt_timeout_secs: u64,

    /// Pause between stages in seconds.
    pub stage_delay_secs: u64,

    /// Where the JSON run report is written.
    pub report_path: String,

    /// Base URL for agent registration files.
    pub agent_uri_base: String,

    /// Base URL for validation request/response documents.
    pub validation_uri_base: String,

    /// Block explorer transaction URL prefix.
    pub explorer_tx_url: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            default_agent_id: None,
            stake_amount_tokens: 100,
            mint_amount_tokens: 100,
            response_score: 100,
            response_tag: "test".to_string(),
            receipt_timeout_secs: 120,
            stage_delay_secs: 5,
            report_path: "validation_test_report.json".to_string(),
            agent_uri_base: "https://api.aliasai.io/agent".to_string(),
            validation_uri_base: "https://api.aliasai.io/validation".to_string(),
            explorer_tx_url: "https://sepolia.etherscan.io/tx/".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Pretty for terminals, JSON for log shipping.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}
