//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ResolvedConfig, ValidationError};

pub const ENV_RPC_URL: &str = "ERC8004_RPC_URL";
pub const ENV_IDENTITY_REGISTRY: &str = "ERC8004_IDENTITY_REGISTRY";
pub const ENV_VALIDATION_REGISTRY: &str = "ERC8004_VALIDATION_REGISTRY";
pub const ENV_STAKING_VALIDATOR: &str = "ERC8004_STAKING_VALIDATOR";
pub const ENV_STAKE_TOKEN: &str = "ERC8004_STAKE_TOKEN";
pub const ENV_PRIVATE_KEY: &str = "ERC8004_ADMIN_PRIVATE_KEY";
pub const ENV_CHAIN_ID: &str = "ERC8004_CHAIN_ID";
pub const ENV_DEFAULT_AGENT_ID: &str = "ERC8004_DEFAULT_AGENT_ID";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl ConfigError {
    /// Names of required values that were absent.
    pub fn missing(&self) -> Vec<&'static str> {
        match self {
            ConfigError::Validation(errors) => errors
                .iter()
                .filter_map(|e| match e {
                    ValidationError::Missing(name) => Some(*name),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Parse a TOML configuration file without validating it.
pub fn read_config_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Load the optional file, overlay the process environment, and validate.
pub fn load_config(path: Option<&Path>) -> Result<ResolvedConfig, ConfigError> {
    let config = match path {
        Some(path) => read_config_file(path)?,
        None => AppConfig::default(),
    };
    resolve_config(config, |key| std::env::var(key).ok())
}

/// Overlay variables from `lookup` onto `config`, then validate.
pub fn resolve_config<F>(mut config: AppConfig, lookup: F) -> Result<ResolvedConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut errors = apply_env_overrides(&mut config, lookup);
    match validate_config(&config) {
        Ok(resolved) if errors.is_empty() => Ok(resolved),
        Ok(_) => Err(ConfigError::Validation(errors)),
        Err(mut validation_errors) => {
            errors.append(&mut validation_errors);
            Err(ConfigError::Validation(errors))
        }
    }
}

/// Environment values win over file values. Empty values count as unset.
fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Vec<ValidationError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    let mut errors = Vec::new();

    if let Some(v) = get(ENV_RPC_URL) {
        config.network.rpc_url = Some(v);
    }
    if let Some(v) = get(ENV_IDENTITY_REGISTRY) {
        config.contracts.identity_registry = Some(v);
    }
    if let Some(v) = get(ENV_VALIDATION_REGISTRY) {
        config.contracts.validation_registry = Some(v);
    }
    if let Some(v) = get(ENV_STAKING_VALIDATOR) {
        config.contracts.staking_validator = Some(v);
    }
    if let Some(v) = get(ENV_STAKE_TOKEN) {
        config.contracts.stake_token = Some(v);
    }
    if let Some(v) = get(ENV_PRIVATE_KEY) {
        config.signer.private_key = Some(v);
    }
    if let Some(v) = get(ENV_CHAIN_ID) {
        match v.trim().parse() {
            Ok(id) => config.network.chain_id = id,
            Err(e) => errors.push(ValidationError::Invalid {
                field: ENV_CHAIN_ID,
                reason: format!("{}: {}", v, e),
            }),
        }
    }
    if let Some(v) = get(ENV_DEFAULT_AGENT_ID) {
        match v.trim().parse() {
            Ok(id) => config.workflow.default_agent_id = Some(id),
            Err(e) => errors.push(ValidationError::Invalid {
                field: ENV_DEFAULT_AGENT_ID,
                reason: format!("{}: {}", v, e),
            }),
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn full_env() -> HashMap<String, String> {
        env(&[
            (ENV_RPC_URL, "http://localhost:8545"),
            (ENV_IDENTITY_REGISTRY, "0x0000000000000000000000000000000000000001"),
            (ENV_VALIDATION_REGISTRY, "0x0000000000000000000000000000000000000002"),
            (ENV_STAKING_VALIDATOR, "0x0000000000000000000000000000000000000003"),
            (ENV_STAKE_TOKEN, "0x0000000000000000000000000000000000000004"),
            (
                ENV_PRIVATE_KEY,
                "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
            ),
        ])
    }

    #[test]
    fn test_env_only_config_resolves() {
        let vars = full_env();
        let resolved = resolve_config(AppConfig::default(), |k| vars.get(k).cloned()).unwrap();
        assert_eq!(resolved.network.chain_id, 11_155_111);
        assert_eq!(resolved.workflow.default_agent_id, None);
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [network]
            rpc_url = "http://file-node:8545"
            chain_id = 1

            [workflow]
            stage_delay_secs = 0
            "#
        )
        .unwrap();
        let config = read_config_file(file.path()).unwrap();

        let mut vars = full_env();
        vars.insert(ENV_CHAIN_ID.to_string(), "31337".to_string());
        vars.insert(ENV_DEFAULT_AGENT_ID.to_string(), "377".to_string());

        let resolved = resolve_config(config, |k| vars.get(k).cloned()).unwrap();
        assert_eq!(resolved.rpc_url.as_str(), "http://localhost:8545/");
        assert_eq!(resolved.network.chain_id, 31337);
        assert_eq!(resolved.workflow.default_agent_id, Some(377));
        assert_eq!(resolved.workflow.stage_delay_secs, 0);
    }

    #[test]
    fn test_missing_values_are_enumerated() {
        let vars = env(&[(ENV_RPC_URL, "http://localhost:8545"), (ENV_STAKE_TOKEN, "")]);
        let err = resolve_config(AppConfig::default(), |k| vars.get(k).cloned()).unwrap_err();
        assert_eq!(
            err.missing(),
            vec![
                ENV_IDENTITY_REGISTRY,
                ENV_VALIDATION_REGISTRY,
                ENV_STAKING_VALIDATOR,
                ENV_STAKE_TOKEN,
                ENV_PRIVATE_KEY,
            ]
        );
        let msg = err.to_string();
        assert!(msg.contains("missing ERC8004_ADMIN_PRIVATE_KEY"));
    }

    #[test]
    fn test_bad_chain_id_is_reported() {
        let mut vars = full_env();
        vars.insert(ENV_CHAIN_ID.to_string(), "sepolia".to_string());
        let err = resolve_config(AppConfig::default(), |k| vars.get(k).cloned()).unwrap_err();
        assert!(err.to_string().contains(ENV_CHAIN_ID));
    }

    #[test]
    fn test_unparseable_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[network\nrpc_url = ").unwrap();
        assert!(matches!(
            read_config_file(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }
}
