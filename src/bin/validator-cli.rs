use std::path::{Path, PathBuf};

use alloy::primitives::{Address, B256, U256};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use erc8004_validator::blockchain::{BlockchainClient, Submission, TokenAmount, WaitMode};
use erc8004_validator::config::load_config;
use erc8004_validator::identity::MetadataItem;
use erc8004_validator::observability::logging;
use erc8004_validator::validation::{digest, tag_digest};
use erc8004_validator::ProtocolClient;

#[derive(Parser)]
#[command(name = "validator-cli")]
#[command(about = "Operator CLI for the ERC-8004 staking validator", long_about = None)]
struct Cli {
    /// TOML configuration file; ERC8004_* environment variables override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Return after broadcast instead of waiting for the receipt
    #[arg(long, global = true)]
    no_wait: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the request hash (and tag hash) for a payload, offline
    Digest {
        payload: String,
        #[arg(long)]
        tag: Option<String>,
    },
    #[command(flatten)]
    Chain(ChainCommand),
}

/// Commands that need a connected client.
#[derive(Subcommand)]
enum ChainCommand {
    /// Show a validator's stake, rewards and validation count
    Info {
        /// Defaults to the operator address
        #[arg(long)]
        validator: Option<Address>,
    },
    /// Show staking contract totals
    Stats,
    /// Show the stored state of a validation request
    Status { request_hash: B256 },
    /// Show an agent's token URI and metadata
    Agent {
        agent_id: U256,
        /// Metadata keys to read
        #[arg(long = "key", default_values_t = ["agentType".to_string(), "createdBy".to_string(), "version".to_string()])]
        keys: Vec<String>,
    },
    /// Register the operator as an agent
    Register {
        token_uri: String,
        /// Metadata entry as key=value; repeatable
        #[arg(long = "meta", value_parser = parse_metadata)]
        metadata: Vec<MetadataItem>,
    },
    /// Approve and stake tokens, e.g. `stake 100` or `stake 12.5`
    Stake { amount: String },
    /// Claim pending rewards
    Claim,
    /// Request unstaking, or withdraw with --withdraw after the unbonding period
    Unstake {
        #[arg(long)]
        withdraw: bool,
    },
}

fn parse_metadata(raw: &str) -> Result<MetadataItem, String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    if key.is_empty() {
        return Err("metadata key must not be empty".to_string());
    }
    Ok(MetadataItem::text(key, value))
}

fn submission_json(submission: &Submission) -> Value {
    match submission {
        Submission::Broadcast { tx_hash } => json!({ "tx_hash": tx_hash, "status": "broadcast" }),
        Submission::Confirmed(outcome) => json!({
            "tx_hash": outcome.tx_hash,
            "status": "confirmed",
            "gas_used": outcome.gas_used,
            "block_number": outcome.block_number,
        }),
    }
}

fn digest_json(payload: &str, tag: Option<&str>) -> Value {
    let mut out = json!({ "payload": payload, "request_hash": digest(payload) });
    if let Some(tag) = tag {
        out["tag_hash"] = json!(tag_digest(tag));
    }
    out
}

async fn run_on_chain(
    command: ChainCommand,
    config_path: Option<&Path>,
    no_wait: bool,
) -> Result<Value, Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    logging::init(&config.observability);

    let client: ProtocolClient<BlockchainClient> = ProtocolClient::connect(&config).await?;
    let wait = if no_wait {
        WaitMode::FireAndForget
    } else {
        WaitMode::receipt_secs(config.workflow.receipt_timeout_secs)
    };
    let validation = client.validation();
    let identity = client.identity();

    let output = match command {
        ChainCommand::Info { validator } => {
            let address = validator.unwrap_or_else(|| client.address());
            let info = validation.validator_info(Some(address)).await?;
            json!({ "validator": address, "info": info })
        }
        ChainCommand::Stats => serde_json::to_value(validation.staking_stats().await?)?,
        ChainCommand::Status { request_hash } => {
            serde_json::to_value(validation.validation_status(request_hash).await?)?
        }
        ChainCommand::Agent { agent_id, keys } => {
            let token_uri = identity.token_uri(agent_id).await?;
            let mut metadata = serde_json::Map::new();
            for key in keys {
                let value = identity.metadata_decoded(agent_id, &key).await?;
                metadata.insert(key, Value::from(value));
            }
            json!({ "agent_id": agent_id.to_string(), "token_uri": token_uri, "metadata": metadata })
        }
        ChainCommand::Register { token_uri, metadata } => {
            let registration = identity.register_agent(&token_uri, &metadata, wait).await?;
            json!({
                "agent_id": registration.agent_id.map(|id| id.to_string()),
                "tx_hash": registration.tx_hash,
            })
        }
        ChainCommand::Stake { amount } => {
            let amount = TokenAmount::parse_tokens(&amount)?;
            let receipt = validation.stake_tokens(amount, wait).await?;
            json!({
                "amount": amount,
                "approve_tx": receipt.approve_tx,
                "stake": submission_json(&receipt.stake),
            })
        }
        ChainCommand::Claim => submission_json(&validation.claim_rewards(wait).await?),
        ChainCommand::Unstake { withdraw } => {
            let submission = if withdraw {
                validation.unstake(wait).await?
            } else {
                validation.request_unstake(wait).await?
            };
            submission_json(&submission)
        }
    };
    Ok(output)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let output = match cli.command {
        Commands::Digest { payload, tag } => digest_json(&payload, tag.as_deref()),
        Commands::Chain(command) => run_on_chain(command, cli.config.as_deref(), cli.no_wait).await?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_parses_as_offline_command() {
        let cli = Cli::try_parse_from(["validator-cli", "digest", "hello", "--tag", "quality"]).unwrap();
        match cli.command {
            Commands::Digest { payload, tag } => {
                let out = digest_json(&payload, tag.as_deref());
                assert_eq!(out["request_hash"], json!(digest("hello")));
                assert_eq!(out["tag_hash"], json!(tag_digest("quality")));
            }
            Commands::Chain(_) => panic!("digest must not need a chain connection"),
        }
    }

    #[test]
    fn test_chain_commands_parse() {
        let cli = Cli::try_parse_from(["validator-cli", "--no-wait", "unstake", "--withdraw"]).unwrap();
        assert!(cli.no_wait);
        assert!(matches!(cli.command, Commands::Chain(ChainCommand::Unstake { withdraw: true })));

        let cli = Cli::try_parse_from(["validator-cli", "digest", "x"]).unwrap();
        assert!(matches!(cli.command, Commands::Digest { tag: None, .. }));
    }
}
