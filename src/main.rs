//! validation-runner
//!
//! Runs the complete staking validation workflow once against the configured
//! deployment and writes a JSON report.
//!
//! ```text
//! config (TOML + ERC8004_* env) → connect → 7 stages → report → exit code
//! ```
//!
//! Exit codes: 0 all stages passed, 1 configuration or stage failure,
//! 130 interrupted.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use erc8004_validator::config::{load_config, ConfigError};
use erc8004_validator::observability::logging;
use erc8004_validator::workflow::{RunReport, StageStatus, ValidationWorkflow, WorkflowError};
use erc8004_validator::ProtocolClient;

const EXIT_FAILURE: u8 = 1;
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Parser)]
#[command(name = "validation-runner")]
#[command(about = "Run the ERC-8004 staking validation workflow", long_about = None)]
struct Cli {
    /// TOML configuration file; ERC8004_* environment variables override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use an existing agent instead of registering one
    #[arg(long)]
    agent_id: Option<u64>,

    /// Report output path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Seconds to pause between stages
    #[arg(long)]
    stage_delay: Option<u64>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            logging::init(&Default::default());
            report_config_error(&e);
            return ExitCode::from(EXIT_FAILURE);
        }
    };
    logging::init(&config.observability);

    if let Some(agent_id) = cli.agent_id {
        config.workflow.default_agent_id = Some(agent_id);
    }
    if let Some(report) = &cli.report {
        config.workflow.report_path = report.display().to_string();
    }
    if let Some(delay) = cli.stage_delay {
        config.workflow.stage_delay_secs = delay;
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        rpc_url = %config.rpc_url,
        chain_id = config.network.chain_id,
        "validation-runner starting"
    );

    let report_path = config.workflow.report_path.clone();
    let run = async {
        let client = ProtocolClient::connect(&config)
            .await
            .map_err(|source| WorkflowError::Chain {
                stage: "connect",
                source,
            })?;
        ValidationWorkflow::new(client, config.workflow.clone()).run().await
    };

    tokio::select! {
        result = run => match result {
            Ok(report) => {
                print_summary(&report, &report_path);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Validation run failed: {}", e);
                eprintln!("Report: {}", report_path);
                ExitCode::from(EXIT_FAILURE)
            }
        },
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted; transactions already broadcast may still be mined");
            ExitCode::from(EXIT_INTERRUPTED)
        }
    }
}

fn report_config_error(error: &ConfigError) {
    let missing = error.missing();
    if missing.is_empty() {
        eprintln!("Configuration error: {}", error);
    } else {
        eprintln!("Missing configuration: {}", missing.join(", "));
        eprintln!("Set them in the environment or in the file passed with --config.");
    }
}

fn print_summary(report: &RunReport, path: &str) {
    println!("Run {} completed", report.run_id);
    println!();
    println!("Stages:");
    for (stage, entry) in &report.stages {
        let status = match entry.status {
            StageStatus::Success => "success",
            StageStatus::Skipped => "skipped",
            StageStatus::Failed => "failed",
        };
        println!("  {:<28} {}", stage, status);
    }
    println!();
    println!("Transactions:");
    for tx in &report.transactions {
        println!("  {:<28} {}", tx.name, tx.explorer_url);
    }
    println!();
    println!("Report: {}", path);
}
