//! JSON run report.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use alloy::primitives::TxHash;
use serde::Serialize;
use serde_json::{Map, Value};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

/// How a stage ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Success,
    Skipped,
    Failed,
}

/// One stage entry: status plus free-form details flattened beside it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageReport {
    pub status: StageStatus,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl StageReport {
    /// `details` must be a JSON object; other values are stored under `"value"`.
    pub fn new(status: StageStatus, details: Value) -> Self {
        let details = match details {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        Self { status, details }
    }

    pub fn success(details: Value) -> Self {
        Self::new(StageStatus::Success, details)
    }

    pub fn skipped(reason: &str, mut details: Value) -> Self {
        if let Value::Object(map) = &mut details {
            map.insert("reason".to_string(), Value::from(reason));
        } else {
            details = serde_json::json!({ "reason": reason });
        }
        Self::new(StageStatus::Skipped, details)
    }

    pub fn failed(error: &str) -> Self {
        Self::new(StageStatus::Failed, serde_json::json!({ "error": error }))
    }
}

/// A transaction sent during the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRecord {
    pub name: String,
    pub tx_hash: TxHash,
    pub explorer_url: String,
}

/// Everything a run did, written once at the end.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    /// RFC 3339 start time.
    pub test_time: String,
    /// Keyed `stageN_name`, so map order is stage order.
    pub stages: BTreeMap<String, StageReport>,
    pub transactions: Vec<TransactionRecord>,
}

impl RunReport {
    pub fn new() -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            run_id: Uuid::new_v4(),
            test_time: now
                .format(&Rfc3339)
                .unwrap_or_else(|_| now.unix_timestamp().to_string()),
            stages: BTreeMap::new(),
            transactions: Vec::new(),
        }
    }

    pub fn record_stage(&mut self, stage: &str, report: StageReport) {
        tracing::debug!(stage, status = ?report.status, "Stage recorded");
        self.stages.insert(stage.to_string(), report);
    }

    /// Record a transaction with a link under `explorer_tx_url`.
    pub fn record_transaction(&mut self, name: &str, tx_hash: TxHash, explorer_tx_url: &str) -> &TransactionRecord {
        self.transactions.push(TransactionRecord {
            name: name.to_string(),
            tx_hash,
            explorer_url: format!("{}{}", explorer_tx_url, tx_hash),
        });
        &self.transactions[self.transactions.len() - 1]
    }

    pub fn stage(&self, stage: &str) -> Option<&StageReport> {
        self.stages.get(stage)
    }

    /// True when no stage failed.
    pub fn succeeded(&self) -> bool {
        self.stages.values().all(|s| s.status != StageStatus::Failed)
    }

    /// Write pretty-printed JSON to `path`, replacing any previous report.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_vec_pretty(self)?;
        fs::write(path, json)?;
        tracing::info!(path = %path.display(), stages = self.stages.len(), "Run report saved");
        Ok(())
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}
