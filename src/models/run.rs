// Operation results and per-run aggregation

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ResourceSummary;

/// Operation-specific counters (e.g. documents imported), keyed by name.
/// BTreeMap keeps both report formats deterministic.
pub type Extra = BTreeMap<String, serde_json::Value>;

/// Timing plus resource summary for one benchmarked operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult {
    pub operation_name: String,
    pub duration_seconds: f64,
    pub resource_summary: ResourceSummary,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: Extra,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum RunError {
    #[error("benchmark run is already finalized")]
    AlreadyFinalized,
    #[error("benchmark run is not finalized")]
    NotFinalized,
}

/// Ordered operation results for one database/dataset pair.
/// Grows by append only; frozen once finalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkRun {
    pub database_name: String,
    pub dataset_name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub results: Vec<OperationResult>,
    /// Set when an operation failure aborted the remaining lifecycle steps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BenchmarkRun {
    pub fn new(database_name: impl Into<String>, dataset_name: impl Into<String>) -> Self {
        Self {
            database_name: database_name.into(),
            dataset_name: dataset_name.into(),
            started_at: Utc::now(),
            finished_at: None,
            results: Vec::new(),
            error: None,
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.finished_at.is_some()
    }

    /// Append one result in arrival order. Never reorders or deduplicates.
    pub fn append(&mut self, result: OperationResult) -> Result<(), RunError> {
        if self.is_finalized() {
            return Err(RunError::AlreadyFinalized);
        }
        self.results.push(result);
        Ok(())
    }

    /// Record the failure that aborted this run.
    pub fn record_error(&mut self, error: impl Into<String>) -> Result<(), RunError> {
        if self.is_finalized() {
            return Err(RunError::AlreadyFinalized);
        }
        self.error = Some(error.into());
        Ok(())
    }

    /// Set `finished_at` and freeze the run.
    pub fn finalize(&mut self) -> Result<(), RunError> {
        if self.is_finalized() {
            return Err(RunError::AlreadyFinalized);
        }
        self.finished_at = Some(Utc::now());
        Ok(())
    }
}
