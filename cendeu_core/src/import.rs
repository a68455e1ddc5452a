//! Import run lifecycle records and the per-line error sink types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of one ingestion run.
///
/// `InProgress -> Completed` and `InProgress -> Failed` are the only
/// transitions; both targets are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    InProgress,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }
}

/// One execution of the ingestion pipeline over one uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRun {
    pub id: String,
    pub file_name: String,
    pub blob_key: String,
    pub status: RunStatus,
    pub processed_lines: u64,
    pub error_count: u64,
    pub started_at: DateTime<Utc>,
    pub size_bytes: u64,
}

/// Request to create a new import run, before any line is processed.
#[derive(Debug, Clone)]
pub struct NewImportRun {
    pub file_name: String,
    pub blob_key: String,
}

/// Final counts and status for a run, applied exactly once.
#[derive(Debug, Clone, Copy)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub processed_lines: u64,
    pub error_count: u64,
    pub size_bytes: u64,
}

/// Classification of a recorded import failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Parsing,
    Validation,
    Persistence,
}

/// An append-only record of one failed line. Never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportError {
    pub id: String,
    pub run_id: String,
    pub line_number: u64,
    pub raw_content: String,
    pub message: String,
    pub category: ErrorCategory,
}

/// Request to append one failure to the error sink.
#[derive(Debug, Clone)]
pub struct NewImportError {
    pub run_id: String,
    pub line_number: u64,
    pub raw_content: String,
    pub message: String,
    pub category: ErrorCategory,
}

/// Audit record of one successfully parsed line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedRecord {
    pub run_id: String,
    pub line_number: u64,
    pub cuit: String,
    pub entity_code: String,
    pub info_date: String,
    pub id_type: String,
    pub activity_code: String,
    pub severity: u8,
    pub loan_amount: u64,
}
