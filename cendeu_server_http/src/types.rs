use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cendeu_core::import::{ErrorCategory, ImportError, ImportRun, RunStatus};

/// Response body for a successful ledger upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    pub run_id: String,
    pub blob_key: String,
    pub processed_lines: u64,
    pub error_count: u64,
    pub size_bytes: u64,
    pub processing_time_ms: u64,
}

/// Response body describing one import run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResponse {
    pub run_id: String,
    pub file_name: String,
    pub blob_key: String,
    pub status: RunStatus,
    pub processed_lines: u64,
    pub error_count: u64,
    pub started_at: DateTime<Utc>,
    pub size_bytes: u64,
}

impl From<ImportRun> for RunResponse {
    fn from(run: ImportRun) -> Self {
        Self {
            run_id: run.id,
            file_name: run.file_name,
            blob_key: run.blob_key,
            status: run.status,
            processed_lines: run.processed_lines,
            error_count: run.error_count,
            started_at: run.started_at,
            size_bytes: run.size_bytes,
        }
    }
}

/// One recorded line failure of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportErrorItem {
    pub line_number: u64,
    pub raw_content: String,
    pub message: String,
    pub category: ErrorCategory,
}

impl From<ImportError> for ImportErrorItem {
    fn from(error: ImportError) -> Self {
        Self {
            line_number: error.line_number,
            raw_content: error.raw_content,
            message: error.message,
            category: error.category,
        }
    }
}

/// Response body for a run's error listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorsResponse {
    pub run_id: String,
    pub errors: Vec<ImportErrorItem>,
}

/// Error response returned for failed requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}
