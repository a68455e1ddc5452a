//! The import run tracker and error sink trait.

use async_trait::async_trait;
use cendeu_core::import::{ImportError, ImportRun, ImportedRecord, NewImportError, NewImportRun, RunOutcome};

use crate::error::StoreResult;

/// Store for import run lifecycle records, the append-only error sink,
/// and the per-line audit trail.
#[async_trait]
pub trait ImportStore: Send + Sync {
    /// Create a run in the `InProgress` state.
    async fn create_run(&self, run: NewImportRun) -> StoreResult<ImportRun>;

    /// Finalize a run to a terminal status with its final counts.
    ///
    /// A run is finalized exactly once; finalizing a terminal run is an
    /// error.
    async fn finalize_run(&self, run_id: &str, outcome: RunOutcome) -> StoreResult<ImportRun>;

    /// Append one failure to the error sink.
    async fn record_error(&self, error: NewImportError) -> StoreResult<ImportError>;

    /// Append the audit record for one successfully parsed line.
    async fn record_imported(&self, record: ImportedRecord) -> StoreResult<()>;

    /// Look up a run by id.
    async fn get_run(&self, run_id: &str) -> StoreResult<Option<ImportRun>>;

    /// Errors recorded for a run, in insertion order.
    async fn list_errors(&self, run_id: &str) -> StoreResult<Vec<ImportError>>;
}
