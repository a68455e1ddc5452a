//! In-memory implementations of the store traits.
//!
//! Primarily intended for testing and development. Both stores expose a
//! failure toggle so tests can simulate an unreachable backend without
//! touching the pipeline code.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::{DashMap, DashSet};

use cendeu_core::import::{
    ImportError, ImportRun, ImportedRecord, NewImportError, NewImportRun, RunOutcome, RunStatus,
};
use cendeu_core::{Cuit, DebtorAggregate, ValidDebtorUpdate};

use crate::debtors::{DebtorStore, UpdateOutcome};
use crate::error::{StoreError, StoreResult};
use crate::imports::ImportStore;

/// In-memory debtor aggregate store.
///
/// Mutation goes through the dashmap entry API, which gives the atomic
/// per-key read-modify-write the merge rule relies on.
#[derive(Debug, Default)]
pub struct InMemoryDebtorStore {
    aggregates: DashMap<Cuit, DebtorAggregate>,
    seen: DashSet<(String, u64)>,
    unavailable: AtomicBool,
}

impl InMemoryDebtorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                message: "debtor store is unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DebtorStore for InMemoryDebtorStore {
    async fn apply_update(&self, update: &ValidDebtorUpdate) -> StoreResult<UpdateOutcome> {
        self.check_available()?;

        let key = (update.run_id.clone(), update.line_number);
        if !self.seen.insert(key) {
            return Ok(UpdateOutcome::Duplicate);
        }

        let entry = self
            .aggregates
            .entry(update.cuit.clone())
            .and_modify(|aggregate| {
                *aggregate = DebtorAggregate::merge(
                    Some(aggregate),
                    &update.cuit,
                    update.severity,
                    update.amount,
                );
            })
            .or_insert_with(|| {
                DebtorAggregate::merge(None, &update.cuit, update.severity, update.amount)
            });

        Ok(UpdateOutcome::Applied(entry.value().clone()))
    }

    async fn get(&self, cuit: &Cuit) -> StoreResult<Option<DebtorAggregate>> {
        self.check_available()?;
        Ok(self.aggregates.get(cuit).map(|entry| entry.value().clone()))
    }

    async fn len(&self) -> StoreResult<usize> {
        self.check_available()?;
        Ok(self.aggregates.len())
    }
}

/// In-memory import run tracker, error sink, and audit trail.
#[derive(Debug, Default)]
pub struct InMemoryImportStore {
    runs: DashMap<String, ImportRun>,
    errors: Mutex<Vec<ImportError>>,
    audit: Mutex<Vec<ImportedRecord>>,
    unavailable: AtomicBool,
}

impl InMemoryImportStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// All runs currently tracked, in unspecified order.
    pub fn runs(&self) -> Vec<ImportRun> {
        self.runs.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Audit records written for a run, in insertion order.
    pub fn audit_records(&self, run_id: &str) -> Vec<ImportedRecord> {
        self.audit
            .lock()
            .expect("audit lock poisoned")
            .iter()
            .filter(|record| record.run_id == run_id)
            .cloned()
            .collect()
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                message: "import store is unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ImportStore for InMemoryImportStore {
    async fn create_run(&self, run: NewImportRun) -> StoreResult<ImportRun> {
        self.check_available()?;

        let run = ImportRun {
            id: ulid::Ulid::new().to_string(),
            file_name: run.file_name,
            blob_key: run.blob_key,
            status: RunStatus::InProgress,
            processed_lines: 0,
            error_count: 0,
            started_at: Utc::now(),
            size_bytes: 0,
        };
        self.runs.insert(run.id.clone(), run.clone());

        Ok(run)
    }

    async fn finalize_run(&self, run_id: &str, outcome: RunOutcome) -> StoreResult<ImportRun> {
        self.check_available()?;

        let Some(mut entry) = self.runs.get_mut(run_id) else {
            return Err(StoreError::RunNotFound {
                run_id: run_id.to_string(),
            });
        };

        if entry.status.is_terminal() {
            return Err(StoreError::RunAlreadyFinalized {
                run_id: run_id.to_string(),
                status: entry.status,
            });
        }

        entry.status = outcome.status;
        entry.processed_lines = outcome.processed_lines;
        entry.error_count = outcome.error_count;
        entry.size_bytes = outcome.size_bytes;

        Ok(entry.value().clone())
    }

    async fn record_error(&self, error: NewImportError) -> StoreResult<ImportError> {
        self.check_available()?;

        let error = ImportError {
            id: ulid::Ulid::new().to_string(),
            run_id: error.run_id,
            line_number: error.line_number,
            raw_content: error.raw_content,
            message: error.message,
            category: error.category,
        };
        self.errors
            .lock()
            .expect("error sink lock poisoned")
            .push(error.clone());

        Ok(error)
    }

    async fn record_imported(&self, record: ImportedRecord) -> StoreResult<()> {
        self.check_available()?;
        self.audit
            .lock()
            .expect("audit lock poisoned")
            .push(record);
        Ok(())
    }

    async fn get_run(&self, run_id: &str) -> StoreResult<Option<ImportRun>> {
        self.check_available()?;
        Ok(self.runs.get(run_id).map(|entry| entry.value().clone()))
    }

    async fn list_errors(&self, run_id: &str) -> StoreResult<Vec<ImportError>> {
        self.check_available()?;
        Ok(self
            .errors
            .lock()
            .expect("error sink lock poisoned")
            .iter()
            .filter(|error| error.run_id == run_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cendeu_core::import::ErrorCategory;

    fn update(run_id: &str, line_number: u64, severity: u8, amount: u64) -> ValidDebtorUpdate {
        ValidDebtorUpdate {
            cuit: Cuit::new_unchecked("20003905528"),
            severity,
            amount,
            run_id: run_id.to_string(),
            line_number,
        }
    }

    #[tokio::test]
    async fn test_apply_update_merges() {
        let store = InMemoryDebtorStore::new();

        store.apply_update(&update("run-1", 1, 3, 100)).await.unwrap();
        store.apply_update(&update("run-1", 2, 5, 50)).await.unwrap();

        let aggregate = store
            .get(&Cuit::new_unchecked("20003905528"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(aggregate.max_severity, 5);
        assert_eq!(aggregate.total_loan_amount, 150);
    }

    #[tokio::test]
    async fn test_replayed_update_is_skipped() {
        let store = InMemoryDebtorStore::new();

        let first = store.apply_update(&update("run-1", 1, 3, 100)).await.unwrap();
        assert!(matches!(first, UpdateOutcome::Applied(_)));

        let replay = store.apply_update(&update("run-1", 1, 3, 100)).await.unwrap();
        assert_eq!(replay, UpdateOutcome::Duplicate);

        let aggregate = store
            .get(&Cuit::new_unchecked("20003905528"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(aggregate.total_loan_amount, 100);
    }

    #[tokio::test]
    async fn test_unavailable_store_fails() {
        let store = InMemoryDebtorStore::new();
        store.set_unavailable(true);

        let result = store.apply_update(&update("run-1", 1, 3, 100)).await;
        assert!(matches!(result, Err(StoreError::Unavailable { .. })));
    }

    #[tokio::test]
    async fn test_finalize_run_exactly_once() {
        let store = InMemoryImportStore::new();
        let run = store
            .create_run(NewImportRun {
                file_name: "ledger.txt".to_string(),
                blob_key: "imports/ledger.txt".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(run.status, RunStatus::InProgress);

        let outcome = RunOutcome {
            status: RunStatus::Completed,
            processed_lines: 10,
            error_count: 2,
            size_bytes: 512,
        };
        let finalized = store.finalize_run(&run.id, outcome).await.unwrap();
        assert_eq!(finalized.status, RunStatus::Completed);
        assert_eq!(finalized.processed_lines, 10);

        let again = store.finalize_run(&run.id, outcome).await;
        assert!(matches!(
            again,
            Err(StoreError::RunAlreadyFinalized { .. })
        ));
    }

    #[tokio::test]
    async fn test_error_sink_preserves_order() {
        let store = InMemoryImportStore::new();
        let run = store
            .create_run(NewImportRun {
                file_name: "ledger.txt".to_string(),
                blob_key: "imports/ledger.txt".to_string(),
            })
            .await
            .unwrap();

        for line_number in [3, 7] {
            store
                .record_error(NewImportError {
                    run_id: run.id.clone(),
                    line_number,
                    raw_content: format!("bad line {line_number}"),
                    message: "header token too short".to_string(),
                    category: ErrorCategory::Parsing,
                })
                .await
                .unwrap();
        }

        let errors = store.list_errors(&run.id).await.unwrap();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].line_number, 3);
        assert_eq!(errors[1].line_number, 7);
    }
}
