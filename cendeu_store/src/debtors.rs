//! The persisted debtor aggregate store trait.

use async_trait::async_trait;
use cendeu_core::{Cuit, DebtorAggregate, ValidDebtorUpdate};

use crate::error::StoreResult;

/// Result of applying one update to the aggregate store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The update was merged into the debtor's aggregate.
    Applied(DebtorAggregate),
    /// The update's idempotency key was seen before; nothing changed.
    Duplicate,
}

/// The persisted per-debtor aggregate store.
///
/// Implementations must make `apply_update` atomic per cuit: the merge
/// rule is commutative, so no further coordination is required even with
/// concurrent consumer workers.
#[async_trait]
pub trait DebtorStore: Send + Sync {
    /// Merge one validated update into the debtor's aggregate.
    ///
    /// The `(run_id, line_number)` pair on the update is an idempotency
    /// key: an update replayed through queue redelivery must be detected
    /// and skipped instead of double-counted.
    async fn apply_update(&self, update: &ValidDebtorUpdate) -> StoreResult<UpdateOutcome>;

    /// Look up the aggregate for one debtor.
    async fn get(&self, cuit: &Cuit) -> StoreResult<Option<DebtorAggregate>>;

    /// Number of debtors with an aggregate.
    async fn len(&self) -> StoreResult<usize>;
}
