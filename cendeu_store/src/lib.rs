//! Capability traits for the persisted stores, plus in-memory
//! implementations.
//!
//! The pipeline never constructs a vendor client directly: the ingestor
//! and consumer receive `Arc<dyn DebtorStore>` / `Arc<dyn ImportStore>`
//! and stay agnostic of the storage engine. The in-memory
//! implementations back dev mode and every test in the workspace.

pub mod debtors;
pub mod error;
pub mod imports;
pub mod memory;

pub use debtors::{DebtorStore, UpdateOutcome};
pub use error::{StoreError, StoreResult};
pub use imports::ImportStore;
pub use memory::{InMemoryDebtorStore, InMemoryImportStore};
