//! Domain types for the debtor ledger ingestion pipeline.
//!
//! This crate is pure: no I/O, no async, no transport. It covers the
//! line parser for the regulator's ledger format, the per-debtor
//! aggregate merge rule, the import run lifecycle records, and the
//! queue payload schema shared by the producer and consumer sides.

pub mod aggregate;
pub mod cuit;
pub mod import;
pub mod parser;
pub mod payload;

pub use aggregate::DebtorAggregate;
pub use cuit::Cuit;
pub use import::{ErrorCategory, ImportRun, RunStatus};
pub use parser::{ParseError, ParsedRecord, parse_line};
pub use payload::{DebtorUpdate, DebtorUpdateBatch, ValidDebtorUpdate};
