//! Stream ingestor for bulk debtor ledger files.
//!
//! Consumes an uploaded byte stream chunk by chunk, reassembles lines
//! across chunk boundaries, parses and aggregates each record, records
//! per-line failures without aborting the run, uploads the raw bytes to
//! blob storage, and dispatches batched debtor update events to the
//! message queue.

pub mod dispatcher;
pub mod error;
pub mod ingestor;

pub use dispatcher::{DEFAULT_BATCH_SIZE, DispatcherStats, UpdateDispatcher};
pub use error::{IngestorError, Result};
pub use ingestor::{CHUNK_SIZE, IngestOptions, IngestReport, IngestRequest, StreamIngestor};
