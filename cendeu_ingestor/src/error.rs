use std::sync::Arc;

use cendeu_store::StoreError;
use snafu::Snafu;

/// Ingestor error types.
///
/// These cover infrastructure-level failures only: a malformed line is
/// not an error at this level, it is recorded in the error sink and the
/// run continues.
#[derive(Debug, Clone, Snafu)]
#[snafu(visibility(pub))]
pub enum IngestorError {
    /// Import store (run tracker, error sink, audit trail) failure.
    #[snafu(display("import store error: {message}"))]
    Store {
        message: &'static str,
        source: StoreError,
    },
    /// Blob store failure while uploading the raw file.
    #[snafu(display("blob store error: {message}"))]
    BlobStore {
        message: &'static str,
        #[snafu(source(from(object_store::Error, Arc::new)))]
        source: Arc<object_store::Error>,
    },
    /// The upload stream itself failed mid-transfer.
    #[snafu(display("failed to read upload stream: {message}"))]
    StreamRead { message: String },
    /// The run was cancelled externally.
    #[snafu(display("ingestion cancelled"))]
    Cancelled,
}

pub type Result<T, E = IngestorError> = std::result::Result<T, E>;
