//! HTTP surface for the debtor ledger import pipeline.
//!
//! Exposes `POST /v1/imports` for multipart ledger uploads and read
//! endpoints to inspect a run and its recorded line errors.

pub mod error;
pub mod runs;
pub mod types;
pub mod upload;

pub use error::{ImportServerError, Result};
pub use types::{ErrorResponse, ErrorsResponse, ImportErrorItem, RunResponse, UploadResponse};

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tokio_util::sync::CancellationToken;

use cendeu_ingestor::StreamIngestor;
use cendeu_store::ImportStore;

use crate::runs::{get_run_handler, list_errors_handler};
use crate::upload::upload_handler;

/// Largest accepted upload by default. Bulk ledger files run to
/// gigabytes.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024 * 1024;

/// Tunable settings for the import server.
#[derive(Debug, Clone)]
pub struct ImportServerOptions {
    /// Request body ceiling. Uploads beyond it are rejected with 413.
    pub max_upload_bytes: usize,
}

impl Default for ImportServerOptions {
    fn default() -> Self {
        Self {
            max_upload_bytes: MAX_UPLOAD_BYTES,
        }
    }
}

/// HTTP import server that receives ledger files via multipart POST.
pub struct ImportServer {
    state: ImportServerState,
    options: ImportServerOptions,
}

#[derive(Clone)]
pub struct ImportServerState {
    ingestor: Arc<StreamIngestor>,
    imports: Arc<dyn ImportStore>,
    ct: CancellationToken,
}

impl ImportServer {
    /// Create a new import server.
    ///
    /// Uploads in flight are aborted when `ct` is cancelled.
    pub fn new(
        ingestor: Arc<StreamIngestor>,
        imports: Arc<dyn ImportStore>,
        options: ImportServerOptions,
        ct: CancellationToken,
    ) -> Self {
        let state = ImportServerState {
            ingestor,
            imports,
            ct,
        };

        Self { state, options }
    }

    pub fn into_router(self) -> Router {
        Router::new()
            .route("/v1/imports", post(upload_handler))
            .route("/v1/imports/{run_id}", get(get_run_handler))
            .route("/v1/imports/{run_id}/errors", get(list_errors_handler))
            .layer(DefaultBodyLimit::max(self.options.max_upload_bytes))
            .with_state(self.state)
    }
}
