use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use tracing::info;

use cendeu_ingestor::IngestRequest;

use crate::ImportServerState;
use crate::error::{ImportServerError, Result, map_error_to_response};
use crate::types::UploadResponse;

/// Content types accepted for the uploaded ledger file. Parts without a
/// declared content type are treated as octet streams.
const ALLOWED_CONTENT_TYPES: &[&str] = &["text/plain", "text/csv", "application/octet-stream"];

const DEFAULT_FILE_NAME: &str = "upload.txt";

/// Handler for the `POST /v1/imports` endpoint.
pub async fn upload_handler(
    State(state): State<ImportServerState>,
    multipart: Multipart,
) -> Response {
    match process_upload(&state, multipart).await {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(err) => map_error_to_response(err),
    }
}

/// Locate the `file` part and pipe it into the ingestion pipeline.
async fn process_upload(
    state: &ImportServerState,
    mut multipart: Multipart,
) -> Result<UploadResponse> {
    while let Some(field) = multipart.next_field().await.map_err(map_multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        return ingest_field(state, field).await;
    }

    Err(ImportServerError::BadRequest {
        message: "missing multipart field 'file'".to_string(),
    })
}

/// The length-limit failure from the body ceiling arrives as a
/// multipart read error; keep its 413 status instead of flattening
/// every read failure to 400.
fn map_multipart_error(err: MultipartError) -> ImportServerError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ImportServerError::PayloadTooLarge {
            message: err.to_string(),
        }
    } else {
        ImportServerError::BadRequest {
            message: format!("invalid multipart body: {err}"),
        }
    }
}

async fn ingest_field(state: &ImportServerState, field: Field<'_>) -> Result<UploadResponse> {
    if let Some(content_type) = field.content_type() {
        if !ALLOWED_CONTENT_TYPES.contains(&content_type) {
            return Err(ImportServerError::UnsupportedMediaType {
                content_type: content_type.to_string(),
            });
        }
    }

    let file_name = field.file_name().unwrap_or(DEFAULT_FILE_NAME).to_string();
    info!(file_name = %file_name, "received ledger upload");

    let report = state
        .ingestor
        .process_stream(
            field,
            IngestRequest { file_name },
            state.ct.child_token(),
        )
        .await
        .map_err(|err| ImportServerError::Internal {
            message: format!("import failed: {err}"),
        })?;

    Ok(UploadResponse {
        message: "ledger file imported".to_string(),
        run_id: report.run_id,
        blob_key: report.blob_key,
        processed_lines: report.processed_lines,
        error_count: report.error_count,
        size_bytes: report.size_bytes,
        processing_time_ms: report.elapsed.as_millis() as u64,
    })
}
