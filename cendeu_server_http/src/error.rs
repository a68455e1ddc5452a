use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::types::ErrorResponse;

/// Errors that can occur in the HTTP import server.
#[derive(Error, Debug)]
pub enum ImportServerError {
    #[error("bad request: {message}")]
    BadRequest { message: String },
    #[error("unsupported media type: {content_type}")]
    UnsupportedMediaType { content_type: String },
    #[error("payload too large: {message}")]
    PayloadTooLarge { message: String },
    #[error("import run not found: {run_id}")]
    RunNotFound { run_id: String },
    #[error("internal error: {message}")]
    Internal { message: String },
}

pub type Result<T, E = ImportServerError> = std::result::Result<T, E>;

pub(crate) fn map_error_to_response(error: ImportServerError) -> Response {
    let status_code = match error {
        ImportServerError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        ImportServerError::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        ImportServerError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        ImportServerError::RunNotFound { .. } => StatusCode::NOT_FOUND,
        ImportServerError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let response = Json(ErrorResponse {
        message: error.to_string(),
    });

    (status_code, response).into_response()
}
