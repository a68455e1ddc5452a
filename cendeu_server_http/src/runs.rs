use axum::extract::{Path, State};
use axum::response::{IntoResponse, Json, Response};

use cendeu_core::import::ImportRun;

use crate::ImportServerState;
use crate::error::{ImportServerError, Result, map_error_to_response};
use crate::types::{ErrorsResponse, RunResponse};

/// Handler for the `GET /v1/imports/{run_id}` endpoint.
pub async fn get_run_handler(
    State(state): State<ImportServerState>,
    Path(run_id): Path<String>,
) -> Response {
    match fetch_run(&state, &run_id).await {
        Ok(run) => Json(RunResponse::from(run)).into_response(),
        Err(err) => map_error_to_response(err),
    }
}

/// Handler for the `GET /v1/imports/{run_id}/errors` endpoint.
pub async fn list_errors_handler(
    State(state): State<ImportServerState>,
    Path(run_id): Path<String>,
) -> Response {
    match list_run_errors(&state, &run_id).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => map_error_to_response(err),
    }
}

async fn fetch_run(state: &ImportServerState, run_id: &str) -> Result<ImportRun> {
    state
        .imports
        .get_run(run_id)
        .await
        .map_err(|err| ImportServerError::Internal {
            message: format!("failed to load run {run_id}: {err}"),
        })?
        .ok_or_else(|| ImportServerError::RunNotFound {
            run_id: run_id.to_string(),
        })
}

async fn list_run_errors(state: &ImportServerState, run_id: &str) -> Result<ErrorsResponse> {
    let run = fetch_run(state, run_id).await?;

    let errors = state
        .imports
        .list_errors(&run.id)
        .await
        .map_err(|err| ImportServerError::Internal {
            message: format!("failed to load errors for run {run_id}: {err}"),
        })?;

    Ok(ErrorsResponse {
        run_id: run.id,
        errors: errors.into_iter().map(Into::into).collect(),
    })
}
