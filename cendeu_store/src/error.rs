use cendeu_core::import::RunStatus;
use snafu::Snafu;

/// Errors related to the persisted store operations.
#[derive(Debug, Clone, Snafu)]
#[snafu(visibility(pub))]
pub enum StoreError {
    #[snafu(display("import run not found: {run_id}"))]
    RunNotFound { run_id: String },
    #[snafu(display("import run {run_id} already finalized as {status:?}"))]
    RunAlreadyFinalized { run_id: String, status: RunStatus },
    #[snafu(display("store unavailable: {message}"))]
    Unavailable { message: String },
}

pub type StoreResult<T, E = StoreError> = std::result::Result<T, E>;
