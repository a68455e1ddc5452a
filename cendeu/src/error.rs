use std::net::AddrParseError;

use snafu::Snafu;

use cendeu_consumer::ConsumerError;
use cendeu_ingestor::IngestorError;
use cendeu_store::StoreError;

/// CLI error types.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum CliError {
    #[snafu(display("Invalid server address"))]
    InvalidServerAddress { source: AddrParseError },
    #[snafu(display("Object store error"))]
    ObjectStore { source: object_store::Error },
    #[snafu(display("IO error"))]
    Io { source: std::io::Error },
    #[snafu(display("Import failed"))]
    Ingest { source: IngestorError },
    #[snafu(display("Consumer failed"))]
    Consume { source: ConsumerError },
    #[snafu(display("Store operation failed"))]
    Store { source: StoreError },
}

pub type Result<T, E = CliError> = std::result::Result<T, E>;
