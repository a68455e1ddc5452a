use std::collections::HashMap;
use std::pin::pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::{Bytes, BytesMut};
use chrono::Utc;
use futures::{Stream, StreamExt};
use object_store::{PutMode, PutOptions, PutPayload, path::Path};
use snafu::ResultExt;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use cendeu_core::import::{
    ErrorCategory, ImportedRecord, NewImportError, NewImportRun, RunOutcome, RunStatus,
};
use cendeu_core::{Cuit, DebtorAggregate, DebtorUpdate, parse_line};
use cendeu_object_store::{BlobStoreFactory, format_blob_key};
use cendeu_queue::MessageQueue;
use cendeu_store::ImportStore;

use crate::dispatcher::{DEFAULT_BATCH_SIZE, DispatcherStats, UpdateDispatcher};
use crate::error::{BlobStoreSnafu, IngestorError, Result, StoreSnafu, StreamReadSnafu};

/// Chunk size used when reading local files into the pipeline.
///
/// Network transports deliver their own chunking; this only bounds the
/// CLI read path.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Options for one ingestion pipeline instance.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Number of update events per published queue message.
    pub batch_size: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Metadata accompanying one uploaded stream.
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub file_name: String,
}

/// Result of one completed ingestion run.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub run_id: String,
    pub blob_key: String,
    pub processed_lines: u64,
    pub error_count: u64,
    pub unique_debtors: u64,
    pub size_bytes: u64,
    pub elapsed: Duration,
    pub dispatcher_stats: DispatcherStats,
}

/// Orchestrates one ingestion run over an uploaded byte stream.
///
/// A run is strictly sequential over its lines (line numbering and
/// error attribution require input order); concurrent runs are
/// independent pipeline instances sharing nothing but the injected
/// stores.
pub struct StreamIngestor {
    blob_store_factory: Arc<dyn BlobStoreFactory>,
    imports: Arc<dyn ImportStore>,
    queue: Arc<dyn MessageQueue>,
    options: IngestOptions,
}

struct RunState {
    run_id: String,
    line_number: u64,
    processed_lines: u64,
    error_count: u64,
    size_bytes: u64,
    /// Trailing partial line carried across chunk boundaries.
    carry: Vec<u8>,
    /// Raw bytes retained for the blob upload at end-of-stream.
    content: BytesMut,
    /// Per-run in-memory aggregate state.
    aggregates: HashMap<Cuit, DebtorAggregate>,
    dispatcher: UpdateDispatcher,
}

impl StreamIngestor {
    pub fn new(
        blob_store_factory: Arc<dyn BlobStoreFactory>,
        imports: Arc<dyn ImportStore>,
        queue: Arc<dyn MessageQueue>,
        options: IngestOptions,
    ) -> Self {
        Self {
            blob_store_factory,
            imports,
            queue,
            options,
        }
    }

    /// Ingest one uploaded stream, finalizing exactly one import run.
    ///
    /// Per-line failures are recorded and never abort the run; any
    /// infrastructure failure (stores, blob upload, the stream itself)
    /// or cancellation finalizes the run as failed with whatever
    /// partial counts were accumulated and propagates.
    pub async fn process_stream<S, E>(
        &self,
        stream: S,
        request: IngestRequest,
        ct: CancellationToken,
    ) -> Result<IngestReport>
    where
        S: Stream<Item = std::result::Result<Bytes, E>>,
        E: std::fmt::Display,
    {
        let started = Instant::now();
        let blob_key = format_blob_key(Utc::now(), &request.file_name);

        let run = self
            .imports
            .create_run(NewImportRun {
                file_name: request.file_name.clone(),
                blob_key: blob_key.clone(),
            })
            .await
            .context(StoreSnafu {
                message: "failed to create import run",
            })?;

        info!(run_id = %run.id, file_name = %request.file_name, "starting ledger ingestion");

        let mut state = RunState {
            run_id: run.id.clone(),
            line_number: 0,
            processed_lines: 0,
            error_count: 0,
            size_bytes: 0,
            carry: Vec::new(),
            content: BytesMut::new(),
            aggregates: HashMap::new(),
            dispatcher: UpdateDispatcher::new(self.queue.clone(), self.options.batch_size),
        };

        match self.consume(stream, &mut state, &blob_key, ct).await {
            Ok(()) => {
                let run = self
                    .imports
                    .finalize_run(
                        &state.run_id,
                        RunOutcome {
                            status: RunStatus::Completed,
                            processed_lines: state.processed_lines,
                            error_count: state.error_count,
                            size_bytes: state.size_bytes,
                        },
                    )
                    .await
                    .context(StoreSnafu {
                        message: "failed to finalize import run",
                    })?;

                let dispatcher_stats = state.dispatcher.stats();
                info!(
                    run_id = %run.id,
                    processed_lines = state.processed_lines,
                    error_count = state.error_count,
                    published_batches = dispatcher_stats.published_batches,
                    "ledger ingestion completed"
                );

                Ok(IngestReport {
                    run_id: run.id,
                    blob_key,
                    processed_lines: state.processed_lines,
                    error_count: state.error_count,
                    unique_debtors: state.aggregates.len() as u64,
                    size_bytes: state.size_bytes,
                    elapsed: started.elapsed(),
                    dispatcher_stats,
                })
            }
            Err(err) => {
                let outcome = RunOutcome {
                    status: RunStatus::Failed,
                    processed_lines: state.processed_lines,
                    error_count: state.error_count,
                    size_bytes: state.size_bytes,
                };
                if let Err(finalize_err) = self.imports.finalize_run(&state.run_id, outcome).await {
                    warn!(
                        run_id = %state.run_id,
                        error = %finalize_err,
                        "failed to mark import run as failed"
                    );
                }
                Err(err)
            }
        }
    }

    async fn consume<S, E>(
        &self,
        stream: S,
        state: &mut RunState,
        blob_key: &str,
        ct: CancellationToken,
    ) -> Result<()>
    where
        S: Stream<Item = std::result::Result<Bytes, E>>,
        E: std::fmt::Display,
    {
        let mut stream = pin!(stream);

        loop {
            tokio::select! {
                biased;
                _ = ct.cancelled() => {
                    return Err(IngestorError::Cancelled);
                }
                chunk = stream.next() => {
                    let Some(chunk) = chunk else {
                        break;
                    };
                    let chunk = match chunk {
                        Ok(chunk) => chunk,
                        Err(err) => {
                            return StreamReadSnafu {
                                message: err.to_string(),
                            }
                            .fail();
                        }
                    };

                    state.size_bytes += chunk.len() as u64;
                    state.content.extend_from_slice(&chunk);
                    state.carry.extend_from_slice(&chunk);

                    while let Some(pos) = state.carry.iter().position(|&b| b == b'\n') {
                        let raw: Vec<u8> = state.carry.drain(..=pos).collect();
                        let line = decode_line(&raw[..raw.len() - 1]);
                        self.handle_line(state, &line).await?;
                    }
                }
            }
        }

        // The carry buffer holds the final unterminated line, if any.
        if !state.carry.is_empty() {
            let raw = std::mem::take(&mut state.carry);
            let line = decode_line(&raw);
            self.handle_line(state, &line).await?;
        }

        state.dispatcher.flush().await;

        // The raw file must be durably stored before the run may be
        // reported as completed.
        self.upload_blob(blob_key, state.content.split().freeze())
            .await?;

        Ok(())
    }

    async fn handle_line(&self, state: &mut RunState, line: &str) -> Result<()> {
        state.line_number += 1;
        if line.trim().is_empty() {
            return Ok(());
        }

        let record = match parse_line(line) {
            Ok(record) => record,
            Err(err) => {
                return self
                    .record_line_error(state, line, err.category(), err.to_string())
                    .await;
            }
        };

        let cuit = match Cuit::new(record.debtor_id.clone()) {
            Ok(cuit) => cuit,
            Err(err) => {
                return self
                    .record_line_error(state, line, ErrorCategory::Validation, err.to_string())
                    .await;
            }
        };

        let merged = DebtorAggregate::merge(
            state.aggregates.get(&cuit),
            &cuit,
            record.severity,
            record.loan_amount,
        );
        state.aggregates.insert(cuit.clone(), merged);

        self.imports
            .record_imported(ImportedRecord {
                run_id: state.run_id.clone(),
                line_number: state.line_number,
                cuit: cuit.to_string(),
                entity_code: record.entity_code.clone(),
                info_date: record.info_date.clone(),
                id_type: record.id_type.clone(),
                activity_code: record.activity_code.clone(),
                severity: record.severity,
                loan_amount: record.loan_amount,
            })
            .await
            .context(StoreSnafu {
                message: "failed to write audit record",
            })?;

        state
            .dispatcher
            .add(DebtorUpdate::from_record(
                &record,
                &state.run_id,
                state.line_number,
            ))
            .await;

        state.processed_lines += 1;
        Ok(())
    }

    /// Record one rejected line in the error sink and keep going.
    ///
    /// Only a failure of the sink itself propagates.
    async fn record_line_error(
        &self,
        state: &mut RunState,
        line: &str,
        category: ErrorCategory,
        message: String,
    ) -> Result<()> {
        warn!(
            run_id = %state.run_id,
            line_number = state.line_number,
            message = %message,
            "line rejected"
        );

        self.imports
            .record_error(NewImportError {
                run_id: state.run_id.clone(),
                line_number: state.line_number,
                raw_content: line.to_string(),
                message,
                category,
            })
            .await
            .context(StoreSnafu {
                message: "failed to write to the error sink",
            })?;

        state.error_count += 1;
        Ok(())
    }

    async fn upload_blob(&self, blob_key: &str, data: Bytes) -> Result<()> {
        let blob_store = self
            .blob_store_factory
            .create_blob_store()
            .await
            .context(BlobStoreSnafu {
                message: "failed to create blob store client",
            })?;

        blob_store
            .put_opts(
                &Path::from(blob_key),
                PutPayload::from_bytes(data),
                PutOptions {
                    mode: PutMode::Create,
                    ..Default::default()
                },
            )
            .await
            .context(BlobStoreSnafu {
                message: "failed to upload ledger file",
            })?;

        Ok(())
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}
