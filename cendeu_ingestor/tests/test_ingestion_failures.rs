use std::sync::Arc;

use common::{FailingBlobStoreFactory, chunk_stream, create_ingestor, sample_line};
use tokio_util::sync::CancellationToken;

use cendeu_core::import::{ErrorCategory, RunStatus};
use cendeu_ingestor::{IngestOptions, IngestRequest, IngestorError, Result, StreamIngestor};
use cendeu_queue::{InMemoryQueue, QueueOptions};
use cendeu_store::{ImportStore, InMemoryImportStore};

mod common;

#[tokio::test]
async fn test_malformed_lines_are_recorded_without_aborting() -> Result<()> {
    let (ingestor, imports, _, _) = create_ingestor(IngestOptions::default());

    let mut bad_severity = sample_line("20003905528", 1, 5);
    bad_severity.replace_range(27..29, "XY");

    let content = format!(
        "{}\n{}\n{}\n{}\n",
        sample_line("20003905528", 3, 100),
        "too short",
        bad_severity,
        sample_line("2000390552A", 2, 10),
    );

    let report = ingestor
        .process_stream(
            chunk_stream(vec![&content]),
            IngestRequest {
                file_name: "ledger.txt".to_string(),
            },
            CancellationToken::new(),
        )
        .await?;

    // Every non-empty line is accounted for exactly once.
    assert_eq!(1, report.processed_lines);
    assert_eq!(3, report.error_count);

    let run = imports
        .get_run(&report.run_id)
        .await
        .expect("get_run")
        .expect("run exists");
    assert_eq!(RunStatus::Completed, run.status);
    assert_eq!(3, run.error_count);

    let errors = imports.list_errors(&report.run_id).await.expect("errors");
    assert_eq!(
        vec![
            (2, ErrorCategory::Parsing),
            (3, ErrorCategory::Parsing),
            (4, ErrorCategory::Validation),
        ],
        errors
            .iter()
            .map(|error| (error.line_number, error.category))
            .collect::<Vec<_>>(),
    );
    assert_eq!("too short", errors[0].raw_content);

    Ok(())
}

#[tokio::test]
async fn test_blob_store_failure_fails_the_run() {
    let imports: Arc<InMemoryImportStore> = InMemoryImportStore::new().into();
    let queue: Arc<InMemoryQueue> = InMemoryQueue::new(QueueOptions::default()).into();
    let ingestor = StreamIngestor::new(
        Arc::new(FailingBlobStoreFactory),
        imports.clone(),
        queue,
        IngestOptions::default(),
    );

    let content = format!("{}\n", sample_line("20003905528", 3, 100));

    let err = ingestor
        .process_stream(
            chunk_stream(vec![&content]),
            IngestRequest {
                file_name: "ledger.txt".to_string(),
            },
            CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, IngestorError::BlobStore { .. }));

    // The run is finalized as failed with the partial counts.
    let runs = imports.runs();
    assert_eq!(1, runs.len());
    assert_eq!(RunStatus::Failed, runs[0].status);
    assert_eq!(1, runs[0].processed_lines);
}

#[tokio::test]
async fn test_queue_outage_does_not_fail_the_run() -> Result<()> {
    let (ingestor, imports, queue, _) = create_ingestor(IngestOptions { batch_size: 1 });
    queue.set_unavailable(true);

    let content = format!(
        "{}\n{}\n",
        sample_line("20003905528", 3, 100),
        sample_line("27123456789", 5, 50),
    );

    let report = ingestor
        .process_stream(
            chunk_stream(vec![&content]),
            IngestRequest {
                file_name: "ledger.txt".to_string(),
            },
            CancellationToken::new(),
        )
        .await?;

    assert_eq!(2, report.processed_lines);
    assert_eq!(0, report.dispatcher_stats.published_batches);
    assert_eq!(2, report.dispatcher_stats.failed_batches);

    let run = imports
        .get_run(&report.run_id)
        .await
        .expect("get_run")
        .expect("run exists");
    assert_eq!(RunStatus::Completed, run.status);

    Ok(())
}

#[tokio::test]
async fn test_cancellation_fails_the_run() {
    let (ingestor, imports, _, _) = create_ingestor(IngestOptions::default());

    let content = format!("{}\n", sample_line("20003905528", 3, 100));

    let ct = CancellationToken::new();
    ct.cancel();

    let err = ingestor
        .process_stream(
            chunk_stream(vec![&content]),
            IngestRequest {
                file_name: "ledger.txt".to_string(),
            },
            ct,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, IngestorError::Cancelled));

    let runs = imports.runs();
    assert_eq!(1, runs.len());
    assert_eq!(RunStatus::Failed, runs[0].status);
    assert_eq!(0, runs[0].processed_lines);
}

#[tokio::test]
async fn test_store_outage_aborts_before_any_work() {
    let (ingestor, imports, queue, _) = create_ingestor(IngestOptions::default());
    imports.set_unavailable(true);

    let content = format!("{}\n", sample_line("20003905528", 3, 100));

    let err = ingestor
        .process_stream(
            chunk_stream(vec![&content]),
            IngestRequest {
                file_name: "ledger.txt".to_string(),
            },
            CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, IngestorError::Store { .. }));
    assert!(queue.is_empty());
}
