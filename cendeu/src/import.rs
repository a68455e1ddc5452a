use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::Args;
use snafu::ResultExt;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;

use cendeu_consumer::{ConsumerOptions, QueueConsumer};
use cendeu_ingestor::{
    CHUNK_SIZE, DEFAULT_BATCH_SIZE, IngestOptions, IngestRequest, StreamIngestor,
};
use cendeu_object_store::TemporaryFileSystemFactory;
use cendeu_queue::{InMemoryQueue, QueueOptions};
use cendeu_store::{DebtorStore, InMemoryDebtorStore, InMemoryImportStore};

use crate::error::{ConsumeSnafu, IngestSnafu, IoSnafu, ObjectStoreSnafu, Result, StoreSnafu};

const DEFAULT_FILE_NAME: &str = "upload.txt";

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Path to the ledger file to import.
    file: PathBuf,
    /// Number of update events per queue message.
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,
}

impl ImportArgs {
    pub async fn run(self, ct: CancellationToken) -> Result<()> {
        let file_name = self
            .file
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(DEFAULT_FILE_NAME)
            .to_string();

        let file = tokio::fs::File::open(&self.file).await.context(IoSnafu)?;
        let stream = ReaderStream::with_capacity(file, CHUNK_SIZE);

        let imports: Arc<InMemoryImportStore> = InMemoryImportStore::new().into();
        let debtors: Arc<InMemoryDebtorStore> = InMemoryDebtorStore::new().into();
        let queue: Arc<InMemoryQueue> = InMemoryQueue::new(QueueOptions::default()).into();
        let blob_store_factory: Arc<TemporaryFileSystemFactory> = TemporaryFileSystemFactory::new()
            .context(ObjectStoreSnafu)?
            .into();

        let ingestor = StreamIngestor::new(
            blob_store_factory,
            imports,
            queue.clone(),
            IngestOptions {
                batch_size: self.batch_size,
            },
        );

        let report = ingestor
            .process_stream(stream, IngestRequest { file_name }, ct.child_token())
            .await
            .context(IngestSnafu)?;

        // Drain the queue so the aggregates are applied locally too.
        let consumer = QueueConsumer::new(
            queue.clone(),
            debtors.clone(),
            ConsumerOptions {
                wait: Duration::ZERO,
                ..ConsumerOptions::default()
            },
        );
        while !queue.is_empty() {
            consumer.poll_once().await.context(ConsumeSnafu)?;
        }

        println!("Import run {} finished", report.run_id);
        println!("  processed lines: {}", report.processed_lines);
        println!("  rejected lines:  {}", report.error_count);
        println!("  unique debtors:  {}", report.unique_debtors);
        println!("  bytes read:      {}", report.size_bytes);
        println!("  blob key:        {}", report.blob_key);
        println!("  published batches: {}", report.dispatcher_stats.published_batches);
        println!("  debtors stored:  {}", debtors.len().await.context(StoreSnafu)?);
        println!("  elapsed:         {:?}", report.elapsed);

        Ok(())
    }
}
