use std::{convert::Infallible, sync::Arc};

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, stream};
use object_store::ObjectStore;

use cendeu_ingestor::{IngestOptions, StreamIngestor};
use cendeu_object_store::{BlobStoreFactory, TemporaryFileSystemFactory};
use cendeu_queue::{InMemoryQueue, QueueOptions};
use cendeu_store::InMemoryImportStore;

pub fn create_ingestor(
    options: IngestOptions,
) -> (
    StreamIngestor,
    Arc<InMemoryImportStore>,
    Arc<InMemoryQueue>,
    Arc<TemporaryFileSystemFactory>,
) {
    let imports: Arc<InMemoryImportStore> = InMemoryImportStore::new().into();
    let queue: Arc<InMemoryQueue> = InMemoryQueue::new(QueueOptions::default()).into();
    let blob_store_factory: Arc<TemporaryFileSystemFactory> = TemporaryFileSystemFactory::new()
        .expect("object store factory")
        .into();

    let ingestor = StreamIngestor::new(
        blob_store_factory.clone(),
        imports.clone(),
        queue.clone(),
        options,
    );

    (ingestor, imports, queue, blob_store_factory)
}

/// Build one well-formed ledger line for entity 00007, period 202311.
pub fn sample_line(cuit: &str, severity: u8, amount: u64) -> String {
    assert_eq!(11, cuit.len(), "test cuit must be 11 characters");
    format!("00007202311{}{}001{:02} {}", "12", cuit, severity, amount)
}

/// Turn pre-split chunks into the kind of stream an upload produces.
pub fn chunk_stream(
    chunks: Vec<&str>,
) -> impl Stream<Item = Result<Bytes, Infallible>> + Send + 'static {
    let chunks: Vec<_> = chunks
        .into_iter()
        .map(|chunk| Ok(Bytes::from(chunk.to_string())))
        .collect();
    stream::iter(chunks)
}

/// A blob store factory whose backing store cannot be reached.
pub struct FailingBlobStoreFactory;

#[async_trait]
impl BlobStoreFactory for FailingBlobStoreFactory {
    async fn create_blob_store(&self) -> Result<Arc<dyn ObjectStore>, object_store::Error> {
        Err(object_store::Error::Generic {
            store: "test",
            source: "blob store unreachable".into(),
        })
    }
}
