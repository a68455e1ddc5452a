use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use clap::Args;
use snafu::ResultExt;
use tokio_util::sync::CancellationToken;

use cendeu_consumer::{ConsumerOptions, run_consumer_pool};
use cendeu_ingestor::{IngestOptions, StreamIngestor};
use cendeu_object_store::{BlobStoreFactory, LocalFileSystemFactory, TemporaryFileSystemFactory};
use cendeu_queue::{InMemoryQueue, QueueOptions};
use cendeu_server_http::{ImportServer, ImportServerOptions};
use cendeu_store::{InMemoryDebtorStore, InMemoryImportStore};

use crate::error::{InvalidServerAddressSnafu, IoSnafu, ObjectStoreSnafu, Result};

#[derive(Debug, Args)]
pub struct DevArgs {
    /// The address of the HTTP import server.
    #[arg(long, default_value = "127.0.0.1:7780")]
    http_address: String,
    /// Directory for uploaded ledger blobs. A temporary directory is
    /// used when omitted.
    #[arg(long)]
    blob_root: Option<String>,
    /// Number of consumer workers draining the update queue.
    #[arg(long, default_value_t = 2)]
    workers: usize,
}

impl DevArgs {
    pub async fn run(self, ct: CancellationToken) -> Result<()> {
        let http_address = self
            .http_address
            .parse::<SocketAddr>()
            .context(InvalidServerAddressSnafu)?;

        let imports: Arc<InMemoryImportStore> = InMemoryImportStore::new().into();
        let debtors: Arc<InMemoryDebtorStore> = InMemoryDebtorStore::new().into();
        let queue: Arc<InMemoryQueue> = InMemoryQueue::new(QueueOptions::default()).into();
        let blob_store_factory = new_blob_store_factory(self.blob_root.as_deref())?;

        println!("Starting cendeu in development mode");
        println!("HTTP import server listening on {http_address}");

        let ingestor = StreamIngestor::new(
            blob_store_factory,
            imports.clone(),
            queue.clone(),
            IngestOptions::default(),
        );
        let server = ImportServer::new(
            Arc::new(ingestor),
            imports,
            ImportServerOptions::default(),
            ct.clone(),
        );

        let http_fut = run_http_server(server.into_router(), http_address, ct.clone());
        let consumer_fut = run_consumer_pool(
            queue,
            debtors,
            ConsumerOptions {
                workers: self.workers,
                ..ConsumerOptions::default()
            },
            ct,
        );

        tokio::select! {
            res = http_fut => {
                println!("HTTP import server exited with {:?}", res);
            },
            _ = consumer_fut => {
                println!("Consumer pool exited");
            },
        }

        Ok(())
    }
}

fn new_blob_store_factory(blob_root: Option<&str>) -> Result<Arc<dyn BlobStoreFactory>> {
    match blob_root {
        Some(root) => {
            let factory = LocalFileSystemFactory::new(root).context(ObjectStoreSnafu)?;
            println!("Blob store root path: {}", factory.root_path().display());
            Ok(Arc::new(factory))
        }
        None => {
            let factory = TemporaryFileSystemFactory::new().context(ObjectStoreSnafu)?;
            println!("Blob store root path: {}", factory.root_path().display());
            Ok(Arc::new(factory))
        }
    }
}

async fn run_http_server(app: Router, address: SocketAddr, ct: CancellationToken) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .context(IoSnafu)?;

    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        ct.cancelled().await;
    });

    server.await.context(IoSnafu)
}
