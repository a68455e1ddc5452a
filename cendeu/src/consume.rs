use std::sync::Arc;

use clap::Args;
use tokio_util::sync::CancellationToken;

use cendeu_consumer::{ConsumerOptions, run_consumer_pool};
use cendeu_queue::{InMemoryQueue, QueueOptions};
use cendeu_store::InMemoryDebtorStore;

use crate::error::Result;

#[derive(Debug, Args)]
pub struct ConsumeArgs {
    /// Number of consumer workers.
    #[arg(long, default_value_t = 4)]
    workers: usize,
}

impl ConsumeArgs {
    /// Run only the consumer side of the pipeline.
    ///
    /// This repository ships in-memory transports, so the workers poll
    /// an empty local queue; a deployment swaps them for the real queue
    /// and store behind the same traits.
    pub async fn run(self, ct: CancellationToken) -> Result<()> {
        let queue: Arc<InMemoryQueue> = InMemoryQueue::new(QueueOptions::default()).into();
        let debtors: Arc<InMemoryDebtorStore> = InMemoryDebtorStore::new().into();

        println!("Starting {} consumer workers", self.workers);

        run_consumer_pool(
            queue,
            debtors,
            ConsumerOptions {
                workers: self.workers,
                ..ConsumerOptions::default()
            },
            ct,
        )
        .await;

        Ok(())
    }
}
