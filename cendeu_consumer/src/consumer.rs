use std::sync::Arc;
use std::time::Duration;

use snafu::ResultExt;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use cendeu_core::DebtorUpdateBatch;
use cendeu_queue::{MessageQueue, QueueError, ReceivedMessage};
use cendeu_store::{DebtorStore, UpdateOutcome};

use crate::error::{QueueSnafu, Result, StoreSnafu};

/// Pause between polls after the queue transport reports an error.
const RECEIVE_BACKOFF: Duration = Duration::from_secs(1);

/// Options for the consumer worker pool.
#[derive(Debug, Clone)]
pub struct ConsumerOptions {
    /// Messages requested per long poll.
    pub max_messages: usize,
    /// Long-poll wait per receive call.
    pub wait: Duration,
    /// Number of concurrent workers in the pool.
    pub workers: usize,
}

impl Default for ConsumerOptions {
    fn default() -> Self {
        Self {
            max_messages: 10,
            wait: Duration::from_secs(20),
            workers: 4,
        }
    }
}

/// One consumer worker: receives update batches and applies them to the
/// debtor aggregate store.
pub struct QueueConsumer {
    queue: Arc<dyn MessageQueue>,
    debtors: Arc<dyn DebtorStore>,
    options: ConsumerOptions,
}

impl QueueConsumer {
    pub fn new(
        queue: Arc<dyn MessageQueue>,
        debtors: Arc<dyn DebtorStore>,
        options: ConsumerOptions,
    ) -> Self {
        Self {
            queue,
            debtors,
            options,
        }
    }

    /// Poll and process until cancelled.
    pub async fn run(self, worker: usize, ct: CancellationToken) {
        info!(worker, "consumer worker started");
        loop {
            tokio::select! {
                biased;
                _ = ct.cancelled() => break,
                result = self.poll_once() => {
                    if let Err(err) = result {
                        warn!(worker, error = %err, "queue receive failed, backing off");
                        tokio::time::sleep(RECEIVE_BACKOFF).await;
                    }
                }
            }
        }
        info!(worker, "consumer worker stopped");
    }

    /// One receive round: process every delivered message, acknowledging
    /// each one unless the store failed mid-message.
    ///
    /// Returns the number of messages delivered.
    pub async fn poll_once(&self) -> Result<usize> {
        let messages = self
            .queue
            .receive(self.options.max_messages, self.options.wait)
            .await
            .context(QueueSnafu {
                message: "failed to receive messages",
            })?;

        let count = messages.len();
        for message in messages {
            if let Err(err) = self.process_message(&message).await {
                // No acknowledge: the visibility timeout will redeliver
                // the whole batch, and applied updates replay as
                // duplicates.
                warn!(
                    message_id = %message.id,
                    delivery_count = message.delivery_count,
                    error = %err,
                    "leaving message for redelivery"
                );
                continue;
            }

            match self.queue.acknowledge(message.handle.clone()).await {
                Ok(()) => {}
                Err(QueueError::StaleHandle { .. }) => {
                    warn!(
                        message_id = %message.id,
                        "delivery handle went stale before acknowledge"
                    );
                }
                Err(err) => {
                    warn!(
                        message_id = %message.id,
                        error = %err,
                        "failed to acknowledge message"
                    );
                }
            }
        }

        Ok(count)
    }

    /// Apply every update in one message.
    ///
    /// Malformed bodies and semantically invalid updates are logged and
    /// dropped; only a store failure propagates, withholding the
    /// acknowledge.
    async fn process_message(&self, message: &ReceivedMessage) -> Result<()> {
        let batch: DebtorUpdateBatch = match serde_json::from_str(&message.body) {
            Ok(batch) => batch,
            Err(err) => {
                warn!(
                    message_id = %message.id,
                    delivery_count = message.delivery_count,
                    error = %err,
                    "dropping malformed queue message"
                );
                return Ok(());
            }
        };

        for update in &batch.deudores {
            let valid = match update.validate() {
                Ok(valid) => valid,
                Err(err) => {
                    warn!(
                        message_id = %message.id,
                        run_id = %update.importacion_id,
                        line_number = update.linea_archivo,
                        error = %err,
                        "skipping invalid debtor update"
                    );
                    continue;
                }
            };

            let outcome = self
                .debtors
                .apply_update(&valid)
                .await
                .context(StoreSnafu {
                    message: "failed to apply debtor update",
                })?;

            match outcome {
                UpdateOutcome::Applied(aggregate) => {
                    debug!(
                        cuit = %aggregate.cuit,
                        max_severity = aggregate.max_severity,
                        total_loan_amount = aggregate.total_loan_amount,
                        "debtor aggregate updated"
                    );
                }
                UpdateOutcome::Duplicate => {
                    debug!(
                        cuit = %valid.cuit,
                        run_id = %valid.run_id,
                        line_number = valid.line_number,
                        "replayed update skipped"
                    );
                }
            }
        }

        Ok(())
    }
}

/// Run a pool of consumer workers until the token is cancelled.
pub async fn run_consumer_pool(
    queue: Arc<dyn MessageQueue>,
    debtors: Arc<dyn DebtorStore>,
    options: ConsumerOptions,
    ct: CancellationToken,
) {
    let mut workers = JoinSet::new();
    for worker in 0..options.workers.max(1) {
        let consumer = QueueConsumer::new(queue.clone(), debtors.clone(), options.clone());
        let ct = ct.clone();
        workers.spawn(async move { consumer.run(worker, ct).await });
    }

    while let Some(result) = workers.join_next().await {
        if let Err(err) = result {
            warn!(error = %err, "consumer worker panicked");
        }
    }
}
