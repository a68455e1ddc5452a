//! Batched dispatch of debtor update events to the message queue.

use std::sync::Arc;

use cendeu_core::payload::{DebtorUpdate, DebtorUpdateBatch};
use cendeu_queue::MessageQueue;
use tracing::{debug, warn};

/// Number of update events per queue message.
pub const DEFAULT_BATCH_SIZE: usize = 20;

/// Counters kept by the dispatcher over the lifetime of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatcherStats {
    pub published_batches: u64,
    pub failed_batches: u64,
    pub published_updates: u64,
}

/// Accumulates update events and publishes them in bounded batches.
///
/// Publishing awaits the queue call inline, so a slow queue
/// backpressures the ingestor instead of growing an unbounded buffer.
/// Publish failures are logged and counted but never abort the run:
/// durability rests on consumer-side redelivery and external
/// reconciliation, not producer retries.
pub struct UpdateDispatcher {
    queue: Arc<dyn MessageQueue>,
    batch_size: usize,
    pending: Vec<DebtorUpdate>,
    stats: DispatcherStats,
}

impl UpdateDispatcher {
    pub fn new(queue: Arc<dyn MessageQueue>, batch_size: usize) -> Self {
        Self {
            queue,
            batch_size: batch_size.max(1),
            pending: Vec::new(),
            stats: DispatcherStats::default(),
        }
    }

    /// Append one event, flushing if the batch is full.
    pub async fn add(&mut self, update: DebtorUpdate) {
        self.pending.push(update);
        if self.pending.len() >= self.batch_size {
            self.flush().await;
        }
    }

    /// Publish any pending events as one batch.
    ///
    /// Always called at end-of-stream so a partial batch is never left
    /// behind.
    pub async fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }

        let batch = DebtorUpdateBatch {
            deudores: std::mem::take(&mut self.pending),
        };
        let update_count = batch.deudores.len() as u64;

        let body = match serde_json::to_string(&batch) {
            Ok(body) => body,
            Err(err) => {
                warn!(error = %err, updates = update_count, "failed to serialize update batch, dropping");
                self.stats.failed_batches += 1;
                return;
            }
        };

        match self.queue.publish(body).await {
            Ok(message_id) => {
                debug!(%message_id, updates = update_count, "published update batch");
                self.stats.published_batches += 1;
                self.stats.published_updates += update_count;
            }
            Err(err) => {
                // Best-effort delivery: the run keeps going and external
                // reconciliation covers the gap.
                warn!(error = %err, updates = update_count, "failed to publish update batch");
                self.stats.failed_batches += 1;
            }
        }
    }

    pub fn stats(&self) -> DispatcherStats {
        self.stats
    }
}
