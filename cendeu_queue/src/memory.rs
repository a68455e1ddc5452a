//! In-memory queue with visibility-timeout redelivery.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::error::{QueueError, QueueResult};
use crate::{DeliveryHandle, MessageId, MessageQueue, ReceivedMessage};

/// Options for the in-memory queue.
#[derive(Debug, Clone)]
pub struct QueueOptions {
    /// How long a delivered message stays invisible before it becomes
    /// receivable again.
    pub visibility_timeout: Duration,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            visibility_timeout: Duration::from_secs(300),
        }
    }
}

#[derive(Debug)]
struct QueueEntry {
    id: MessageId,
    body: String,
    visible_at: Instant,
    receipt: String,
    delivery_count: u32,
}

/// In-memory [`MessageQueue`] implementation.
///
/// Messages live in a single queue; receiving marks them invisible until
/// `now + visibility_timeout` and issues a fresh receipt per delivery.
/// Built on `tokio::time` so tests can pause and advance the clock.
#[derive(Debug)]
pub struct InMemoryQueue {
    entries: Mutex<Vec<QueueEntry>>,
    notify: Notify,
    options: QueueOptions,
    unavailable: AtomicBool,
}

impl InMemoryQueue {
    pub fn new(options: QueueOptions) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            notify: Notify::new(),
            options,
            unavailable: AtomicBool::new(false),
        }
    }

    /// Make every operation fail with [`QueueError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of messages in the queue, visible or not.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("queue lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> QueueResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(QueueError::Unavailable {
                message: "queue transport is unavailable".to_string(),
            });
        }
        Ok(())
    }

    /// Deliver up to `max_messages` visible entries, marking them
    /// invisible. Returns the deliveries and the instant the next
    /// invisible entry becomes visible, if any.
    fn try_deliver(
        &self,
        max_messages: usize,
        now: Instant,
    ) -> (Vec<ReceivedMessage>, Option<Instant>) {
        let mut entries = self.entries.lock().expect("queue lock poisoned");
        let mut delivered = Vec::new();
        let mut next_visible = None;

        for entry in entries.iter_mut() {
            if delivered.len() >= max_messages {
                break;
            }

            if entry.visible_at > now {
                next_visible = match next_visible {
                    Some(at) if at <= entry.visible_at => Some(at),
                    _ => Some(entry.visible_at),
                };
                continue;
            }

            entry.visible_at = now + self.options.visibility_timeout;
            entry.receipt = ulid::Ulid::new().to_string();
            entry.delivery_count += 1;

            delivered.push(ReceivedMessage {
                id: entry.id.clone(),
                handle: DeliveryHandle {
                    message_id: entry.id.clone(),
                    receipt: entry.receipt.clone(),
                },
                body: entry.body.clone(),
                delivery_count: entry.delivery_count,
            });
        }

        (delivered, next_visible)
    }
}

#[async_trait]
impl MessageQueue for InMemoryQueue {
    async fn publish(&self, body: String) -> QueueResult<MessageId> {
        self.check_available()?;

        let id = MessageId(ulid::Ulid::new().to_string());
        self.entries
            .lock()
            .expect("queue lock poisoned")
            .push(QueueEntry {
                id: id.clone(),
                body,
                visible_at: Instant::now(),
                receipt: String::new(),
                delivery_count: 0,
            });
        self.notify.notify_waiters();

        Ok(id)
    }

    async fn receive(
        &self,
        max_messages: usize,
        wait: Duration,
    ) -> QueueResult<Vec<ReceivedMessage>> {
        self.check_available()?;

        let deadline = Instant::now() + wait;

        loop {
            // Register for wakeups before scanning so a publish between
            // the scan and the await is not missed.
            let notified = self.notify.notified();

            let now = Instant::now();
            let (delivered, next_visible) = self.try_deliver(max_messages, now);
            if !delivered.is_empty() {
                return Ok(delivered);
            }

            if now >= deadline {
                return Ok(Vec::new());
            }

            let wake_at = match next_visible {
                Some(at) if at < deadline => at,
                _ => deadline,
            };

            tokio::select! {
                _ = notified => {}
                _ = tokio::time::sleep_until(wake_at) => {}
            }
        }
    }

    async fn acknowledge(&self, handle: DeliveryHandle) -> QueueResult<()> {
        self.check_available()?;

        let mut entries = self.entries.lock().expect("queue lock poisoned");
        let Some(position) = entries.iter().position(|entry| entry.id == handle.message_id)
        else {
            // Already deleted; acknowledgement is idempotent.
            return Ok(());
        };

        if entries[position].receipt != handle.receipt {
            return Err(QueueError::StaleHandle {
                message_id: handle.message_id,
            });
        }

        entries.remove(position);
        Ok(())
    }
}
