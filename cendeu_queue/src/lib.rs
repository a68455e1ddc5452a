//! Message queue capability trait and an in-memory implementation with
//! at-least-once, visibility-timeout delivery semantics.
//!
//! The pipeline talks to the queue transport exclusively through
//! [`MessageQueue`]; the real transport lives behind this trait as an
//! external collaborator. [`InMemoryQueue`] reproduces the delivery
//! semantics the design relies on (redelivery after an unacknowledged
//! visibility timeout) and backs dev mode and the tests.

pub mod error;
pub mod memory;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

pub use error::{QueueError, QueueResult};
pub use memory::{InMemoryQueue, QueueOptions};

/// Identifier assigned to a message at publish time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageId(pub String);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque handle identifying one delivery of one message.
///
/// The queue retains authority over the message until the handle is
/// acknowledged; once the visibility timeout elapses the handle goes
/// stale and the message is redelivered under a fresh one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryHandle {
    pub message_id: MessageId,
    pub receipt: String,
}

/// One received message, valid until its visibility timeout elapses.
#[derive(Debug, Clone)]
pub struct ReceivedMessage {
    pub id: MessageId,
    pub handle: DeliveryHandle,
    pub body: String,
    /// How many times this message has been delivered, this one included.
    pub delivery_count: u32,
}

/// An asynchronous, at-least-once message queue.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Publish one message body.
    async fn publish(&self, body: String) -> QueueResult<MessageId>;

    /// Long-poll for up to `max_messages` messages.
    ///
    /// Returns as soon as at least one message is visible, or an empty
    /// vec once `wait` elapses. Delivered messages stay invisible for the
    /// queue's visibility timeout; unacknowledged messages are
    /// redelivered after it.
    async fn receive(
        &self,
        max_messages: usize,
        wait: Duration,
    ) -> QueueResult<Vec<ReceivedMessage>>;

    /// Delete a message, consuming its delivery handle.
    ///
    /// Deleting an already-deleted message is a no-op; acknowledging
    /// with a handle that has been superseded by a redelivery fails with
    /// [`QueueError::StaleHandle`].
    async fn acknowledge(&self, handle: DeliveryHandle) -> QueueResult<()>;
}
