//! Queue consumer applying debtor update batches to the aggregate store.
//!
//! Workers long-poll the queue, validate and apply each update in a
//! received batch, and acknowledge the message only once every update
//! has been applied or deliberately skipped. Unacknowledged messages
//! come back after the visibility timeout; the store's idempotency key
//! makes the replay harmless.

pub mod consumer;
pub mod error;

pub use consumer::{ConsumerOptions, QueueConsumer, run_consumer_pool};
pub use error::{ConsumerError, Result};
