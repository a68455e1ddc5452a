use snafu::Snafu;

use crate::MessageId;

/// Errors related to queue transport operations.
#[derive(Debug, Clone, Snafu)]
#[snafu(visibility(pub))]
pub enum QueueError {
    #[snafu(display("queue unavailable: {message}"))]
    Unavailable { message: String },
    #[snafu(display("stale delivery handle for message {message_id}"))]
    StaleHandle { message_id: MessageId },
}

pub type QueueResult<T, E = QueueError> = std::result::Result<T, E>;
