use cendeu_queue::QueueError;
use cendeu_store::StoreError;
use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ConsumerError {
    #[snafu(display("queue error: {message}"))]
    Queue {
        message: &'static str,
        source: QueueError,
    },
    #[snafu(display("store error: {message}"))]
    Store {
        message: &'static str,
        source: StoreError,
    },
}

pub type Result<T, E = ConsumerError> = std::result::Result<T, E>;
