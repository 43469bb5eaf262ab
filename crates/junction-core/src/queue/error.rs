use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("admission queue is full (capacity {capacity})")]
    Full { capacity: usize },
}
