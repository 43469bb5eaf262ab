use thiserror::Error;

use junction_model::ModelError;

use crate::queue::QueueError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(#[from] ModelError),

    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("phase clock is autonomous; manual phase control requires clockMode=manual")]
    ClockAutonomous,

    #[error("controller must be started inside a tokio runtime")]
    NoRuntime,
}
