use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObserverError {
    #[error("observer failed: {0}")]
    Failed(String),

    #[error("observer channel is closed")]
    Closed,
}
