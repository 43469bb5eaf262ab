use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid duration for {field}: must be greater than zero")]
    InvalidDuration { field: &'static str },

    #[error("invalid queue capacity: must be greater than zero")]
    InvalidCapacity,

    #[error("unknown priority: {0}")]
    UnknownPriority(String),

    #[error("unknown phase: {0}")]
    UnknownPhase(String),

    #[error("unknown clock mode: {0}")]
    UnknownClockMode(String),
}

pub type ModelResult<T> = Result<T, ModelError>;
