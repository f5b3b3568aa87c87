use thiserror::Error;

/// Errors raised by the scoreline engine.
///
/// Every error is local to a single prediction; nothing here is retried
/// because the same inputs would reproduce the same failure.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        EngineError::InvalidInput(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
