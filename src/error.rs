use thiserror::Error;

/// Errors raised by the stores and the mission graph engine.
///
/// Duplicate links and dependency edges are never reported here: they are
/// absorbed into an idempotent success by the store itself.
#[derive(Debug, Error)]
pub enum Error {
    /// A required field is missing or a request is self-contradictory
    /// (for example a mission that requires itself).
    #[error("{0}")]
    Validation(String),

    /// A referenced mission, map, annotation or path does not exist.
    #[error("{0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
