//! Error types for the scalable filter

use thiserror::Error;

/// Errors surfaced to filter callers
#[derive(Debug, Error)]
pub enum FilterError {
    /// The store could not be reached or did not answer in time. Safe to retry
    /// the whole operation.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error(
        "Configuration mismatch for filter '{name}': {field} is {persisted} in the store, requested {requested}"
    )]
    ConfigurationMismatch {
        name: String,
        field: &'static str,
        persisted: String,
        requested: String,
    },

    #[error("Filter not found: {0}")]
    NotFound(String),

    #[error("Invalid filter parameters: {0}")]
    InvalidParameters(String),

    #[error("Level {index} exceeds the maximum level size")]
    LevelTooLarge { index: u32 },

    #[error("Corrupt filter metadata: {0}")]
    CorruptMetadata(String),
}

impl FilterError {
    /// Whether retrying the same call may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, FilterError::StoreUnavailable(_))
    }
}

/// Errors from the store collaborator
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    Unavailable(String),

    #[error("Timeout")]
    Timeout,

    #[error("Key {key} holds a value of the wrong type")]
    WrongType { key: String },

    #[error("Backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for FilterError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(_) | StoreError::Timeout | StoreError::Backend(_) => {
                FilterError::StoreUnavailable(err.to_string())
            }
            StoreError::WrongType { .. } => FilterError::CorruptMetadata(err.to_string()),
        }
    }
}
