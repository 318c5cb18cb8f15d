//! Error types for workflow operations

use episteme_api::ApiError;
use episteme_utils::ConfigError;
use thiserror::Error;

/// Errors surfaced by the workflow layer
///
/// Most components turn service failures into a renderable message at their
/// own boundary; [`FlowError::Api`] is for callers that want the raw error.
#[derive(Debug, Error)]
pub enum FlowError {
    /// Ticker was empty or whitespace
    #[error("Invalid ticker: '{0}'")]
    InvalidTicker(String),

    /// A poll was requested without a task id
    #[error("Missing analysis task ID.")]
    MissingTaskId,

    /// Service call failed
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Key-value store could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for workflow operations
pub type Result<T> = std::result::Result<T, FlowError>;
