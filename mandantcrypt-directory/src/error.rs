//! Directory client error types.

use thiserror::Error;

/// Result type for directory operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Errors that can occur while talking to the identity directory.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("API request failed: {0}")]
    Api(String),

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("no password available for identity {0}")]
    PasswordUnavailable(i64),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
