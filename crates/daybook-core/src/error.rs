//! Error types for daybook-core

use thiserror::Error;

/// Result type alias using daybook-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias for remote data source calls
pub type SyncResult<T> = std::result::Result<T, SyncError>;

/// Errors that can occur in daybook-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Remote synchronization error
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures reported by a remote data source.
///
/// None of these ever leave the cache in a partially applied state; the
/// controller resolves the failed operation and hands the error back.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Transport-level failure (connect, timeout, interrupted body).
    #[error("Network error: {0}")]
    Network(String),
    /// The API rejected the credentials. Never retried automatically.
    #[error("Not authorized: {0}")]
    Auth(String),
    /// The API answered but reported a failure.
    #[error("API error: {0}")]
    Api(String),
    /// The API answered with a body we could not interpret.
    #[error("Invalid response payload: {0}")]
    InvalidPayload(String),
}

impl SyncError {
    /// Whether the caller should send the user to re-authenticate.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// Whether offering a retry affordance makes sense.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::InvalidPayload(error.to_string())
        } else {
            Self::Network(error.to_string())
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(error: serde_json::Error) -> Self {
        Self::InvalidPayload(error.to_string())
    }
}
