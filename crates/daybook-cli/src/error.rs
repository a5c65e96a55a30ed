use std::io;

use daybook_core::SyncError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] daybook_core::Error),
    #[error(transparent)]
    Sync(SyncError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No entry content provided")]
    EmptyContent,
    #[error("ID cannot be empty")]
    EmptyId,
    #[error("Page count must be at least 1")]
    InvalidPageCount,
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Authentication failed: {0}. Set DAYBOOK_TOKEN or access_token in the config file.")]
    Auth(String),
    #[error("API is not configured. Set DAYBOOK_API_URL or api_base_url in {0}.")]
    NotConfigured(String),
}

impl From<SyncError> for CliError {
    fn from(error: SyncError) -> Self {
        match error {
            SyncError::Auth(message) => Self::Auth(message),
            other => Self::Sync(other),
        }
    }
}
