//! Exchange error types

use kinship_storage::StorageError;
use thiserror::Error;

/// Result type alias for import/export operations
pub type ExchangeResult<T> = std::result::Result<T, ExchangeError>;

#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("There was a problem saving the relationship: {0}")]
    SaveFailed(String),

    #[error("Unsupported version {0} passed to import")]
    UnsupportedVersion(u32),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
