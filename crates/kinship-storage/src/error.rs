//! Storage error types

use thiserror::Error;

/// Result type alias for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Storage-specific error types
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unable to save relationship: {0}")]
    SaveFailed(String),

    #[error("Validation error: {0}")]
    Validation(#[from] kinship_core::ValidationError),

    #[error("Portable identifier {uid} already belongs to entity {guid}")]
    UidConflict { uid: String, guid: i64 },

    #[error("Invalid table prefix: {0}")]
    InvalidPrefix(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[cfg(feature = "redb")]
    #[error("ReDB error: {0}")]
    Redb(#[from] ::redb::Error),

    #[cfg(feature = "redb")]
    #[error("ReDB database error: {0}")]
    RedbDatabase(#[from] ::redb::DatabaseError),

    #[cfg(feature = "redb")]
    #[error("ReDB table error: {0}")]
    RedbTable(#[from] ::redb::TableError),

    #[cfg(feature = "redb")]
    #[error("ReDB storage error: {0}")]
    RedbStorage(#[from] ::redb::StorageError),

    #[cfg(feature = "redb")]
    #[error("ReDB commit error: {0}")]
    RedbCommit(#[from] ::redb::CommitError),

    #[cfg(feature = "redb")]
    #[error("ReDB transaction error: {0}")]
    RedbTransaction(#[from] ::redb::TransactionError),

    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] ::rusqlite::Error),
}

impl StorageError {
    pub(crate) fn uid_conflict(entity: &kinship_core::Entity, bound: i64) -> Self {
        StorageError::UidConflict {
            uid: entity.uid.to_string(),
            guid: bound,
        }
    }

    pub(crate) fn lock<E: std::fmt::Display>(err: E) -> Self {
        StorageError::Database(format!("Lock error: {}", err))
    }

    #[cfg(feature = "sqlite")]
    pub(crate) fn invalid_timestamp(micros: i64) -> Self {
        StorageError::Database(format!("Invalid timestamp: {}", micros))
    }
}
