//! Error types for Kinship Core

use thiserror::Error;

/// Result type alias using Kinship's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Kinship core error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid ordering: {0}")]
    InvalidOrder(String),

    #[error("Validation error: {0}")]
    Validation(String),
}
