//! Error types for the conflation engine.

use thiserror::Error;

/// Result type for conflation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while validating and conflating samples.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
