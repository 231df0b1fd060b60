//! Cart error types.

use thiserror::Error;

/// Errors that can occur while reading or writing client-local state.
#[derive(Debug, Error)]
pub enum CartError {
    /// The storage backend failed to read or write a key.
    #[error("Storage error on key '{key}': {source}")]
    Storage {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// A value could not be serialized for storage.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience type alias for cart results.
pub type Result<T> = std::result::Result<T, CartError>;
