//! CLI error types.

use std::path::PathBuf;

use cart::CartError;
use checkout::CheckoutError;
use thiserror::Error;

/// Errors a storefront command can end with.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// No customer profile has been saved yet.
    #[error("No customer profile saved; run `storefront profile set` first")]
    NoCustomer,

    /// Checkout ran but nothing was placed.
    #[error("Order not placed: {0}")]
    OrderNotPlaced(String),

    /// The command line or an interactive answer was not usable.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Cart or local storage error.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Checkout or remote service error.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// Reading the terminal or writing a journal failed.
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorefrontError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorefrontError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience type alias for command results.
pub type Result<T> = std::result::Result<T, StorefrontError>;
