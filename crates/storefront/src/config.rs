//! Storefront configuration loaded from environment variables.

use std::path::{Path, PathBuf};

use checkout::CheckoutConfig;

/// CLI configuration with sensible defaults.
///
/// Reads from environment variables (a `.env` file is loaded first):
/// - `STOREFRONT_DATA_DIR`: client-local storage directory (default: `".storefront"`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - the `STOREFRONT_*` checkout settings read by [`CheckoutConfig`]
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub log_level: String,
    pub checkout: CheckoutConfig,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            data_dir: std::env::var("STOREFRONT_DATA_DIR")
                .ok()
                .filter(|d| !d.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".storefront")),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            checkout: CheckoutConfig::from_env(),
        }
    }

    /// Directory holding the `cart` and `customer` entries.
    pub fn storage_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Directory holding one JSON journal per checkout run.
    pub fn journal_dir(&self) -> PathBuf {
        self.data_dir.join("journal")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".storefront"),
            log_level: "info".to_string(),
            checkout: CheckoutConfig::default(),
        }
    }
}
