//! Command-line storefront.
//!
//! Keeps the cart and the signed-in customer in a local data directory and
//! talks to the remote order, catalog and payment services for checkout and
//! order history.

pub mod commands;
pub mod config;
pub mod error;
pub mod journal;

use std::sync::Arc;

use cart::{CartStore, FileStorage};
use checkout::RestClient;

pub use config::Config;
pub use error::{Result, StorefrontError};

/// Everything a command needs: configuration, this session's cart and the
/// remote service client.
pub struct App {
    config: Config,
    store: Arc<CartStore<FileStorage>>,
    client: RestClient,
}

impl App {
    /// Opens the local data directory and builds the remote client.
    pub async fn open(config: Config) -> Result<Self> {
        let storage = FileStorage::open(config.storage_dir()).await?;
        let store = Arc::new(CartStore::open(storage).await);
        let client = RestClient::from_config(&config.checkout)?;
        tracing::debug!(
            data_dir = %config.data_dir.display(),
            api = client.base_url(),
            "storefront opened"
        );
        Ok(Self {
            config,
            store,
            client,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<CartStore<FileStorage>> {
        &self.store
    }

    pub fn client(&self) -> &RestClient {
        &self.client
    }
}
