//! Stock service trait and in-memory implementation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use common::ProductId;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::CheckoutError;

/// The remote catalog's full record for a product.
///
/// Only `stock` is interpreted; every other attribute is carried through
/// unchanged because the remote update replaces the whole record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    /// Quantity on hand. May be negative if the remote service allows overselling.
    #[serde(deserialize_with = "common::types::lenient_i64")]
    pub stock: i64,
    #[serde(flatten)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl StockRecord {
    /// Creates a record with only a stock level.
    pub fn new(stock: i64) -> Self {
        Self {
            stock,
            attributes: serde_json::Map::new(),
        }
    }

    /// Adds an attribute.
    pub fn with_attribute(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }
}

/// Trait for reading and replacing product stock records.
#[async_trait]
pub trait StockService: Send + Sync {
    /// Fetches the full current record for a product.
    async fn fetch_stock(&self, product_id: ProductId) -> Result<StockRecord, CheckoutError>;

    /// Replaces the full record for a product.
    async fn replace_stock(
        &self,
        product_id: ProductId,
        record: &StockRecord,
    ) -> Result<(), CheckoutError>;
}

#[derive(Debug, Default)]
struct InMemoryStockState {
    products: HashMap<ProductId, StockRecord>,
    writes: Vec<(ProductId, StockRecord)>,
    fail_fetch_for: HashSet<ProductId>,
    fail_write_for: HashSet<ProductId>,
}

/// In-memory stock service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStockService {
    state: Arc<RwLock<InMemoryStockState>>,
}

impl InMemoryStockService {
    /// Creates a new in-memory stock service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a product record.
    pub async fn insert(&self, product_id: ProductId, record: StockRecord) {
        self.state.write().await.products.insert(product_id, record);
    }

    /// Configures the service to fail fetches for a product.
    pub async fn fail_fetch_for(&self, product_id: ProductId) {
        self.state.write().await.fail_fetch_for.insert(product_id);
    }

    /// Configures the service to fail writes for a product.
    pub async fn fail_write_for(&self, product_id: ProductId) {
        self.state.write().await.fail_write_for.insert(product_id);
    }

    /// Returns the stored record for a product.
    pub async fn record(&self, product_id: ProductId) -> Option<StockRecord> {
        self.state.read().await.products.get(&product_id).cloned()
    }

    /// Returns every successful write, in order.
    pub async fn writes(&self) -> Vec<(ProductId, StockRecord)> {
        self.state.read().await.writes.clone()
    }
}

#[async_trait]
impl StockService for InMemoryStockService {
    async fn fetch_stock(&self, product_id: ProductId) -> Result<StockRecord, CheckoutError> {
        let state = self.state.read().await;
        if state.fail_fetch_for.contains(&product_id) {
            return Err(CheckoutError::StockService(format!(
                "Product {product_id} unavailable"
            )));
        }
        state.products.get(&product_id).cloned().ok_or_else(|| {
            CheckoutError::StockService(format!("Product {product_id} not found"))
        })
    }

    async fn replace_stock(
        &self,
        product_id: ProductId,
        record: &StockRecord,
    ) -> Result<(), CheckoutError> {
        let mut state = self.state.write().await;
        if state.fail_write_for.contains(&product_id) {
            return Err(CheckoutError::StockService(format!(
                "Update for product {product_id} rejected"
            )));
        }
        state.products.insert(product_id, record.clone());
        state.writes.push((product_id, record.clone()));
        Ok(())
    }
}
