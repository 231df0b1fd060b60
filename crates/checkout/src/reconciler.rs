//! Stock reconciliation for ordered items.

use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::services::stock::StockService;

/// The stock change written for one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub product_id: ProductId,
    pub previous: i64,
    pub new: i64,
    /// True when the written stock is negative.
    pub oversold: bool,
}

/// Decrements product stock by read-modify-write against the catalog.
///
/// There is no conditional write, so a concurrent checkout between the read
/// and the write is lost. Runs are sequential within one checkout only.
pub struct StockReconciler<St: StockService> {
    stock: St,
}

impl<St: StockService> StockReconciler<St> {
    pub fn new(stock: St) -> Self {
        Self { stock }
    }

    /// Fetches the product record, subtracts `quantity` from its stock and
    /// writes the whole record back. A negative result is still written.
    ///
    /// Failures are returned to the caller; nothing is retried or rolled back.
    #[tracing::instrument(skip(self))]
    pub async fn reconcile(&self, product_id: ProductId, quantity: u32) -> Result<StockAdjustment> {
        let mut record = self.stock.fetch_stock(product_id).await?;

        let previous = record.stock;
        let new = previous.saturating_sub(i64::from(quantity));
        if new < 0 {
            tracing::warn!(
                %product_id,
                previous,
                ordered = quantity,
                new,
                "stock oversold"
            );
            metrics::counter!("checkout_stock_oversold").increment(1);
        }

        record.stock = new;
        self.stock.replace_stock(product_id, &record).await?;

        tracing::debug!(%product_id, previous, new, "stock reconciled");
        Ok(StockAdjustment {
            product_id,
            previous,
            new,
            oversold: new < 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::stock::{InMemoryStockService, StockRecord};

    #[tokio::test]
    async fn test_decrements_stock() {
        let stock = InMemoryStockService::new();
        stock.insert(ProductId::new(1), StockRecord::new(10)).await;
        let reconciler = StockReconciler::new(stock.clone());

        let adjustment = reconciler.reconcile(ProductId::new(1), 4).await.unwrap();

        assert_eq!(adjustment.previous, 10);
        assert_eq!(adjustment.new, 6);
        assert!(!adjustment.oversold);
        assert_eq!(stock.record(ProductId::new(1)).await.unwrap().stock, 6);
    }

    #[tokio::test]
    async fn test_oversold_is_still_written() {
        let stock = InMemoryStockService::new();
        stock.insert(ProductId::new(1), StockRecord::new(3)).await;
        let reconciler = StockReconciler::new(stock.clone());

        let adjustment = reconciler.reconcile(ProductId::new(1), 5).await.unwrap();

        assert_eq!(adjustment.new, -2);
        assert!(adjustment.oversold);
        let writes = stock.writes().await;
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].1.stock, -2);
    }

    #[tokio::test]
    async fn test_other_attributes_written_back_unchanged() {
        let stock = InMemoryStockService::new();
        let record = StockRecord::new(8)
            .with_attribute("name", "Paracetamol")
            .with_attribute("unit_price", 5000)
            .with_attribute("supplier_code", "SUP-9");
        stock.insert(ProductId::new(2), record.clone()).await;
        let reconciler = StockReconciler::new(stock.clone());

        reconciler.reconcile(ProductId::new(2), 1).await.unwrap();

        let written = stock.record(ProductId::new(2)).await.unwrap();
        assert_eq!(written.stock, 7);
        assert_eq!(written.attributes, record.attributes);
    }

    #[tokio::test]
    async fn test_fetch_failure_skips_write() {
        let stock = InMemoryStockService::new();
        stock.insert(ProductId::new(1), StockRecord::new(5)).await;
        stock.fail_fetch_for(ProductId::new(1)).await;
        let reconciler = StockReconciler::new(stock.clone());

        assert!(reconciler.reconcile(ProductId::new(1), 1).await.is_err());
        assert!(stock.writes().await.is_empty());
    }

    #[tokio::test]
    async fn test_write_failure_is_reported() {
        let stock = InMemoryStockService::new();
        stock.insert(ProductId::new(1), StockRecord::new(5)).await;
        stock.fail_write_for(ProductId::new(1)).await;
        let reconciler = StockReconciler::new(stock.clone());

        assert!(reconciler.reconcile(ProductId::new(1), 1).await.is_err());
        assert_eq!(stock.record(ProductId::new(1)).await.unwrap().stock, 5);
    }
}
