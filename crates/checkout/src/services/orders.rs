//! Order service trait and in-memory implementation.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use common::{CustomerId, Money, OrderId, ProductId};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::CheckoutError;

/// Lifecycle status of an order as stored by the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Processing,
    Shipped,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Returns the status name as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Returns true if the customer may still cancel the order.
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Processing)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Order header submitted at the start of checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOrder {
    pub customer_id: CustomerId,
    #[serde(deserialize_with = "date_part")]
    pub order_date: NaiveDate,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub payment_method: String,
    pub shipping_address: String,
}

/// One order line submitted after the header exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderLine {
    pub order_id: OrderId,
    pub product_id: ProductId,
    #[serde(deserialize_with = "common::types::lenient_u32")]
    pub quantity: u32,
}

/// A stored order line.
pub type OrderLineRecord = NewOrderLine;

/// An order header as stored by the remote service.
///
/// Fields this client does not model are kept so a full replacement does not
/// drop them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    #[serde(alias = "order_id")]
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub order_date: NaiveDate,
    pub total_amount: Money,
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub shipping_address: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Reads an order date given as `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` or
/// RFC 3339, keeping only the date.
fn date_part<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date()))
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| serde::de::Error::custom(format!("not an order date: {raw:?}")))
}

/// Trait for the remote order service.
#[async_trait]
pub trait OrderService: Send + Sync {
    /// Creates an order header and returns the ID the service assigned.
    async fn create_order(&self, order: &NewOrder) -> Result<OrderId, CheckoutError>;

    /// Creates a single order line.
    async fn create_order_line(&self, line: &NewOrderLine) -> Result<(), CheckoutError>;

    /// Lists the orders placed by a customer.
    async fn list_orders(&self, customer_id: CustomerId) -> Result<Vec<OrderRecord>, CheckoutError>;

    /// Lists the lines of an order.
    async fn order_lines(&self, order_id: OrderId) -> Result<Vec<OrderLineRecord>, CheckoutError>;

    /// Replaces a stored order header in full.
    async fn replace_order(&self, order: &OrderRecord) -> Result<(), CheckoutError>;
}

#[derive(Debug, Default)]
struct InMemoryOrderState {
    orders: BTreeMap<OrderId, OrderRecord>,
    lines: Vec<OrderLineRecord>,
    line_attempts: Vec<ProductId>,
    next_id: i64,
    fail_on_create: bool,
    fail_lines_for: HashSet<ProductId>,
}

/// In-memory order service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderService {
    state: Arc<RwLock<InMemoryOrderState>>,
}

impl InMemoryOrderService {
    /// Creates a new in-memory order service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the service to fail header creation.
    pub async fn set_fail_on_create(&self, fail: bool) {
        self.state.write().await.fail_on_create = fail;
    }

    /// Configures the service to reject lines for the given product.
    pub async fn fail_line_for(&self, product_id: ProductId) {
        self.state.write().await.fail_lines_for.insert(product_id);
    }

    /// Returns the number of stored order headers.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Returns a stored order header.
    pub async fn order(&self, order_id: OrderId) -> Option<OrderRecord> {
        self.state.read().await.orders.get(&order_id).cloned()
    }

    /// Returns every stored line.
    pub async fn lines(&self) -> Vec<OrderLineRecord> {
        self.state.read().await.lines.clone()
    }

    /// Returns the products for which line creation was attempted, in order.
    pub async fn line_attempts(&self) -> Vec<ProductId> {
        self.state.read().await.line_attempts.clone()
    }
}

#[async_trait]
impl OrderService for InMemoryOrderService {
    async fn create_order(&self, order: &NewOrder) -> Result<OrderId, CheckoutError> {
        let mut state = self.state.write().await;

        if state.fail_on_create {
            return Err(CheckoutError::OrderService(
                "Order service unavailable".to_string(),
            ));
        }

        state.next_id += 1;
        let id = OrderId::new(state.next_id);
        state.orders.insert(
            id,
            OrderRecord {
                id,
                customer_id: order.customer_id,
                order_date: order.order_date,
                total_amount: order.total_amount,
                status: order.status,
                payment_method: order.payment_method.clone(),
                shipping_address: order.shipping_address.clone(),
                extra: serde_json::Map::new(),
            },
        );
        Ok(id)
    }

    async fn create_order_line(&self, line: &NewOrderLine) -> Result<(), CheckoutError> {
        let mut state = self.state.write().await;
        state.line_attempts.push(line.product_id);

        if state.fail_lines_for.contains(&line.product_id) {
            return Err(CheckoutError::OrderService(format!(
                "Product {} rejected",
                line.product_id
            )));
        }
        if !state.orders.contains_key(&line.order_id) {
            return Err(CheckoutError::OrderNotFound(line.order_id));
        }

        state.lines.push(*line);
        Ok(())
    }

    async fn list_orders(&self, customer_id: CustomerId) -> Result<Vec<OrderRecord>, CheckoutError> {
        Ok(self
            .state
            .read()
            .await
            .orders
            .values()
            .filter(|o| o.customer_id == customer_id)
            .cloned()
            .collect())
    }

    async fn order_lines(&self, order_id: OrderId) -> Result<Vec<OrderLineRecord>, CheckoutError> {
        Ok(self
            .state
            .read()
            .await
            .lines
            .iter()
            .filter(|l| l.order_id == order_id)
            .copied()
            .collect())
    }

    async fn replace_order(&self, order: &OrderRecord) -> Result<(), CheckoutError> {
        let mut state = self.state.write().await;
        match state.orders.get_mut(&order.id) {
            Some(stored) => {
                *stored = order.clone();
                Ok(())
            }
            None => Err(CheckoutError::OrderNotFound(order.id)),
        }
    }
}
