//! Customer order history and cancellation.

use common::{CustomerId, OrderId};

use crate::error::{CheckoutError, Result};
use crate::services::orders::{OrderLineRecord, OrderRecord, OrderService, OrderStatus};

/// Read access to a customer's past orders, plus cancellation of orders
/// that have not shipped yet.
pub struct OrderHistory<O: OrderService> {
    orders: O,
}

impl<O: OrderService> OrderHistory<O> {
    pub fn new(orders: O) -> Self {
        Self { orders }
    }

    /// Lists the customer's orders, most recent first.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, customer_id: CustomerId) -> Result<Vec<OrderRecord>> {
        let mut orders = self.orders.list_orders(customer_id).await?;
        orders.sort_by(|a, b| b.order_date.cmp(&a.order_date).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    /// Lists the lines of one order.
    #[tracing::instrument(skip(self))]
    pub async fn lines(&self, order_id: OrderId) -> Result<Vec<OrderLineRecord>> {
        self.orders.order_lines(order_id).await
    }

    /// Cancels one of the customer's orders by writing it back with status
    /// `cancelled`. Only orders still `processing` can be cancelled.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, customer_id: CustomerId, order_id: OrderId) -> Result<OrderRecord> {
        let mut order = self
            .orders
            .list_orders(customer_id)
            .await?
            .into_iter()
            .find(|o| o.id == order_id)
            .ok_or(CheckoutError::OrderNotFound(order_id))?;

        if !order.status.can_cancel() {
            return Err(CheckoutError::NotCancellable {
                order_id,
                status: order.status,
            });
        }

        order.status = OrderStatus::Cancelled;
        self.orders.replace_order(&order).await?;
        metrics::counter!("checkout_orders_cancelled_total").increment(1);
        tracing::info!(%order_id, "order cancelled");
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use common::{Money, ProductId};

    use super::*;
    use crate::services::orders::{InMemoryOrderService, NewOrder, NewOrderLine};

    async fn place(service: &InMemoryOrderService, customer: i64, day: u32) -> OrderId {
        service
            .create_order(&NewOrder {
                customer_id: CustomerId::new(customer),
                order_date: NaiveDate::from_ymd_opt(2025, 6, day).unwrap(),
                total_amount: Money::from_minor(20000),
                status: OrderStatus::Processing,
                payment_method: "transfer".to_string(),
                shipping_address: "Jl. Merdeka 1, Bandung, 40115".to_string(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_list_is_most_recent_first() {
        let service = InMemoryOrderService::new();
        let older = place(&service, 1, 1).await;
        let newer = place(&service, 1, 5).await;
        place(&service, 2, 9).await;
        let history = OrderHistory::new(service);

        let orders = history.list(CustomerId::new(1)).await.unwrap();
        let ids: Vec<_> = orders.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![newer, older]);
    }

    #[tokio::test]
    async fn test_lines_for_order() {
        let service = InMemoryOrderService::new();
        let order_id = place(&service, 1, 1).await;
        service
            .create_order_line(&NewOrderLine {
                order_id,
                product_id: ProductId::new(3),
                quantity: 2,
            })
            .await
            .unwrap();
        let history = OrderHistory::new(service);

        let lines = history.lines(order_id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_cancel_processing_order() {
        let service = InMemoryOrderService::new();
        let order_id = place(&service, 1, 1).await;
        let history = OrderHistory::new(service.clone());

        let cancelled = history.cancel(CustomerId::new(1), order_id).await.unwrap();

        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(
            service.order(order_id).await.unwrap().status,
            OrderStatus::Cancelled
        );
    }

    #[tokio::test]
    async fn test_cancel_rejects_other_statuses() {
        let service = InMemoryOrderService::new();
        let order_id = place(&service, 1, 1).await;
        let history = OrderHistory::new(service.clone());
        history.cancel(CustomerId::new(1), order_id).await.unwrap();

        let result = history.cancel(CustomerId::new(1), order_id).await;
        assert!(matches!(
            result,
            Err(CheckoutError::NotCancellable {
                status: OrderStatus::Cancelled,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_cancel_other_customers_order_is_not_found() {
        let service = InMemoryOrderService::new();
        let order_id = place(&service, 1, 1).await;
        let history = OrderHistory::new(service);

        let result = history.cancel(CustomerId::new(2), order_id).await;
        assert!(matches!(result, Err(CheckoutError::OrderNotFound(_))));
    }
}
