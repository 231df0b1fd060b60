//! `storefront orders ...`

use std::io::Write;

use checkout::{OrderHistory, OrderRecord};
use common::OrderId;

use super::{line, signed_in};
use crate::App;
use crate::error::Result;

fn history(app: &App) -> OrderHistory<checkout::RestClient> {
    OrderHistory::new(app.client().clone())
}

/// Prints the signed-in customer's orders, most recent first.
pub async fn list(app: &App, out: &mut dyn Write) -> Result<()> {
    let customer = signed_in(app).await?;
    let orders = history(app).list(customer.id).await?;

    if orders.is_empty() {
        return line(out, "No orders yet");
    }
    for order in &orders {
        render(order, out)?;
    }
    Ok(())
}

/// Prints the lines of one order.
pub async fn lines(app: &App, order_id: i64, out: &mut dyn Write) -> Result<()> {
    let order_id = OrderId::new(order_id);
    let lines = history(app).lines(order_id).await?;

    line(out, format_args!("Order #{order_id}"))?;
    if lines.is_empty() {
        return line(out, "  (no lines)");
    }
    for l in &lines {
        line(out, format_args!("  product #{:<8} x{}", l.product_id, l.quantity))?;
    }
    Ok(())
}

/// Cancels one of the signed-in customer's orders that has not shipped.
pub async fn cancel(app: &App, order_id: i64, out: &mut dyn Write) -> Result<()> {
    let customer = signed_in(app).await?;
    let order = history(app)
        .cancel(customer.id, OrderId::new(order_id))
        .await?;

    line(out, format_args!("Order #{} cancelled", order.id))
}

fn render(order: &OrderRecord, out: &mut dyn Write) -> Result<()> {
    line(
        out,
        format_args!(
            "#{:<6} {}  {:<10} {}",
            order.id, order.order_date, order.status, order.total_amount
        ),
    )
}
