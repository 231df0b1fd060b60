//! Order submission saga constants and pre-submission line planning.

use cart::{Cart, CartItem};
use chrono::NaiveDate;
use common::{Money, OrderId, ProductId};
use serde::{Deserialize, Serialize};

/// The saga type identifier for order submission.
pub const SAGA_TYPE: &str = "OrderSubmission";

/// Step name: create the order header.
pub const STEP_CREATE_HEADER: &str = "create_header";

/// Step name: create one order line.
pub const STEP_CREATE_LINE: &str = "create_line";

/// Step name: decrement stock for one line.
pub const STEP_RECONCILE_STOCK: &str = "reconcile_stock";

/// Step name: request a payment session.
pub const STEP_REQUEST_PAYMENT: &str = "request_payment";

/// Largest quantity the remote order-line endpoint accepts.
const MAX_LINE_QUANTITY: u32 = i32::MAX as u32;

/// Builds the reference shown by the payment provider, e.g. `INV-20250601-42`.
pub fn external_order_ref(order_date: NaiveDate, order_id: OrderId) -> String {
    format!("INV-{}-{}", order_date.format("%Y%m%d"), order_id)
}

/// Why a cart item was left out of the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    InvalidProductId,
    InvalidQuantity,
    NegativePrice,
}

impl ExclusionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExclusionReason::InvalidProductId => "product id is not a positive integer",
            ExclusionReason::InvalidQuantity => "quantity is not a positive integer",
            ExclusionReason::NegativePrice => "unit price is negative",
        }
    }
}

impl std::fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A cart item that passed the pre-submission checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
}

impl PlannedLine {
    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// The lines a checkout will submit and the items it left out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinePlan {
    pub lines: Vec<PlannedLine>,
    pub excluded: Vec<(ProductId, ExclusionReason)>,
}

impl LinePlan {
    /// Sum of the planned line subtotals.
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(PlannedLine::subtotal).sum()
    }

    /// Order total: planned subtotals plus the shipping fee.
    pub fn total(&self, shipping_fee: Money) -> Money {
        self.subtotal() + shipping_fee
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

fn check_item(item: &CartItem) -> Result<(), ExclusionReason> {
    if !item.product_id.is_valid() {
        return Err(ExclusionReason::InvalidProductId);
    }
    if item.quantity == 0 || item.quantity > MAX_LINE_QUANTITY {
        return Err(ExclusionReason::InvalidQuantity);
    }
    if item.unit_price.is_negative() {
        return Err(ExclusionReason::NegativePrice);
    }
    Ok(())
}

/// Splits the cart into orderable lines and excluded items, keeping cart order.
pub fn plan_lines(cart: &Cart) -> LinePlan {
    let mut plan = LinePlan::default();
    for item in cart.items() {
        match check_item(item) {
            Ok(()) => plan.lines.push(PlannedLine {
                product_id: item.product_id,
                name: item.name.clone(),
                unit_price: item.unit_price,
                quantity: item.quantity,
            }),
            Err(reason) => plan.excluded.push((item.product_id, reason)),
        }
    }
    plan
}
