//! Checkout error types.

use cart::CartError;
use common::{CustomerId, OrderId};
use thiserror::Error;

use crate::form::FieldErrors;
use crate::services::orders::OrderStatus;

/// Errors that can occur during checkout operations.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The shipping form has invalid fields; nothing was sent.
    #[error("Checkout form has {} invalid field(s)", .0.len())]
    Validation(FieldErrors),

    /// Checkout was attempted with an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Every cart item failed the pre-submission checks.
    #[error("Cart has no orderable items")]
    NoOrderableItems,

    /// The customer identity is not a usable ID.
    #[error("Invalid customer id: {0}")]
    InvalidCustomer(CustomerId),

    /// A request could not be sent or its response could not be read.
    #[error("{operation} failed: {source}")]
    Http {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The remote service answered with a non-success status.
    #[error("{operation} failed with HTTP {status}: {body}")]
    Remote {
        operation: &'static str,
        status: u16,
        body: String,
    },

    /// The order service accepted the order but returned no identifier.
    #[error("Order service response did not include an order id")]
    MissingOrderId,

    /// Order service error.
    #[error("Order service error: {0}")]
    OrderService(String),

    /// Stock service error.
    #[error("Stock service error: {0}")]
    StockService(String),

    /// Payment service error.
    #[error("Payment service error: {0}")]
    PaymentService(String),

    /// A flow is in the wrong state for the requested operation.
    #[error("Invalid state: expected {expected}, actual {actual}")]
    InvalidState {
        expected: &'static str,
        actual: String,
    },

    /// Only orders still being processed can be cancelled.
    #[error("Order {order_id} cannot be cancelled while {status}")]
    NotCancellable {
        order_id: OrderId,
        status: OrderStatus,
    },

    /// Order not found in the customer's history.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// Cart storage error.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience type alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;
