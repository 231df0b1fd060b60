//! Saga journal events.

use chrono::{DateTime, NaiveDate, Utc};
use common::{CustomerId, Money, OrderId, ProductId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::order_submission::ExclusionReason;

/// Events recorded while a checkout saga runs.
///
/// The journal of these events is the only record of which remote writes
/// were attempted, since the remote service offers no transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SagaEvent {
    /// Checkout submitted.
    SagaStarted(SagaStartedData),

    /// The order header was created.
    HeaderCreated(HeaderCreatedData),

    /// The order header could not be created.
    HeaderFailed(StepFailedData),

    /// A cart item failed the pre-submission checks.
    ItemExcluded(ItemExcludedData),

    /// An order line was created.
    LineCreated(LineData),

    /// An order line could not be created.
    LineFailed(ItemFailedData),

    /// Stock was decremented for a line.
    StockReconciled(StockReconciledData),

    /// Stock could not be updated for a line.
    StockFailed(ItemFailedData),

    /// A payment session was requested.
    PaymentRequested(PaymentRequestedData),

    /// The provider returned a hosted payment page.
    PaymentRedirected(PaymentRedirectedData),

    /// The payment session could not be created.
    PaymentFailed(StepFailedData),

    /// The customer left the hosted payment page without confirming.
    PaymentAbandoned(PaymentAbandonedData),

    /// The order is complete and the cart cleared.
    SagaCompleted(SagaCompletedData),
}

impl SagaEvent {
    /// Returns the event type name.
    pub fn event_type(&self) -> &'static str {
        match self {
            SagaEvent::SagaStarted(_) => "SagaStarted",
            SagaEvent::HeaderCreated(_) => "HeaderCreated",
            SagaEvent::HeaderFailed(_) => "HeaderFailed",
            SagaEvent::ItemExcluded(_) => "ItemExcluded",
            SagaEvent::LineCreated(_) => "LineCreated",
            SagaEvent::LineFailed(_) => "LineFailed",
            SagaEvent::StockReconciled(_) => "StockReconciled",
            SagaEvent::StockFailed(_) => "StockFailed",
            SagaEvent::PaymentRequested(_) => "PaymentRequested",
            SagaEvent::PaymentRedirected(_) => "PaymentRedirected",
            SagaEvent::PaymentFailed(_) => "PaymentFailed",
            SagaEvent::PaymentAbandoned(_) => "PaymentAbandoned",
            SagaEvent::SagaCompleted(_) => "SagaCompleted",
        }
    }
}

/// Data for SagaStarted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SagaStartedData {
    /// The saga run ID.
    pub saga_id: Uuid,
    /// The customer placing the order.
    pub customer_id: CustomerId,
    /// Number of items in the submitted cart.
    pub item_count: usize,
    /// When the run started.
    pub started_at: DateTime<Utc>,
}

/// Data for HeaderCreated event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderCreatedData {
    /// Remote-assigned order ID.
    pub order_id: OrderId,
    /// Order date sent on the header.
    pub order_date: NaiveDate,
    /// Total sent on the header.
    pub total_amount: Money,
}

/// Data for step failures that are not tied to one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepFailedData {
    /// The step that failed.
    pub step_name: String,
    /// Error message describing the failure.
    pub error: String,
}

/// Data for ItemExcluded event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemExcludedData {
    pub product_id: ProductId,
    pub reason: ExclusionReason,
}

/// Data for LineCreated event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineData {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Data for per-item failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemFailedData {
    pub product_id: ProductId,
    pub error: String,
}

/// Data for StockReconciled event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockReconciledData {
    pub product_id: ProductId,
    pub previous: i64,
    pub new: i64,
}

/// Data for PaymentRequested event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequestedData {
    /// Reference shown by the provider.
    pub external_order_ref: String,
    /// Amount requested.
    pub amount: Money,
}

/// Data for PaymentRedirected event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRedirectedData {
    pub session_id: Option<String>,
    pub redirect_url: String,
}

/// Data for PaymentAbandoned event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentAbandonedData {
    /// When the customer closed the payment page.
    pub abandoned_at: DateTime<Utc>,
}

/// Data for SagaCompleted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SagaCompletedData {
    /// True when completion came from the customer confirming payment on the
    /// hosted page rather than from a provider that needed no interaction.
    pub confirmed_by_customer: bool,
    /// When the saga completed.
    pub completed_at: DateTime<Utc>,
}

// Convenience constructors
impl SagaEvent {
    /// Creates a SagaStarted event.
    pub fn saga_started(saga_id: Uuid, customer_id: CustomerId, item_count: usize) -> Self {
        SagaEvent::SagaStarted(SagaStartedData {
            saga_id,
            customer_id,
            item_count,
            started_at: Utc::now(),
        })
    }

    /// Creates a HeaderCreated event.
    pub fn header_created(order_id: OrderId, order_date: NaiveDate, total_amount: Money) -> Self {
        SagaEvent::HeaderCreated(HeaderCreatedData {
            order_id,
            order_date,
            total_amount,
        })
    }

    /// Creates a HeaderFailed event.
    pub fn header_failed(error: impl Into<String>) -> Self {
        SagaEvent::HeaderFailed(StepFailedData {
            step_name: crate::order_submission::STEP_CREATE_HEADER.to_string(),
            error: error.into(),
        })
    }

    /// Creates an ItemExcluded event.
    pub fn item_excluded(product_id: ProductId, reason: ExclusionReason) -> Self {
        SagaEvent::ItemExcluded(ItemExcludedData { product_id, reason })
    }

    /// Creates a LineCreated event.
    pub fn line_created(product_id: ProductId, quantity: u32) -> Self {
        SagaEvent::LineCreated(LineData {
            product_id,
            quantity,
        })
    }

    /// Creates a LineFailed event.
    pub fn line_failed(product_id: ProductId, error: impl Into<String>) -> Self {
        SagaEvent::LineFailed(ItemFailedData {
            product_id,
            error: error.into(),
        })
    }

    /// Creates a StockReconciled event.
    pub fn stock_reconciled(product_id: ProductId, previous: i64, new: i64) -> Self {
        SagaEvent::StockReconciled(StockReconciledData {
            product_id,
            previous,
            new,
        })
    }

    /// Creates a StockFailed event.
    pub fn stock_failed(product_id: ProductId, error: impl Into<String>) -> Self {
        SagaEvent::StockFailed(ItemFailedData {
            product_id,
            error: error.into(),
        })
    }

    /// Creates a PaymentRequested event.
    pub fn payment_requested(external_order_ref: impl Into<String>, amount: Money) -> Self {
        SagaEvent::PaymentRequested(PaymentRequestedData {
            external_order_ref: external_order_ref.into(),
            amount,
        })
    }

    /// Creates a PaymentRedirected event.
    pub fn payment_redirected(session_id: Option<String>, redirect_url: impl Into<String>) -> Self {
        SagaEvent::PaymentRedirected(PaymentRedirectedData {
            session_id,
            redirect_url: redirect_url.into(),
        })
    }

    /// Creates a PaymentFailed event.
    pub fn payment_failed(error: impl Into<String>) -> Self {
        SagaEvent::PaymentFailed(StepFailedData {
            step_name: crate::order_submission::STEP_REQUEST_PAYMENT.to_string(),
            error: error.into(),
        })
    }

    /// Creates a PaymentAbandoned event.
    pub fn payment_abandoned() -> Self {
        SagaEvent::PaymentAbandoned(PaymentAbandonedData {
            abandoned_at: Utc::now(),
        })
    }

    /// Creates a SagaCompleted event.
    pub fn saga_completed(confirmed_by_customer: bool) -> Self {
        SagaEvent::SagaCompleted(SagaCompletedData {
            confirmed_by_customer,
            completed_at: Utc::now(),
        })
    }
}
