//! Saga run aggregate.

use chrono::NaiveDate;
use common::{CustomerId, Money, OrderId, ProductId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::events::SagaEvent;
use crate::order_submission::ExclusionReason;
use crate::state::SagaState;

/// The journal and derived state of one checkout saga run.
///
/// State is rebuilt by applying events in order; `record` also appends the
/// event to the journal so the run can be persisted and replayed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SagaRun {
    saga_id: Option<Uuid>,
    customer_id: Option<CustomerId>,
    state: SagaState,
    order_id: Option<OrderId>,
    order_date: Option<NaiveDate>,
    total_amount: Option<Money>,
    excluded: Vec<(ProductId, ExclusionReason)>,
    lines_created: Vec<ProductId>,
    line_failures: Vec<(ProductId, String)>,
    stock_reconciled: Vec<ProductId>,
    stock_failures: Vec<(ProductId, String)>,
    oversold: Vec<ProductId>,
    external_order_ref: Option<String>,
    payment_session_id: Option<String>,
    redirect_url: Option<String>,
    payment_abandoned: bool,
    confirmed_by_customer: bool,
    /// Reason for the header or payment failure, if any.
    failure_reason: Option<String>,
    events: Vec<SagaEvent>,
}

impl SagaRun {
    /// Rebuilds a run from its journal.
    pub fn from_events(events: impl IntoIterator<Item = SagaEvent>) -> Self {
        let mut run = Self::default();
        for event in events {
            run.record(event);
        }
        run
    }

    /// Applies an event and appends it to the journal.
    pub fn record(&mut self, event: SagaEvent) {
        self.apply(event.clone());
        self.events.push(event);
    }

    /// Applies an event to the derived state without journaling it.
    pub fn apply(&mut self, event: SagaEvent) {
        match event {
            SagaEvent::SagaStarted(data) => {
                self.saga_id = Some(data.saga_id);
                self.customer_id = Some(data.customer_id);
                self.state = SagaState::Submitting;
            }
            SagaEvent::HeaderCreated(data) => {
                self.order_id = Some(data.order_id);
                self.order_date = Some(data.order_date);
                self.total_amount = Some(data.total_amount);
                self.state = SagaState::LinesAndStockInFlight;
            }
            SagaEvent::HeaderFailed(data) => {
                self.failure_reason = Some(data.error);
                self.state = SagaState::HeaderFailed;
            }
            SagaEvent::ItemExcluded(data) => {
                self.excluded.push((data.product_id, data.reason));
            }
            SagaEvent::LineCreated(data) => {
                self.lines_created.push(data.product_id);
            }
            SagaEvent::LineFailed(data) => {
                self.line_failures.push((data.product_id, data.error));
            }
            SagaEvent::StockReconciled(data) => {
                self.stock_reconciled.push(data.product_id);
                if data.new < 0 {
                    self.oversold.push(data.product_id);
                }
            }
            SagaEvent::StockFailed(data) => {
                self.stock_failures.push((data.product_id, data.error));
            }
            SagaEvent::PaymentRequested(data) => {
                self.external_order_ref = Some(data.external_order_ref);
                self.state = SagaState::PaymentRequested;
            }
            SagaEvent::PaymentRedirected(data) => {
                self.payment_session_id = data.session_id;
                self.redirect_url = Some(data.redirect_url);
                self.state = SagaState::AwaitingRedirect;
            }
            SagaEvent::PaymentFailed(data) => {
                self.failure_reason = Some(data.error);
                self.state = SagaState::PaymentFailed;
            }
            SagaEvent::PaymentAbandoned(_) => {
                // Order and cart are left as they are
                self.payment_abandoned = true;
            }
            SagaEvent::SagaCompleted(data) => {
                self.confirmed_by_customer = data.confirmed_by_customer;
                self.state = SagaState::Completed;
            }
        }
    }
}

// Query methods
impl SagaRun {
    pub fn saga_id(&self) -> Option<Uuid> {
        self.saga_id
    }

    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    pub fn state(&self) -> SagaState {
        self.state
    }

    /// Returns the remote order ID once the header exists.
    pub fn order_id(&self) -> Option<OrderId> {
        self.order_id
    }

    pub fn order_date(&self) -> Option<NaiveDate> {
        self.order_date
    }

    pub fn total_amount(&self) -> Option<Money> {
        self.total_amount
    }

    /// Items left out by the pre-submission checks.
    pub fn excluded(&self) -> &[(ProductId, ExclusionReason)] {
        &self.excluded
    }

    pub fn lines_created(&self) -> &[ProductId] {
        &self.lines_created
    }

    /// Lines the remote service did not store, with the error seen.
    pub fn line_failures(&self) -> &[(ProductId, String)] {
        &self.line_failures
    }

    pub fn stock_reconciled(&self) -> &[ProductId] {
        &self.stock_reconciled
    }

    /// Products whose stock was not decremented, with the error seen.
    pub fn stock_failures(&self) -> &[(ProductId, String)] {
        &self.stock_failures
    }

    /// Products whose stock was written below zero.
    pub fn oversold(&self) -> &[ProductId] {
        &self.oversold
    }

    pub fn external_order_ref(&self) -> Option<&str> {
        self.external_order_ref.as_deref()
    }

    pub fn payment_session_id(&self) -> Option<&str> {
        self.payment_session_id.as_deref()
    }

    pub fn redirect_url(&self) -> Option<&str> {
        self.redirect_url.as_deref()
    }

    pub fn payment_abandoned(&self) -> bool {
        self.payment_abandoned
    }

    /// True if completion rests on the customer's word rather than the provider's.
    pub fn confirmed_by_customer(&self) -> bool {
        self.confirmed_by_customer
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    /// Returns the journal in the order events were recorded.
    pub fn events(&self) -> &[SagaEvent] {
        &self.events
    }
}
