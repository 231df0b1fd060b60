//! What a checkout run tells the customer.

use common::OrderId;
use tokio::task::JoinHandle;

use crate::aggregate::SagaRun;
use crate::services::payment::PaymentSession;

/// What the customer should see after a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextStep {
    /// Continue on the provider's hosted payment page.
    AwaitPayment(PaymentSession),
    /// Nothing left to do; the landing page follows after a delay.
    ReturnHome,
}

/// The user-visible result of a checkout run.
///
/// Remote failures never escape a run as errors; they resolve to one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SagaOutcome {
    /// The order is placed and payment is in hand or under way.
    Success { order_id: OrderId, next: NextStep },
    /// The order is placed but payment could not be set up.
    DegradedSuccess { order_id: OrderId, message: String },
    /// Nothing durable was created.
    FatalError { message: String },
}

impl SagaOutcome {
    /// Returns the placed order, if any.
    pub fn order_id(&self) -> Option<OrderId> {
        match self {
            SagaOutcome::Success { order_id, .. } | SagaOutcome::DegradedSuccess { order_id, .. } => {
                Some(*order_id)
            }
            SagaOutcome::FatalError { .. } => None,
        }
    }

    /// Returns the outcome label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaOutcome::Success { .. } => "success",
            SagaOutcome::DegradedSuccess { .. } => "degraded_success",
            SagaOutcome::FatalError { .. } => "fatal_error",
        }
    }

    /// Returns the message shown to the customer.
    pub fn user_message(&self) -> String {
        match self {
            SagaOutcome::Success {
                order_id,
                next: NextStep::AwaitPayment(_),
            } => format!("Order #{order_id} placed. Continue to the payment page to pay."),
            SagaOutcome::Success {
                order_id,
                next: NextStep::ReturnHome,
            } => format!("Order #{order_id} placed. Thank you for your purchase."),
            SagaOutcome::DegradedSuccess { message, .. } | SagaOutcome::FatalError { message } => {
                message.clone()
            }
        }
    }
}

/// Everything a checkout run produced.
#[derive(Debug)]
pub struct SagaReport {
    pub outcome: SagaOutcome,
    /// The run's journal and derived state.
    pub run: SagaRun,
    /// Pending return to the landing page, when one was scheduled.
    pub navigation: Option<JoinHandle<()>>,
}
