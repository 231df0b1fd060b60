//! Saga state machine.

use serde::{Deserialize, Serialize};

/// The state of a checkout saga run.
///
/// State transitions:
/// ```text
/// Idle ──► Submitting ──┬──► HeaderFailed
///                       └──► LinesAndStockInFlight ──► PaymentRequested ──┬──► AwaitingRedirect ──► Completed
///                                                                         ├──► Completed
///                                                                         └──► PaymentFailed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SagaState {
    /// Nothing submitted yet.
    #[default]
    Idle,

    /// The order header request is in flight.
    Submitting,

    /// The order header could not be created (terminal state).
    HeaderFailed,

    /// Order lines and stock updates are being sent.
    LinesAndStockInFlight,

    /// The payment session request is in flight.
    PaymentRequested,

    /// The customer is on the provider's hosted payment page.
    AwaitingRedirect,

    /// The order is placed and the cart cleared (terminal state).
    Completed,

    /// The order is placed but no payment session exists.
    PaymentFailed,
}

impl SagaState {
    /// Returns true if the order header can be submitted.
    pub fn can_submit(&self) -> bool {
        matches!(self, SagaState::Idle)
    }

    /// Returns true if a durable order exists in this state.
    pub fn order_placed(&self) -> bool {
        matches!(
            self,
            SagaState::LinesAndStockInFlight
                | SagaState::PaymentRequested
                | SagaState::AwaitingRedirect
                | SagaState::Completed
                | SagaState::PaymentFailed
        )
    }

    /// Returns true if the run can be completed from this state.
    pub fn can_complete(&self) -> bool {
        matches!(
            self,
            SagaState::PaymentRequested | SagaState::AwaitingRedirect
        )
    }

    /// Returns true if this is a terminal state.
    ///
    /// `PaymentFailed` is not terminal: the order stands and payment can be
    /// settled outside this run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SagaState::HeaderFailed | SagaState::Completed)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaState::Idle => "Idle",
            SagaState::Submitting => "Submitting",
            SagaState::HeaderFailed => "HeaderFailed",
            SagaState::LinesAndStockInFlight => "LinesAndStockInFlight",
            SagaState::PaymentRequested => "PaymentRequested",
            SagaState::AwaitingRedirect => "AwaitingRedirect",
            SagaState::Completed => "Completed",
            SagaState::PaymentFailed => "PaymentFailed",
        }
    }
}

impl std::fmt::Display for SagaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
