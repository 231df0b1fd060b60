//! Payment service trait and in-memory implementation.

use std::sync::Arc;

use async_trait::async_trait;
use common::Money;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::CheckoutError;

/// Request for a payment session for an already-created order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// Reference the provider shows to the customer, e.g. `INV-20250601-42`.
    pub external_order_ref: String,
    pub amount: Money,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

/// A payment session opened by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSession {
    pub session_id: Option<String>,
    pub amount: Money,
    /// Hosted payment page; `None` when the provider needs no interaction.
    pub redirect_url: Option<String>,
}

/// Trait for the payment provider.
#[async_trait]
pub trait PaymentService: Send + Sync {
    /// Requests a payment session.
    async fn request_session(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentSession, CheckoutError>;
}

/// How the in-memory provider answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaymentBehavior {
    /// Return a hosted payment page.
    #[default]
    Redirect,
    /// Accept without a hosted page.
    NoRedirect,
    /// Fail the request.
    Fail,
}

#[derive(Debug, Default)]
struct InMemoryPaymentState {
    requests: Vec<PaymentRequest>,
    next_id: u32,
    behavior: PaymentBehavior,
}

/// In-memory payment service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentService {
    state: Arc<RwLock<InMemoryPaymentState>>,
}

impl InMemoryPaymentService {
    /// Creates a new in-memory payment service that returns redirects.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures how subsequent requests are answered.
    pub async fn set_behavior(&self, behavior: PaymentBehavior) {
        self.state.write().await.behavior = behavior;
    }

    /// Returns every request received, including failed ones.
    pub async fn requests(&self) -> Vec<PaymentRequest> {
        self.state.read().await.requests.clone()
    }
}

#[async_trait]
impl PaymentService for InMemoryPaymentService {
    async fn request_session(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentSession, CheckoutError> {
        let mut state = self.state.write().await;
        state.requests.push(request.clone());

        match state.behavior {
            PaymentBehavior::Fail => Err(CheckoutError::PaymentService(
                "Payment gateway timeout".to_string(),
            )),
            behavior => {
                state.next_id += 1;
                let session_id = format!("PAY-{:04}", state.next_id);
                let redirect_url = (behavior == PaymentBehavior::Redirect)
                    .then(|| format!("https://pay.example.com/session/{session_id}"));
                Ok(PaymentSession {
                    session_id: Some(session_id),
                    amount: request.amount,
                    redirect_url,
                })
            }
        }
    }
}
