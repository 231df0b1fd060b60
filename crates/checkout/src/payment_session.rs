//! Hosted payment page hand-off.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::aggregate::SagaRun;
use crate::error::{CheckoutError, Result};
use crate::events::SagaEvent;
use crate::services::cart::CartAccess;
use crate::services::navigation::{Navigator, schedule_home};
use crate::state::SagaState;

/// The state of the hosted payment flow.
///
/// State transitions:
/// ```text
/// Idle ──► Presenting ──┬──► UserCompleted
///                       └──► UserCancelled
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PaymentFlowState {
    #[default]
    Idle,
    /// The provider's page is open.
    Presenting { redirect_url: String },
    /// The customer said they paid.
    UserCompleted,
    /// The customer closed the page without paying.
    UserCancelled,
}

impl PaymentFlowState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentFlowState::Idle => "Idle",
            PaymentFlowState::Presenting { .. } => "Presenting",
            PaymentFlowState::UserCompleted => "UserCompleted",
            PaymentFlowState::UserCancelled => "UserCancelled",
        }
    }
}

/// Presents the provider's hosted payment page for a placed order and
/// resolves how the customer left it.
///
/// Completion is taken on the customer's word. No provider callback or
/// status poll verifies the payment.
pub struct PaymentSessionController<C: CartAccess> {
    cart: Arc<C>,
    navigator: Arc<dyn Navigator>,
    redirect_delay: Duration,
    state: PaymentFlowState,
    run: SagaRun,
}

impl<C: CartAccess> PaymentSessionController<C> {
    pub fn new(cart: Arc<C>, navigator: Arc<dyn Navigator>, redirect_delay: Duration) -> Self {
        Self {
            cart,
            navigator,
            redirect_delay,
            state: PaymentFlowState::Idle,
            run: SagaRun::default(),
        }
    }

    pub fn state(&self) -> &PaymentFlowState {
        &self.state
    }

    /// Returns the run this flow belongs to.
    pub fn run(&self) -> &SagaRun {
        &self.run
    }

    /// Opens the hosted page for a run that is waiting on a redirect and
    /// returns its URL.
    pub fn present(&mut self, run: SagaRun) -> Result<String> {
        if self.state != PaymentFlowState::Idle {
            return Err(CheckoutError::InvalidState {
                expected: "Idle",
                actual: self.state.as_str().to_string(),
            });
        }
        let redirect_url = match (run.state(), run.redirect_url()) {
            (SagaState::AwaitingRedirect, Some(url)) => url.to_string(),
            (state, _) => {
                return Err(CheckoutError::InvalidState {
                    expected: SagaState::AwaitingRedirect.as_str(),
                    actual: state.to_string(),
                });
            }
        };

        tracing::info!(order_id = ?run.order_id(), %redirect_url, "presenting payment page");
        self.run = run;
        self.state = PaymentFlowState::Presenting {
            redirect_url: redirect_url.clone(),
        };
        Ok(redirect_url)
    }

    /// Resolves the flow as paid: clears the cart, completes the run and
    /// schedules the return to the landing page.
    ///
    /// A cart that cannot be cleared is logged and does not stop completion.
    #[tracing::instrument(skip(self), fields(order_id = ?self.run.order_id()))]
    pub async fn confirm(&mut self) -> Result<JoinHandle<()>> {
        self.ensure_presenting()?;

        if let Err(e) = self.cart.clear_cart().await {
            tracing::warn!(error = %e, "failed to clear cart after payment");
        }
        self.run.record(SagaEvent::saga_completed(true));
        self.state = PaymentFlowState::UserCompleted;
        metrics::counter!("checkout_payment_confirmed_total").increment(1);

        Ok(schedule_home(self.navigator.clone(), self.redirect_delay))
    }

    /// Resolves the flow as abandoned. The cart and the order are left as
    /// they are.
    #[tracing::instrument(skip(self), fields(order_id = ?self.run.order_id()))]
    pub fn cancel(&mut self) -> Result<()> {
        self.ensure_presenting()?;

        self.run.record(SagaEvent::payment_abandoned());
        self.state = PaymentFlowState::UserCancelled;
        metrics::counter!("checkout_payment_abandoned_total").increment(1);
        tracing::info!("payment page closed without payment");
        Ok(())
    }

    fn ensure_presenting(&self) -> Result<()> {
        match self.state {
            PaymentFlowState::Presenting { .. } => Ok(()),
            _ => Err(CheckoutError::InvalidState {
                expected: "Presenting",
                actual: self.state.as_str().to_string(),
            }),
        }
    }
}
