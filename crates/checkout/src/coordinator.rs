//! Saga coordinator for order submission.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use common::{CustomerId, Money};
use uuid::Uuid;

use crate::aggregate::SagaRun;
use crate::config::CheckoutConfig;
use crate::error::{CheckoutError, Result};
use crate::events::SagaEvent;
use crate::form::{ShippingProfile, validate};
use crate::order_submission::{self, LinePlan, external_order_ref, plan_lines};
use crate::outcome::{NextStep, SagaOutcome, SagaReport};
use crate::payment_session::PaymentSessionController;
use crate::reconciler::StockReconciler;
use crate::services::cart::CartAccess;
use crate::services::navigation::{Navigator, schedule_home};
use crate::services::orders::{NewOrder, NewOrderLine, OrderService, OrderStatus};
use crate::services::payment::{PaymentRequest, PaymentService};
use crate::services::stock::StockService;

const HEADER_FAILED_MESSAGE: &str =
    "Your order could not be placed. Nothing was charged; please try again.";

/// Checkout settings the coordinator needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSettings {
    pub shipping_fee: Money,
    pub payment_method: String,
    pub redirect_delay: Duration,
}

impl From<&CheckoutConfig> for CheckoutSettings {
    fn from(config: &CheckoutConfig) -> Self {
        Self {
            shipping_fee: config.shipping_fee,
            payment_method: config.payment_method.clone(),
            redirect_delay: config.redirect_delay,
        }
    }
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self::from(&CheckoutConfig::default())
    }
}

/// Orchestrates the order submission saga.
///
/// The coordinator drives header → lines → stock → payment, one remote call
/// at a time. Only the header is fatal; later failures are journaled, logged
/// and counted, and the run still resolves to an outcome for the customer.
pub struct SagaCoordinator<C, O, St, P>
where
    C: CartAccess,
    O: OrderService,
    St: StockService,
    P: PaymentService,
{
    cart: Arc<C>,
    orders: O,
    reconciler: StockReconciler<St>,
    payment: P,
    navigator: Arc<dyn Navigator>,
    settings: CheckoutSettings,
}

impl<C, O, St, P> SagaCoordinator<C, O, St, P>
where
    C: CartAccess,
    O: OrderService,
    St: StockService,
    P: PaymentService,
{
    /// Creates a new saga coordinator.
    pub fn new(
        cart: Arc<C>,
        orders: O,
        stock: St,
        payment: P,
        navigator: Arc<dyn Navigator>,
        settings: CheckoutSettings,
    ) -> Self {
        Self {
            cart,
            orders,
            reconciler: StockReconciler::new(stock),
            payment,
            navigator,
            settings,
        }
    }

    /// Creates the controller for a run that ended on a hosted payment page.
    pub fn payment_controller(&self) -> PaymentSessionController<C> {
        PaymentSessionController::new(
            self.cart.clone(),
            self.navigator.clone(),
            self.settings.redirect_delay,
        )
    }

    /// Submits the current cart as an order for `customer_id`.
    ///
    /// Returns an error only for problems found before anything is sent: an
    /// invalid form, an invalid customer, or a cart with nothing to order.
    /// Every remote failure resolves to a [`SagaOutcome`] instead.
    #[tracing::instrument(skip(self, profile), fields(saga_type = order_submission::SAGA_TYPE))]
    pub async fn submit(
        &self,
        customer_id: CustomerId,
        profile: &ShippingProfile,
    ) -> Result<SagaReport> {
        // 1. Preconditions, before any network call
        let errors = validate(profile);
        if !errors.is_empty() {
            return Err(CheckoutError::Validation(errors));
        }
        if !customer_id.is_valid() {
            return Err(CheckoutError::InvalidCustomer(customer_id));
        }

        let cart = self.cart.current_cart().await;
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let plan = plan_lines(&cart);
        if plan.is_empty() {
            return Err(CheckoutError::NoOrderableItems);
        }

        metrics::counter!("checkout_saga_executions_total").increment(1);
        let saga_start = std::time::Instant::now();

        let mut run = SagaRun::default();
        run.record(SagaEvent::saga_started(Uuid::new_v4(), customer_id, cart.len()));
        for (product_id, reason) in &plan.excluded {
            tracing::warn!(%product_id, %reason, "cart item excluded from order");
            run.record(SagaEvent::item_excluded(*product_id, *reason));
        }

        let report = self.execute(customer_id, profile, &plan, run).await;

        metrics::histogram!("checkout_saga_duration_seconds")
            .record(saga_start.elapsed().as_secs_f64());
        metrics::counter!("checkout_saga_outcome", "outcome" => report.outcome.as_str())
            .increment(1);
        tracing::info!(
            outcome = report.outcome.as_str(),
            state = %report.run.state(),
            "checkout saga finished"
        );
        Ok(report)
    }

    async fn execute(
        &self,
        customer_id: CustomerId,
        profile: &ShippingProfile,
        plan: &LinePlan,
        mut run: SagaRun,
    ) -> SagaReport {
        // 2. Order header
        let order_date = Utc::now().date_naive();
        let total_amount = plan.total(self.settings.shipping_fee);
        let header = NewOrder {
            customer_id,
            order_date,
            total_amount,
            status: OrderStatus::Processing,
            payment_method: self.settings.payment_method.clone(),
            shipping_address: profile.shipping_address(),
        };

        tracing::info!(step = order_submission::STEP_CREATE_HEADER, "saga step started");
        let order_id = match self.orders.create_order(&header).await {
            Ok(order_id) => order_id,
            Err(e) => {
                tracing::error!(error = %e, "order header could not be created");
                run.record(SagaEvent::header_failed(e.to_string()));
                return SagaReport {
                    outcome: SagaOutcome::FatalError {
                        message: HEADER_FAILED_MESSAGE.to_string(),
                    },
                    run,
                    navigation: None,
                };
            }
        };
        run.record(SagaEvent::header_created(order_id, order_date, total_amount));

        // 3. Order lines; a failed line never stops the others
        tracing::info!(%order_id, step = order_submission::STEP_CREATE_LINE, "saga step started");
        for line in &plan.lines {
            let request = NewOrderLine {
                order_id,
                product_id: line.product_id,
                quantity: line.quantity,
            };
            match self.orders.create_order_line(&request).await {
                Ok(()) => run.record(SagaEvent::line_created(line.product_id, line.quantity)),
                Err(e) => {
                    tracing::warn!(%order_id, product_id = %line.product_id, error = %e, "order line failed");
                    metrics::counter!("checkout_order_lines_failed").increment(1);
                    run.record(SagaEvent::line_failed(line.product_id, e.to_string()));
                }
            }
        }

        // 4. Stock, for every planned line; failures are not retried
        tracing::info!(%order_id, step = order_submission::STEP_RECONCILE_STOCK, "saga step started");
        for line in &plan.lines {
            match self.reconciler.reconcile(line.product_id, line.quantity).await {
                Ok(adjustment) => run.record(SagaEvent::stock_reconciled(
                    adjustment.product_id,
                    adjustment.previous,
                    adjustment.new,
                )),
                Err(e) => {
                    tracing::warn!(%order_id, product_id = %line.product_id, error = %e, "stock update failed");
                    metrics::counter!("checkout_stock_updates_failed").increment(1);
                    run.record(SagaEvent::stock_failed(line.product_id, e.to_string()));
                }
            }
        }

        // 5. Payment session
        let reference = external_order_ref(order_date, order_id);
        let request = PaymentRequest {
            external_order_ref: reference.clone(),
            amount: total_amount,
            name: profile.name.trim().to_string(),
            email: profile.email.trim().to_string(),
            phone: profile.phone.trim().to_string(),
            address: profile.address.trim().to_string(),
        };

        tracing::info!(%order_id, step = order_submission::STEP_REQUEST_PAYMENT, "saga step started");
        run.record(SagaEvent::payment_requested(reference, total_amount));

        match self.payment.request_session(&request).await {
            Ok(session) => match session.redirect_url.clone() {
                Some(redirect_url) => {
                    // Cart stays until the customer confirms on the hosted page
                    run.record(SagaEvent::payment_redirected(
                        session.session_id.clone(),
                        redirect_url,
                    ));
                    SagaReport {
                        outcome: SagaOutcome::Success {
                            order_id,
                            next: NextStep::AwaitPayment(session),
                        },
                        run,
                        navigation: None,
                    }
                }
                None => {
                    if let Err(e) = self.cart.clear_cart().await {
                        tracing::warn!(%order_id, error = %e, "failed to clear cart after checkout");
                    }
                    run.record(SagaEvent::saga_completed(false));
                    let navigation =
                        schedule_home(self.navigator.clone(), self.settings.redirect_delay);
                    SagaReport {
                        outcome: SagaOutcome::Success {
                            order_id,
                            next: NextStep::ReturnHome,
                        },
                        run,
                        navigation: Some(navigation),
                    }
                }
            },
            Err(e) => {
                tracing::error!(%order_id, error = %e, "payment session could not be created");
                run.record(SagaEvent::payment_failed(e.to_string()));
                SagaReport {
                    outcome: SagaOutcome::DegradedSuccess {
                        order_id,
                        message: format!(
                            "Order #{order_id} was placed, but payment could not be set up. \
                             Your order is waiting for payment; please contact us to complete it."
                        ),
                    },
                    run,
                    navigation: None,
                }
            }
        }
    }
}
