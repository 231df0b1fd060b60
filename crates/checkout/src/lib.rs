//! Order submission saga for the storefront checkout.
//!
//! A checkout turns the customer's cart and shipping form into a remote
//! order in four strictly ordered steps:
//! 1. Create the order header
//! 2. Create one order line per orderable cart item
//! 3. Decrement stock for each of those items
//! 4. Request a payment session
//!
//! The remote service has no transactions. Only a failed header aborts the
//! run; later failures are journaled and the customer still gets an answer
//! about their order.

pub mod aggregate;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod form;
pub mod history;
pub mod http;
pub mod order_submission;
pub mod outcome;
pub mod payment_session;
pub mod reconciler;
pub mod services;
pub mod state;

pub use aggregate::SagaRun;
pub use config::CheckoutConfig;
pub use coordinator::{CheckoutSettings, SagaCoordinator};
pub use error::{CheckoutError, Result};
pub use events::SagaEvent;
pub use form::{Field, FieldErrors, ParsedAddress, ProfileEditor, ShippingProfile, parse_address, validate};
pub use history::OrderHistory;
pub use http::RestClient;
pub use order_submission::{ExclusionReason, LinePlan, PlannedLine, external_order_ref, plan_lines};
pub use outcome::{NextStep, SagaOutcome, SagaReport};
pub use payment_session::{PaymentFlowState, PaymentSessionController};
pub use reconciler::{StockAdjustment, StockReconciler};
pub use services::{
    CartAccess, InMemoryOrderService, InMemoryPaymentService, InMemoryStockService, Navigator,
    NewOrder, NewOrderLine, OrderLineRecord, OrderRecord, OrderService, OrderStatus,
    PaymentBehavior, PaymentRequest, PaymentService, PaymentSession, RecordingNavigator,
    StockRecord, StockService,
};
pub use state::SagaState;
