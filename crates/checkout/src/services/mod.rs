//! Remote service traits, in-memory implementations and the local seams
//! (cart access, navigation) the checkout saga depends on.

pub mod cart;
pub mod navigation;
pub mod orders;
pub mod payment;
pub mod stock;

pub use cart::CartAccess;
pub use navigation::{Navigator, RecordingNavigator, schedule_home};
pub use orders::{
    InMemoryOrderService, NewOrder, NewOrderLine, OrderLineRecord, OrderRecord, OrderService,
    OrderStatus,
};
pub use payment::{
    InMemoryPaymentService, PaymentBehavior, PaymentRequest, PaymentService, PaymentSession,
};
pub use stock::{InMemoryStockService, StockRecord, StockService};
