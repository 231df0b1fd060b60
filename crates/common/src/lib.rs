//! Shared identifiers and value types used across the storefront crates.

pub mod money;
pub mod types;

pub use money::Money;
pub use types::{CustomerId, OrderId, ProductId};
