//! Shopping cart state for the storefront checkout.
//!
//! The cart lives in memory and is written through to a client-local
//! key-value [`Storage`] on every mutation. Several sessions of the same
//! client may share one storage; each [`CartStore`] listens for changes
//! written by the others and replaces its own copy (last writer wins).

pub mod error;
pub mod item;
pub mod profile;
pub mod storage;
pub mod store;

pub use error::{CartError, Result};
pub use item::{Cart, CartItem, Product};
pub use profile::CustomerProfile;
pub use storage::{
    CART_KEY, CUSTOMER_KEY, FileStorage, InMemoryStorage, SessionId, Storage, StorageEvent,
};
pub use store::CartStore;
