//! Access to the cart a checkout run consumes.

use async_trait::async_trait;
use cart::{Cart, CartStore, Storage};

use crate::error::CheckoutError;

/// The cart operations checkout needs: read the items and clear them once
/// the order is complete.
#[async_trait]
pub trait CartAccess: Send + Sync {
    /// Returns a snapshot of the current cart.
    async fn current_cart(&self) -> Cart;

    /// Empties the cart.
    async fn clear_cart(&self) -> Result<(), CheckoutError>;
}

#[async_trait]
impl<S> CartAccess for CartStore<S>
where
    S: Storage + Clone + 'static,
{
    async fn current_cart(&self) -> Cart {
        self.snapshot().await
    }

    async fn clear_cart(&self) -> Result<(), CheckoutError> {
        self.clear().await?;
        Ok(())
    }
}
