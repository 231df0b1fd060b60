//! The cart store: in-memory cart written through to client-local storage.

use std::sync::Arc;

use common::ProductId;
use tokio::sync::RwLock;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::item::{Cart, CartItem, Product};
use crate::profile::CustomerProfile;
use crate::storage::{CART_KEY, SessionId, Storage};

/// Parses a persisted cart entry by entry.
///
/// Entries that cannot be read are dropped and logged; the rest are kept.
/// Data that is not a list at all is treated as an empty cart.
fn parse_cart(raw: &str) -> Cart {
    let entries = match serde_json::from_str::<Vec<serde_json::Value>>(raw) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring malformed persisted cart");
            return Cart::new();
        }
    };

    let items = entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value::<CartItem>(entry) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::warn!(index, error = %e, "dropping unreadable cart entry");
                None
            }
        });
    Cart::from_items(items)
}

async fn load_cart<S: Storage>(storage: &S) -> Cart {
    match storage.get(CART_KEY).await {
        Ok(Some(raw)) => parse_cart(&raw),
        Ok(None) => Cart::new(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to read persisted cart, starting empty");
            Cart::new()
        }
    }
}

/// Owns the cart of one session.
///
/// Every mutation updates the in-memory cart first and then persists it under
/// [`CART_KEY`]. If persisting fails the in-memory cart keeps the change and
/// the error is returned so the caller can tell the user.
pub struct CartStore<S: Storage + Clone + 'static> {
    storage: S,
    session: SessionId,
    cart: Arc<RwLock<Cart>>,
}

impl<S: Storage + Clone + 'static> CartStore<S> {
    /// Opens a new session, rehydrating the cart from storage if present.
    #[tracing::instrument(skip(storage))]
    pub async fn open(storage: S) -> Self {
        let session = SessionId::new();
        let cart = load_cart(&storage).await;
        tracing::debug!(%session, items = cart.len(), "cart rehydrated");
        Self {
            storage,
            session,
            cart: Arc::new(RwLock::new(cart)),
        }
    }

    /// Returns this session's ID.
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Returns the underlying storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Returns a copy of the current cart.
    pub async fn snapshot(&self) -> Cart {
        self.cart.read().await.clone()
    }

    /// Adds `quantity` units of a product, merging with an existing entry.
    pub async fn add(&self, product: Product, quantity: u32) -> Result<()> {
        tracing::debug!(product_id = %product.id, quantity, "adding to cart");
        self.mutate(|cart| {
            cart.add(product, quantity);
            quantity > 0
        })
        .await
    }

    /// Sets the quantity of an entry; `quantity <= 0` removes it.
    pub async fn set_quantity(&self, product_id: ProductId, quantity: i64) -> Result<()> {
        self.mutate(|cart| cart.set_quantity(product_id, quantity))
            .await
    }

    /// Removes an entry if present.
    pub async fn remove(&self, product_id: ProductId) -> Result<()> {
        self.mutate(|cart| cart.remove(product_id)).await
    }

    /// Empties the cart.
    pub async fn clear(&self) -> Result<()> {
        self.mutate(|cart| {
            cart.clear();
            true
        })
        .await
    }

    /// Reloads the cart from storage, replacing the in-memory copy.
    pub async fn refresh(&self) -> Cart {
        let cart = load_cart(&self.storage).await;
        *self.cart.write().await = cart.clone();
        cart
    }

    /// Loads the signed-in customer's profile from the same storage.
    pub async fn customer_profile(&self) -> Option<CustomerProfile> {
        CustomerProfile::load(&self.storage).await
    }

    /// Listens for cart changes written by other sessions.
    ///
    /// Each change replaces this session's cart and then calls `handler` with
    /// the new contents. Changes made by this session are ignored. Abort the
    /// returned handle to stop listening.
    pub fn on_external_change<F>(&self, handler: F) -> JoinHandle<()>
    where
        F: Fn(&Cart) + Send + Sync + 'static,
    {
        let mut rx = self.storage.subscribe();
        let storage = self.storage.clone();
        let cart = Arc::clone(&self.cart);
        let session = self.session;

        tokio::spawn(async move {
            loop {
                let incoming = match rx.recv().await {
                    Ok(event) => {
                        if event.key != CART_KEY || event.origin == session {
                            continue;
                        }
                        event.value.as_deref().map(parse_cart).unwrap_or_default()
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(%session, skipped, "missed cart notifications, reloading");
                        load_cart(&storage).await
                    }
                    Err(RecvError::Closed) => break,
                };

                tracing::debug!(%session, items = incoming.len(), "cart changed in another session");
                *cart.write().await = incoming.clone();
                handler(&incoming);
            }
        })
    }

    async fn mutate<F>(&self, op: F) -> Result<()>
    where
        F: FnOnce(&mut Cart) -> bool,
    {
        // Held across the write so two mutations persist in the order they applied.
        let mut cart = self.cart.write().await;
        if !op(&mut cart) {
            return Ok(());
        }
        let value = serde_json::to_string(&*cart)?;
        self.storage
            .set(self.session, CART_KEY, value)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "failed to persist cart"))
    }
}
