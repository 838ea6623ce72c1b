//! The cart manager: stock-checked cart edits with local persistence.
//!
//! # Lifecycle
//!
//! A [`CartManager`] is created once per session with [`CartManager::load`],
//! which hydrates the cart from the key-value store. Clones share the same
//! cart, so the handle can be passed to every part of the application that
//! renders or edits it.
//!
//! # Operations
//!
//! - [`CartManager::add`] - add one unit of a product
//! - [`CartManager::remove`] - drop a product from the cart
//! - [`CartManager::update_amount`] - set a product's quantity
//!
//! Operations never return errors. A failed operation leaves the cart as it
//! was and sends a [`Notice`] to the notifier instead; callers re-render from
//! [`CartManager::cart`] or a [`CartManager::subscribe`] receiver.
//!
//! # Concurrency
//!
//! Each operation works on the snapshot taken when it started and swaps in
//! its result when it finishes. Two overlapping operations can therefore
//! overwrite each other; the last one to finish wins, both in memory and in
//! the store.

use std::sync::Arc;

use rocketshoes_core::{Cart, CartEntry, ProductId};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::api::{ProductCatalog, StockLookup};
use crate::error::{CartError, CartOperation, Notice, ServiceError};
use crate::notify::Notifier;
use crate::storage::KeyValueStore;

/// Request to set a product's quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateAmount {
    pub product_id: ProductId,
    /// The new absolute quantity, not a delta.
    pub amount: i64,
}

/// Shared handle to the shopping cart.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct CartManager {
    inner: Arc<CartManagerInner>,
}

struct CartManagerInner {
    stock: Arc<dyn StockLookup>,
    catalog: Arc<dyn ProductCatalog>,
    store: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn Notifier>,
    storage_key: String,
    state: watch::Sender<Cart>,
}

impl CartManager {
    /// Create a manager, hydrating the cart from `store`.
    ///
    /// A missing value yields an empty cart. So does a value that cannot be
    /// read or parsed; that case is logged and the bad value is left in place
    /// until the next successful edit overwrites it.
    pub fn load(
        stock: Arc<dyn StockLookup>,
        catalog: Arc<dyn ProductCatalog>,
        store: Arc<dyn KeyValueStore>,
        notifier: Arc<dyn Notifier>,
        storage_key: impl Into<String>,
    ) -> Self {
        let storage_key = storage_key.into();
        let cart = hydrate(store.as_ref(), &storage_key);
        let (state, _) = watch::channel(cart);

        Self {
            inner: Arc::new(CartManagerInner {
                stock,
                catalog,
                store,
                notifier,
                storage_key,
                state,
            }),
        }
    }

    /// Current cart snapshot.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.inner.state.borrow().clone()
    }

    /// Receiver that observes every committed cart.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.inner.state.subscribe()
    }

    /// Key the cart is persisted under.
    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.inner.storage_key
    }

    /// Add one unit of a product.
    ///
    /// New products are appended with an amount of 1 when they are in stock.
    /// Products already in the cart go through [`CartManager::update_amount`]
    /// with their amount plus one, so its checks and notices apply.
    #[instrument(skip_all, fields(product_id = %product_id))]
    pub async fn add(&self, product_id: ProductId) {
        if let Err(error) = self.try_add(product_id).await {
            self.report(error);
        }
    }

    /// Remove a product from the cart.
    #[instrument(skip_all, fields(product_id = %product_id))]
    pub fn remove(&self, product_id: ProductId) {
        if let Err(error) = self.try_remove(product_id) {
            self.report(error);
        }
    }

    /// Set a product's quantity.
    ///
    /// Quantities below 1 and above the available stock are rejected. An ID
    /// that is not in the cart is not an error: the cart is written back
    /// unchanged.
    #[instrument(skip_all, fields(product_id = %request.product_id, amount = request.amount))]
    pub async fn update_amount(&self, request: UpdateAmount) {
        let snapshot = self.cart();
        if let Err(error) = self.try_update_amount(&snapshot, request).await {
            self.report(error);
        }
    }

    async fn try_add(&self, product_id: ProductId) -> Result<(), CartError> {
        let snapshot = self.cart();

        let stock = self
            .inner
            .stock
            .stock(product_id)
            .await
            .map_err(|e| CartError::unexpected(CartOperation::Add, product_id, e))?;

        if let Some(entry) = snapshot.get(product_id) {
            let request = UpdateAmount {
                product_id,
                amount: i64::from(entry.amount) + 1,
            };
            return self.try_update_amount(&snapshot, request).await;
        }

        if stock.amount == 0 {
            return Err(CartError::OutOfStock(product_id));
        }

        let product = self
            .inner
            .catalog
            .product(product_id)
            .await
            .map_err(|e| CartError::unexpected(CartOperation::Add, product_id, e))?;

        let updated = snapshot.with_entry(CartEntry::new(product));
        self.commit(updated)
            .map_err(|e| CartError::unexpected(CartOperation::Add, product_id, e))?;

        info!("Product added to cart");
        Ok(())
    }

    fn try_remove(&self, product_id: ProductId) -> Result<(), CartError> {
        let snapshot = self.cart();

        if !snapshot.contains(product_id) {
            return Err(CartError::ProductNotInCart(product_id));
        }

        self.commit(snapshot.without(product_id))
            .map_err(|e| CartError::unexpected(CartOperation::Remove, product_id, e))?;

        info!("Product removed from cart");
        Ok(())
    }

    async fn try_update_amount(
        &self,
        snapshot: &Cart,
        request: UpdateAmount,
    ) -> Result<(), CartError> {
        let UpdateAmount { product_id, amount } = request;

        if amount < 1 {
            return Err(CartError::InvalidQuantity { product_id, amount });
        }

        let stock = self
            .inner
            .stock
            .stock(product_id)
            .await
            .map_err(|e| CartError::unexpected(CartOperation::UpdateAmount, product_id, e))?;

        let insufficient = || CartError::InsufficientStock {
            product_id,
            requested: amount,
            available: stock.amount,
        };

        if amount > i64::from(stock.amount) {
            return Err(insufficient());
        }
        let amount = u32::try_from(amount).map_err(|_| insufficient())?;

        if !snapshot.contains(product_id) {
            debug!("Product not in cart, writing cart back unchanged");
        }

        self.commit(snapshot.with_amount(product_id, amount))
            .map_err(|e| CartError::unexpected(CartOperation::UpdateAmount, product_id, e))?;

        info!("Cart amount updated");
        Ok(())
    }

    /// Persist `cart`, then publish it.
    ///
    /// Nothing is published when the write fails, so memory never runs ahead
    /// of the store.
    fn commit(&self, cart: Cart) -> Result<(), ServiceError> {
        let serialized = serde_json::to_string(&cart)?;
        self.inner.store.set(&self.inner.storage_key, &serialized)?;
        self.inner.state.send_replace(cart);
        Ok(())
    }

    fn report(&self, error: CartError) {
        if error.is_unexpected() {
            let event_id = sentry::capture_error(&error);
            tracing::error!(
                error = %error,
                sentry_event_id = %event_id,
                "Cart operation failed"
            );
        } else {
            info!(error = %error, "Cart operation rejected");
        }

        self.inner.notifier.notify(Notice::new(error));
    }
}

/// Read the persisted cart, falling back to an empty one.
fn hydrate(store: &dyn KeyValueStore, key: &str) -> Cart {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Cart::empty(),
        Err(e) => {
            warn!(error = %e, key, "Failed to read stored cart, starting empty");
            return Cart::empty();
        }
    };

    match serde_json::from_str::<Cart>(&raw) {
        Ok(cart) => sanitize(cart),
        Err(e) => {
            warn!(error = %e, key, "Stored cart is corrupt, starting empty");
            Cart::empty()
        }
    }
}

/// Drop stored entries that break the cart invariants.
///
/// Keeps the first entry per product and skips zero amounts. Carts written
/// by this manager never contain either; this only guards hand-edited or
/// foreign data.
fn sanitize(cart: Cart) -> Cart {
    let mut kept: Vec<CartEntry> = Vec::with_capacity(cart.len());

    for entry in cart.entries() {
        if entry.amount == 0 {
            warn!(product_id = %entry.product_id(), "Dropping stored entry with zero amount");
        } else if kept.iter().any(|k| k.product_id() == entry.product_id()) {
            warn!(product_id = %entry.product_id(), "Dropping duplicate stored entry");
        } else {
            kept.push(entry.clone());
        }
    }

    Cart::from(kept)
}
