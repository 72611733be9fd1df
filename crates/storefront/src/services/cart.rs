//! Cart store.
//!
//! Owns the local mirror of the current user's cart. The remote store is the
//! system of record: every mutation is confirmed remotely first and only then
//! patched into the mirror, keyed by line item id. A failed call leaves the
//! mirror exactly as it was.
//!
//! # Re-entrancy
//!
//! Operations take `&self` and never hold the list lock across an await. An
//! `add_to_cart` issued while a `fetch_cart_list` is still in flight checks
//! for duplicates against the list as it was before the fetch commits, and
//! may create a second remote line for the same key. Whichever response
//! lands last wins.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use futures::future::join_all;
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

use shop_sync_core::{CartItemId, Quantity, UserId};

use crate::api::{ApiError, NewCartRecord, ShopApi};
use crate::catalog::Catalog;
use crate::error::{Error, Result, add_breadcrumb, remote_failure};
use crate::models::{AddToCart, CartLineItem};
use crate::services::auth::Session;

/// Local cart mirror bound to a session.
///
/// Cheap to clone; clones share the same list.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    session: Arc<Session>,
    api: Arc<dyn ShopApi>,
    catalog: Catalog,
    items: RwLock<Vec<CartLineItem>>,
    loading: AtomicBool,
}

/// Clears the busy flag when a fetch finishes, however it finishes.
struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn start(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl CartStore {
    /// Create an empty cart bound to `session`.
    #[must_use]
    pub fn new(session: Arc<Session>, api: Arc<dyn ShopApi>, catalog: Catalog) -> Self {
        Self {
            inner: Arc::new(CartStoreInner {
                session,
                api,
                catalog,
                items: RwLock::new(Vec::new()),
                loading: AtomicBool::new(false),
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<CartLineItem>> {
        self.inner.items.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<CartLineItem>> {
        self.inner.items.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// The authenticated user, or `Unauthorized` before any remote call.
    fn require_user(&self, operation: &'static str) -> Result<UserId> {
        self.inner.session.user_id().ok_or_else(|| {
            debug!(operation, "Rejected cart operation without a session");
            Error::login_required()
        })
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Snapshot of the line items in server order.
    #[must_use]
    pub fn items(&self) -> Vec<CartLineItem> {
        self.read().clone()
    }

    /// A single line item by id.
    #[must_use]
    pub fn item(&self, id: &CartItemId) -> Option<CartLineItem> {
        self.read().iter().find(|item| item.id == *id).cloned()
    }

    /// Whether a `fetch_cart_list` is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.loading.load(Ordering::Acquire)
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn total_count(&self) -> u64 {
        self.read()
            .iter()
            .map(|item| u64::from(item.quantity.get()))
            .sum()
    }

    /// Sum of `quantity * price` across all lines.
    #[must_use]
    pub fn total_amount(&self) -> Decimal {
        self.read().iter().map(CartLineItem::line_total).sum()
    }

    /// Whether the mirror holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    // =========================================================================
    // Sync
    // =========================================================================

    /// Replace the mirror with the remote cart, enriched from the catalog.
    ///
    /// Product lookups run concurrently. A failed lookup keeps that line bare
    /// instead of failing the refresh; the committed list is always in the
    /// order the remote store returned it.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` without a session, or the remote error if the
    /// cart listing fails (the mirror is left untouched).
    #[instrument(skip(self))]
    pub async fn fetch_cart_list(&self) -> Result<()> {
        let user_id = self.require_user("fetch_cart_list")?;
        let _loading = LoadingGuard::start(&self.inner.loading);

        let records = self
            .inner
            .api
            .list_cart(&user_id)
            .await
            .map_err(|e| remote_failure("fetch_cart_list", e))?;

        let lookups = records
            .iter()
            .map(|record| self.inner.catalog.product(&record.product_id));
        let products = join_all(lookups).await;

        let mut bare = 0usize;
        let items: Vec<CartLineItem> = records
            .into_iter()
            .zip(products)
            .map(|(record, product)| match product {
                Ok(product) => CartLineItem::from_record(record, Some(&product)),
                Err(e) => {
                    warn!(
                        cart_item_id = %record.id,
                        product_id = %record.product_id,
                        error = %e,
                        "Product lookup failed, keeping bare line item"
                    );
                    bare += 1;
                    CartLineItem::from_record(record, None)
                }
            })
            .collect();

        info!(user_id = %user_id, count = items.len(), bare, "Cart refreshed");
        *self.write() = items;
        Ok(())
    }

    /// Drop the local mirror without touching the remote cart.
    pub fn reset_local(&self) {
        self.write().clear();
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add a product to the cart.
    ///
    /// If a line with the same `(product_id, size)` already exists its
    /// quantity is bumped through [`Self::update_item_quantity`] instead of
    /// creating a second remote record. Otherwise the product is fetched from
    /// the catalog for an authoritative price snapshot and a new record is
    /// created.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` without a session, `ValidationFailure` if the
    /// merged quantity overflows, and `NotFound`/`NetworkFailure` if a remote
    /// call fails.
    #[instrument(skip(self, request), fields(product_id = %request.product_id, quantity = %request.quantity))]
    pub async fn add_to_cart(&self, request: AddToCart) -> Result<CartLineItem> {
        let user_id = self.require_user("add_to_cart")?;
        add_breadcrumb(
            "cart",
            "Add to cart",
            &[
                ("product_id", request.product_id.to_string()),
                ("quantity", request.quantity.to_string()),
            ],
        );

        let existing = self
            .read()
            .iter()
            .find(|item| item.has_key(&request.product_id, request.size.as_deref()))
            .map(|item| (item.id.clone(), item.quantity));

        if let Some((id, current)) = existing {
            let quantity = current.checked_add(request.quantity)?;
            debug!(cart_item_id = %id, %quantity, "Merging into existing line item");
            return self.update_item_quantity(&id, quantity).await;
        }

        let product = self
            .inner
            .catalog
            .fresh_product(&request.product_id)
            .await
            .map_err(|e| remote_failure("add_to_cart", e))?;

        let record = self
            .inner
            .api
            .create_cart_item(&NewCartRecord {
                user_id,
                product_id: product.id.clone(),
                quantity: request.quantity,
                price: product.price,
                size: request.size,
                created_at: Utc::now(),
            })
            .await
            .map_err(|e| remote_failure("add_to_cart", e))?;

        let item = CartLineItem::from_record(record, Some(&product));
        self.write().push(item.clone());
        info!(cart_item_id = %item.id, "Added line item");
        Ok(item)
    }

    /// Set the quantity of a line item.
    ///
    /// The full record is sent with the new quantity; on success the local
    /// line is patched with the quantity the remote store confirmed.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` without a session, `NotFound` if the id is not
    /// in the mirror (no remote call is made) or the remote record is gone,
    /// and `NetworkFailure` if the update fails.
    #[instrument(skip(self), fields(cart_item_id = %id, quantity = %quantity))]
    pub async fn update_item_quantity(
        &self,
        id: &CartItemId,
        quantity: Quantity,
    ) -> Result<CartLineItem> {
        self.require_user("update_item_quantity")?;
        let current = self
            .item(id)
            .ok_or_else(|| Error::NotFound(format!("cart item {id}")))?;
        add_breadcrumb(
            "cart",
            "Update quantity",
            &[("cart_item_id", id.to_string()), ("quantity", quantity.to_string())],
        );

        let mut record = current.to_record();
        record.quantity = quantity;

        let confirmed = self
            .inner
            .api
            .update_cart_item(&record)
            .await
            .map_err(|e| remote_failure("update_item_quantity", e))?;

        let mut items = self.write();
        let item = items
            .iter_mut()
            .find(|item| item.id == *id)
            .ok_or_else(|| Error::NotFound(format!("cart item {id}")))?;
        item.quantity = confirmed.quantity;
        Ok(item.clone())
    }

    /// Remove a line item by id.
    ///
    /// The delete is always sent, even for an id the mirror does not hold,
    /// so a stale mirror cannot report a removal that never happened. An id
    /// the remote store no longer has counts as removed.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` without a session and `NetworkFailure` if the
    /// delete fails (the line stays in the mirror).
    #[instrument(skip(self), fields(cart_item_id = %id))]
    pub async fn remove_item(&self, id: &CartItemId) -> Result<()> {
        self.require_user("remove_item")?;
        add_breadcrumb("cart", "Remove item", &[("cart_item_id", id.to_string())]);

        delete_line(self.inner.api.as_ref(), id)
            .await
            .map_err(|e| remote_failure("remove_item", e))?;

        self.write().retain(|item| item.id != *id);
        Ok(())
    }

    /// Delete every line from the remote cart, then empty the mirror.
    ///
    /// Deletes run one at a time. The first failure abandons the sequence and
    /// the mirror keeps every line, including any already deleted remotely;
    /// the next fetch reconciles it.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` without a session and `NetworkFailure` if any
    /// delete fails.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<()> {
        self.require_user("clear_cart")?;
        let ids: Vec<CartItemId> = self.read().iter().map(|item| item.id.clone()).collect();
        add_breadcrumb("cart", "Clear cart", &[("count", ids.len().to_string())]);

        for (deleted, id) in ids.iter().enumerate() {
            if let Err(e) = delete_line(self.inner.api.as_ref(), id).await {
                warn!(
                    cart_item_id = %id,
                    deleted,
                    remaining = ids.len() - deleted,
                    "Clear cart abandoned"
                );
                return Err(remote_failure("clear_cart", e));
            }
        }

        self.write().retain(|item| !ids.contains(&item.id));
        info!(count = ids.len(), "Cart cleared");
        Ok(())
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("items", &self.len())
            .field("loading", &self.is_loading())
            .finish_non_exhaustive()
    }
}

/// `DELETE /cart/{id}`, treating an already-deleted record as success.
async fn delete_line(api: &dyn ShopApi, id: &CartItemId) -> std::result::Result<(), ApiError> {
    match api.delete_cart_item(id).await {
        Err(e) if e.is_not_found() => {
            debug!(cart_item_id = %id, "Remote line item already deleted");
            Ok(())
        }
        other => other,
    }
}
