//! Order submission.
//!
//! Builds order payloads from the cart or from a single product and submits
//! them to the remote order collection. Status transitions are not validated
//! here; the remote store owns that rule.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use shop_sync_core::{OrderId, OrderStatus, UserId};

use crate::api::{OrderStatusPatch, ShopApi};
use crate::error::{Error, Result, add_breadcrumb, remote_failure};
use crate::models::{Order, OrderDraft};
use crate::services::auth::Session;
use crate::services::cart::CartStore;

/// Order operations for the current session.
#[derive(Clone)]
pub struct OrderService {
    session: Arc<Session>,
    api: Arc<dyn ShopApi>,
}

impl OrderService {
    #[must_use]
    pub fn new(session: Arc<Session>, api: Arc<dyn ShopApi>) -> Self {
        Self { session, api }
    }

    fn require_user(&self) -> Result<UserId> {
        self.session.user_id().ok_or_else(Error::login_required)
    }

    /// Submit a new order in `pending` status.
    ///
    /// Whatever status, creation time or user id the caller put on the draft
    /// is replaced: the order always belongs to the session user. The draft
    /// may carry line items or a direct product reference in its extra
    /// fields; neither is required.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` without a session and `NetworkFailure` if the
    /// submission fails.
    #[instrument(skip(self, draft), fields(items = draft.items.len()))]
    pub async fn create_order(&self, mut draft: OrderDraft) -> Result<Order> {
        let user_id = self.require_user()?;

        if draft.user_id.as_ref().is_some_and(|id| *id != user_id) {
            warn!(user_id = %user_id, "Replacing foreign user id on order draft");
        }
        draft.status = Some(OrderStatus::Pending);
        draft.created_at = Some(Utc::now());
        draft.user_id = Some(user_id);

        add_breadcrumb(
            "order",
            "Create order",
            &[("items", draft.items.len().to_string())],
        );

        let order = self
            .api
            .create_order(&draft)
            .await
            .map_err(|e| remote_failure("create_order", e))?;

        info!(order_id = %order.id, "Order created");
        Ok(order)
    }

    /// Submit a direct-purchase draft exactly as given.
    ///
    /// No status or timestamp is stamped and no session is required; the
    /// caller owns the whole payload.
    ///
    /// # Errors
    ///
    /// Returns `NetworkFailure` if the submission fails.
    #[instrument(skip(self, draft), fields(items = draft.items.len()))]
    pub async fn buy_now(&self, draft: OrderDraft) -> Result<Order> {
        add_breadcrumb(
            "order",
            "Buy now",
            &[("items", draft.items.len().to_string())],
        );

        let order = self
            .api
            .create_order(&draft)
            .await
            .map_err(|e| remote_failure("buy_now", e))?;

        info!(order_id = %order.id, "Direct purchase submitted");
        Ok(order)
    }

    /// Set an order's status, stamping `updatedAt`.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` without a session, `NotFound` if the order does
    /// not exist, and `NetworkFailure` otherwise.
    #[instrument(skip(self), fields(order_id = %id, status = %status))]
    pub async fn update_order_status(&self, id: &OrderId, status: OrderStatus) -> Result<Order> {
        self.require_user()?;
        add_breadcrumb(
            "order",
            "Update order status",
            &[("order_id", id.to_string()), ("status", status.to_string())],
        );

        let patch = OrderStatusPatch {
            status,
            updated_at: Utc::now(),
        };

        self.api
            .patch_order(id, &patch)
            .await
            .map_err(|e| remote_failure("update_order_status", e))
    }

    /// Orders placed by the session user.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` without a session and `NetworkFailure` if the
    /// listing fails.
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<Order>> {
        let user_id = self.require_user()?;
        self.api
            .list_orders(&user_id)
            .await
            .map_err(|e| remote_failure("list_orders", e))
    }

    /// # Errors
    ///
    /// Returns `Unauthorized` without a session, `NotFound` if the order does
    /// not exist, and `NetworkFailure` otherwise.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get_order(&self, id: &OrderId) -> Result<Order> {
        self.require_user()?;
        self.api
            .get_order(id)
            .await
            .map_err(|e| remote_failure("get_order", e))
    }

    /// # Errors
    ///
    /// Returns `Unauthorized` without a session, `NotFound` if the order does
    /// not exist, and `NetworkFailure` otherwise.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn delete_order(&self, id: &OrderId) -> Result<()> {
        self.require_user()?;
        add_breadcrumb("order", "Delete order", &[("order_id", id.to_string())]);
        self.api
            .delete_order(id)
            .await
            .map_err(|e| remote_failure("delete_order", e))
    }

    /// Turn the whole cart into a pending order, then clear the cart.
    ///
    /// The order stands even if clearing the cart fails afterwards; the
    /// failure is logged and the cart keeps its lines.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` without a session, `ValidationFailure` for an
    /// empty cart, and the [`Self::create_order`] error if submission fails.
    #[instrument(skip(self, cart))]
    pub async fn checkout(&self, cart: &CartStore) -> Result<Order> {
        let user_id = self.require_user()?;
        let items = cart.items();
        if items.is_empty() {
            return Err(Error::Validation("cart is empty".to_string()));
        }

        let order = self
            .create_order(OrderDraft::from_cart_items(user_id, &items))
            .await?;

        if let Err(e) = cart.clear_cart().await {
            warn!(order_id = %order.id, error = %e, "Order created but cart was not cleared");
        }

        Ok(order)
    }
}

impl std::fmt::Debug for OrderService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderService").finish_non_exhaustive()
    }
}
