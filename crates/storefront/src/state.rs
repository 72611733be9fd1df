//! Client state shared by every command.

use std::sync::Arc;

use crate::api::{ApiError, RestClient, ShopApi};
use crate::catalog::Catalog;
use crate::config::StorefrontConfig;
use crate::services::auth::{FileIdentityCache, IdentityCache, Session};
use crate::services::{CartStore, OrderService};

/// The wired-up client: one session and the stores bound to it.
///
/// Cheaply cloneable via `Arc`; clones share the session and cart mirror.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    session: Arc<Session>,
    catalog: Catalog,
    cart: CartStore,
    orders: OrderService,
}

impl AppState {
    /// Build the client from configuration, restoring the session from the
    /// configured identity file.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, ApiError> {
        let api: Arc<dyn ShopApi> = Arc::new(RestClient::new(&config.api)?);
        let cache: Arc<dyn IdentityCache> =
            Arc::new(FileIdentityCache::new(config.session_file.clone()));
        Ok(Self::with_parts(config, api, cache))
    }

    /// Build the client over an arbitrary API and identity cache.
    #[must_use]
    pub fn with_parts(
        config: StorefrontConfig,
        api: Arc<dyn ShopApi>,
        cache: Arc<dyn IdentityCache>,
    ) -> Self {
        let session = Arc::new(Session::restore(Arc::clone(&api), cache));
        let catalog = Catalog::new(Arc::clone(&api), config.catalog);
        let cart = CartStore::new(Arc::clone(&session), Arc::clone(&api), catalog.clone());
        let orders = OrderService::new(Arc::clone(&session), api);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                session,
                catalog,
                cart,
                orders,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn session(&self) -> &Arc<Session> {
        &self.inner.session
    }

    /// Product lookups, sharing the cart's product cache.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    #[must_use]
    pub fn orders(&self) -> &OrderService {
        &self.inner.orders
    }

    /// Log out and drop the local cart mirror.
    ///
    /// # Errors
    ///
    /// Returns the session error if the identity cache cannot be cleared.
    pub fn logout(&self) -> Result<(), crate::services::AuthError> {
        self.inner.cart.reset_local();
        self.inner.session.logout()
    }
}
