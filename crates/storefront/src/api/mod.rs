//! Shop REST API collaborator.
//!
//! # Architecture
//!
//! - [`ShopApi`] is the seam between the stores and the remote service.
//!   Everything above it (session, cart, orders) is written against the
//!   trait, so tests substitute an in-memory double.
//! - [`RestClient`] is the production implementation over `reqwest`.
//! - The remote service is the system of record; this layer does no caching
//!   and no retries. Timeouts are configured on the HTTP client.
//!
//! # Endpoints
//!
//! | Method | Path | Use |
//! |--------|------|-----|
//! | GET | `/products/{id}` | catalog lookup |
//! | GET | `/products?...`, `/categories` | catalog browsing and search |
//! | GET | `/cart?userId=` | list bare cart records |
//! | POST | `/cart` | create cart record |
//! | PUT | `/cart/{id}` | update cart record |
//! | DELETE | `/cart/{id}` | delete cart record |
//! | POST/GET | `/orders`, `/orders?userId=` | submit / list orders |
//! | GET/PATCH/DELETE | `/orders/{id}` | order detail / status / delete |
//! | GET/POST | `/users`, `/users/{id}` | login lookup / registration / profile |

mod rest;
pub mod types;

pub use rest::RestClient;
pub use types::{CartRecord, NewCartRecord, NewUserRecord, OrderStatusPatch, UserRecord};

use async_trait::async_trait;
use thiserror::Error;

use shop_sync_core::{CartItemId, OrderId, ProductId, UserId};

use crate::models::{Category, Order, OrderDraft, Product, ProductQuery};

/// Errors that can occur when talking to the shop API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection refused, timeout, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Resource not found (HTTP 404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Failed to parse response or build the request.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ApiError {
    /// Whether the remote store reported the resource as missing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Remote resource collection consumed by the stores.
#[async_trait]
pub trait ShopApi: Send + Sync {
    /// `GET /products/{id}`
    async fn get_product(&self, id: &ProductId) -> Result<Product, ApiError>;

    /// `GET /products[?categoryId=&q=&name_like=&isRecommended=&_limit=]`
    async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, ApiError>;

    /// `GET /categories`
    async fn list_categories(&self) -> Result<Vec<Category>, ApiError>;

    /// `GET /cart?userId=`
    async fn list_cart(&self, user_id: &UserId) -> Result<Vec<CartRecord>, ApiError>;

    /// `POST /cart`
    async fn create_cart_item(&self, item: &NewCartRecord) -> Result<CartRecord, ApiError>;

    /// `PUT /cart/{id}`
    async fn update_cart_item(&self, item: &CartRecord) -> Result<CartRecord, ApiError>;

    /// `DELETE /cart/{id}`
    async fn delete_cart_item(&self, id: &CartItemId) -> Result<(), ApiError>;

    /// `POST /orders`
    async fn create_order(&self, draft: &OrderDraft) -> Result<Order, ApiError>;

    /// `GET /orders?userId=`
    async fn list_orders(&self, user_id: &UserId) -> Result<Vec<Order>, ApiError>;

    /// `GET /orders/{id}`
    async fn get_order(&self, id: &OrderId) -> Result<Order, ApiError>;

    /// `PATCH /orders/{id}`
    async fn patch_order(&self, id: &OrderId, patch: &OrderStatusPatch)
    -> Result<Order, ApiError>;

    /// `DELETE /orders/{id}`
    async fn delete_order(&self, id: &OrderId) -> Result<(), ApiError>;

    /// `GET /users?username=[&password=]`
    async fn find_users(
        &self,
        username: &str,
        password: Option<&str>,
    ) -> Result<Vec<UserRecord>, ApiError>;

    /// `POST /users`
    async fn create_user(&self, user: &NewUserRecord) -> Result<UserRecord, ApiError>;

    /// `GET /users/{id}`
    async fn get_user(&self, id: &UserId) -> Result<UserRecord, ApiError>;
}
