//! `reqwest` implementation of [`ShopApi`].

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use shop_sync_core::{CartItemId, OrderId, ProductId, UserId};

use super::{
    ApiError, CartRecord, NewCartRecord, NewUserRecord, OrderStatusPatch, ShopApi, UserRecord,
};
use crate::config::ApiConfig;
use crate::models::{Category, Order, OrderDraft, Product, ProductQuery};

/// Client for the shop REST API.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct RestClient {
    inner: Arc<RestClientInner>,
}

struct RestClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl RestClient {
    /// Create a new REST client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(RestClientInner {
                client,
                base_url: config.base_url.clone(),
            }),
        })
    }

    /// Base URL all endpoints are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Append `segments` to the base URL path.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                ApiError::Parse(format!("base URL cannot carry a path: {}", self.inner.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request and reject non-success statuses.
    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(what.to_string()));
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %truncate(&message, 500),
                "Shop API returned non-success status"
            );
            return Err(ApiError::Api {
                status: status.as_u16(),
                message: truncate(&message, 200),
            });
        }

        Ok(response)
    }

    /// Send a request and decode the JSON body.
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<T, ApiError> {
        let response = self.send(request, what).await?;
        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %truncate(&body, 500),
                "Failed to parse shop API response"
            );
            ApiError::Parse(e.to_string())
        })
    }

    /// Send a request whose response body is ignored.
    async fn send_empty(&self, request: RequestBuilder, what: &str) -> Result<(), ApiError> {
        self.send(request, what).await.map(drop)
    }
}

#[async_trait]
impl ShopApi for RestClient {
    #[instrument(skip(self), fields(product_id = %id))]
    async fn get_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let url = self.endpoint(&["products", &id.to_string()])?;
        self.send_json(self.inner.client.get(url), &format!("product {id}"))
            .await
    }

    #[instrument(skip(self))]
    async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, ApiError> {
        let mut url = self.endpoint(&["products"])?;
        let pairs = query.to_pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        let products: Vec<Product> = self
            .send_json(self.inner.client.get(url), "products")
            .await?;
        debug!(count = products.len(), "Fetched products");
        Ok(products)
    }

    #[instrument(skip(self))]
    async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        let url = self.endpoint(&["categories"])?;
        self.send_json(self.inner.client.get(url), "categories")
            .await
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn list_cart(&self, user_id: &UserId) -> Result<Vec<CartRecord>, ApiError> {
        let mut url = self.endpoint(&["cart"])?;
        url.query_pairs_mut()
            .append_pair("userId", &user_id.to_string());
        let records: Vec<CartRecord> = self
            .send_json(self.inner.client.get(url), "cart")
            .await?;
        debug!(count = records.len(), "Fetched cart records");
        Ok(records)
    }

    #[instrument(skip(self, item), fields(product_id = %item.product_id))]
    async fn create_cart_item(&self, item: &NewCartRecord) -> Result<CartRecord, ApiError> {
        let url = self.endpoint(&["cart"])?;
        self.send_json(self.inner.client.post(url).json(item), "cart")
            .await
    }

    #[instrument(skip(self, item), fields(item_id = %item.id))]
    async fn update_cart_item(&self, item: &CartRecord) -> Result<CartRecord, ApiError> {
        let url = self.endpoint(&["cart", &item.id.to_string()])?;
        self.send_json(
            self.inner.client.put(url).json(item),
            &format!("cart item {}", item.id),
        )
        .await
    }

    #[instrument(skip(self), fields(item_id = %id))]
    async fn delete_cart_item(&self, id: &CartItemId) -> Result<(), ApiError> {
        let url = self.endpoint(&["cart", &id.to_string()])?;
        self.send_empty(self.inner.client.delete(url), &format!("cart item {id}"))
            .await
    }

    #[instrument(skip(self, draft))]
    async fn create_order(&self, draft: &OrderDraft) -> Result<Order, ApiError> {
        let url = self.endpoint(&["orders"])?;
        self.send_json(self.inner.client.post(url).json(draft), "orders")
            .await
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn list_orders(&self, user_id: &UserId) -> Result<Vec<Order>, ApiError> {
        let mut url = self.endpoint(&["orders"])?;
        url.query_pairs_mut()
            .append_pair("userId", &user_id.to_string());
        self.send_json(self.inner.client.get(url), "orders").await
    }

    #[instrument(skip(self), fields(order_id = %id))]
    async fn get_order(&self, id: &OrderId) -> Result<Order, ApiError> {
        let url = self.endpoint(&["orders", &id.to_string()])?;
        self.send_json(self.inner.client.get(url), &format!("order {id}"))
            .await
    }

    #[instrument(skip(self, patch), fields(order_id = %id, status = %patch.status))]
    async fn patch_order(
        &self,
        id: &OrderId,
        patch: &OrderStatusPatch,
    ) -> Result<Order, ApiError> {
        let url = self.endpoint(&["orders", &id.to_string()])?;
        self.send_json(
            self.inner.client.patch(url).json(patch),
            &format!("order {id}"),
        )
        .await
    }

    #[instrument(skip(self), fields(order_id = %id))]
    async fn delete_order(&self, id: &OrderId) -> Result<(), ApiError> {
        let url = self.endpoint(&["orders", &id.to_string()])?;
        self.send_empty(self.inner.client.delete(url), &format!("order {id}"))
            .await
    }

    #[instrument(skip(self, password))]
    async fn find_users(
        &self,
        username: &str,
        password: Option<&str>,
    ) -> Result<Vec<UserRecord>, ApiError> {
        let mut url = self.endpoint(&["users"])?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("username", username);
            if let Some(password) = password {
                query.append_pair("password", password);
            }
        }
        self.send_json(self.inner.client.get(url), "users").await
    }

    #[instrument(skip(self, user), fields(username = %user.username))]
    async fn create_user(&self, user: &NewUserRecord) -> Result<UserRecord, ApiError> {
        let url = self.endpoint(&["users"])?;
        self.send_json(self.inner.client.post(url).json(user), "users")
            .await
    }

    #[instrument(skip(self), fields(user_id = %id))]
    async fn get_user(&self, id: &UserId) -> Result<UserRecord, ApiError> {
        let url = self.endpoint(&["users", &id.to_string()])?;
        self.send_json(self.inner.client.get(url), &format!("user {id}"))
            .await
    }
}

/// First `max` characters of `s`.
fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
