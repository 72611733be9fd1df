//! Catalog gateway: read-only product lookups.
//!
//! Enrichment looks up one product per cart line on every refresh, so
//! products are cached in memory via `moka` (5-minute TTL by default).
//! Add-to-cart bypasses the cache with [`Catalog::fresh_product`] because
//! the price snapshot must come from the remote catalog.
//!
//! Listings (browse, search, recommended) always go to the remote store and
//! warm the per-product cache with what they return.

use std::sync::Arc;

use moka::future::Cache;
use tracing::{debug, instrument};

use shop_sync_core::{CategoryId, ProductId};

use crate::api::{ApiError, ShopApi};
use crate::config::CatalogConfig;
use crate::models::{Category, Product, ProductQuery};

/// Product accessor with an optional in-memory cache.
#[derive(Clone)]
pub struct Catalog {
    api: Arc<dyn ShopApi>,
    cache: Option<Cache<ProductId, Product>>,
}

impl Catalog {
    /// Create a catalog gateway. A zero TTL disables caching.
    #[must_use]
    pub fn new(api: Arc<dyn ShopApi>, config: CatalogConfig) -> Self {
        let cache = (!config.ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(config.capacity)
                .time_to_live(config.ttl)
                .build()
        });

        Self { api, cache }
    }

    /// Look up a product, serving from cache when possible.
    ///
    /// # Errors
    ///
    /// Returns the API error if the product is not cached and the lookup fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: &ProductId) -> Result<Product, ApiError> {
        if let Some(cache) = &self.cache
            && let Some(product) = cache.get(id).await
        {
            debug!("Cache hit for product");
            return Ok(product);
        }

        self.fresh_product(id).await
    }

    /// Look up a product from the remote catalog and refresh the cache entry.
    ///
    /// # Errors
    ///
    /// Returns the API error if the lookup fails. A `NotFound` also evicts any
    /// stale cache entry.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn fresh_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        match self.api.get_product(id).await {
            Ok(product) => {
                if let Some(cache) = &self.cache {
                    cache.insert(id.clone(), product.clone()).await;
                }
                Ok(product)
            }
            Err(err) => {
                if err.is_not_found() {
                    self.invalidate(id).await;
                }
                Err(err)
            }
        }
    }

    /// Drop a cached product.
    pub async fn invalidate(&self, id: &ProductId) {
        if let Some(cache) = &self.cache {
            cache.invalidate(id).await;
        }
    }

    /// List products matching `query`.
    ///
    /// # Errors
    ///
    /// Returns the API error if the listing fails.
    #[instrument(skip(self))]
    pub async fn products(&self, query: &ProductQuery) -> Result<Vec<Product>, ApiError> {
        let products = self.api.list_products(query).await?;
        if let Some(cache) = &self.cache {
            for product in &products {
                cache.insert(product.id.clone(), product.clone()).await;
            }
        }
        Ok(products)
    }

    /// Products in one category.
    ///
    /// # Errors
    ///
    /// Returns the API error if the listing fails.
    pub async fn products_in(&self, category_id: CategoryId) -> Result<Vec<Product>, ApiError> {
        self.products(&ProductQuery::in_category(category_id)).await
    }

    /// Products whose name contains `keyword`. A blank keyword matches nothing
    /// and makes no remote call.
    ///
    /// # Errors
    ///
    /// Returns the API error if the listing fails.
    pub async fn search(&self, keyword: &str) -> Result<Vec<Product>, ApiError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Ok(Vec::new());
        }
        self.products(&ProductQuery::name_search(keyword)).await
    }

    /// Products flagged as recommended.
    ///
    /// # Errors
    ///
    /// Returns the API error if the listing fails.
    pub async fn recommended(&self) -> Result<Vec<Product>, ApiError> {
        self.products(&ProductQuery::recommended()).await
    }

    /// All product categories.
    ///
    /// # Errors
    ///
    /// Returns the API error if the listing fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        self.api.list_categories().await
    }
}
