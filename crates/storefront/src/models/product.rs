//! Catalog records and listing filters.

use serde::{Deserialize, Serialize};

use shop_sync_core::{CategoryId, Price, ProductId};

/// A product as served by `GET /products/{id}`.
///
/// Read-only from the client's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Units on hand.
    #[serde(default)]
    pub stock: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub is_recommended: bool,
}

/// A product category from `GET /categories`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Filters for `GET /products`. Unset fields are left off the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    /// `categoryId=`
    pub category_id: Option<CategoryId>,
    /// `q=`: full-text match across all fields.
    pub text: Option<String>,
    /// `name_like=`: substring match on the product name.
    pub name_like: Option<String>,
    /// `isRecommended=true`
    pub recommended: bool,
    /// `_limit=`
    pub limit: Option<u32>,
}

impl ProductQuery {
    /// Maximum results for a name search.
    pub const SEARCH_LIMIT: u32 = 10;

    /// Every product in a category.
    #[must_use]
    pub fn in_category(category_id: CategoryId) -> Self {
        Self {
            category_id: Some(category_id),
            ..Self::default()
        }
    }

    /// Products whose name contains `keyword`, capped at [`Self::SEARCH_LIMIT`].
    #[must_use]
    pub fn name_search(keyword: impl Into<String>) -> Self {
        Self {
            name_like: Some(keyword.into()),
            limit: Some(Self::SEARCH_LIMIT),
            ..Self::default()
        }
    }

    /// Products flagged as recommended.
    #[must_use]
    pub fn recommended() -> Self {
        Self {
            recommended: true,
            ..Self::default()
        }
    }

    /// Query string pairs, in a stable order.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(category_id) = &self.category_id {
            pairs.push(("categoryId", category_id.to_string()));
        }
        if let Some(text) = &self.text {
            pairs.push(("q", text.clone()));
        }
        if let Some(name) = &self.name_like {
            pairs.push(("name_like", name.clone()));
        }
        if self.recommended {
            pairs.push(("isRecommended", "true".to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("_limit", limit.to_string()));
        }
        pairs
    }
}
