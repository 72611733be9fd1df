//! Cart line items.
//!
//! A line item is identified remotely by its `id`, but for merge purposes
//! by its `(product_id, size)` key: adding the same product in the same size
//! twice bumps the quantity of the existing line instead of creating a second
//! remote record.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shop_sync_core::{CartItemId, Price, ProductId, Quantity, UserId};

use crate::api::types::CartRecord;
use crate::models::Product;

/// Display and stock fields copied from the catalog onto a line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetails {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub stock: u32,
}

impl From<&Product> for ProductDetails {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            image: product.image.clone(),
            description: product.description.clone(),
            stock: product.stock,
        }
    }
}

/// One entry of the local cart mirror.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    pub id: CartItemId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    /// Unit price captured when the line was created.
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// `None` when the catalog lookup failed and the line is bare.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ProductDetails>,
}

impl CartLineItem {
    /// Build a line item from a remote record, enriching it with `product`
    /// when the lookup succeeded.
    ///
    /// The record's own price snapshot wins over the current catalog price.
    /// Records that predate price snapshots fall back to the catalog price, or
    /// to zero for a bare line.
    #[must_use]
    pub fn from_record(record: CartRecord, product: Option<&Product>) -> Self {
        let price = record
            .price
            .or_else(|| product.map(|p| p.price))
            .unwrap_or(Price::ZERO);

        Self {
            id: record.id,
            user_id: record.user_id,
            product_id: record.product_id,
            quantity: record.quantity,
            price,
            size: record.size,
            created_at: record.created_at,
            details: product.map(ProductDetails::from),
        }
    }

    /// The remote record this line mirrors, without enrichment fields.
    #[must_use]
    pub fn to_record(&self) -> CartRecord {
        CartRecord {
            id: self.id.clone(),
            user_id: self.user_id.clone(),
            product_id: self.product_id.clone(),
            quantity: self.quantity,
            price: Some(self.price),
            size: self.size.clone(),
            created_at: self.created_at,
        }
    }

    /// Whether this line has the merge key `(product_id, size)`.
    #[must_use]
    pub fn has_key(&self, product_id: &ProductId, size: Option<&str>) -> bool {
        self.product_id == *product_id && self.size.as_deref() == size
    }

    /// Whether catalog details were merged onto this line.
    #[must_use]
    pub const fn is_enriched(&self) -> bool {
        self.details.is_some()
    }

    /// `quantity * price` for this line.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price.times(self.quantity)
    }
}

/// An add-to-cart request.
///
/// Carries no price: the price snapshot always comes from the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddToCart {
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub size: Option<String>,
}

impl AddToCart {
    /// Request `quantity` units of `product_id` with no size variant.
    #[must_use]
    pub const fn new(product_id: ProductId, quantity: Quantity) -> Self {
        Self {
            product_id,
            quantity,
            size: None,
        }
    }

    /// Set the size variant. Blank sizes are treated as "no size".
    #[must_use]
    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        let size = size.into();
        let trimmed = size.trim();
        self.size = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }
}
