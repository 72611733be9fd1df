//! Wire records exchanged with the shop REST API.
//!
//! These mirror the JSON bodies one-to-one (camelCase keys). Unknown fields
//! in responses are ignored, which also keeps the `password` column of
//! `/users` out of anything the client stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shop_sync_core::{CartItemId, OrderStatus, Price, ProductId, Quantity, UserId};

/// A bare cart record, as returned by `GET /cart` and `POST /cart`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartRecord {
    pub id: CartItemId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    /// Older records were created without a price snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of `POST /cart`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCartRecord {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A user row from `/users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Body of `POST /users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUserRecord {
    pub username: String,
    pub password: String,
    pub email: String,
    pub avatar: String,
    pub created_at: DateTime<Utc>,
}

/// Body of `PATCH /orders/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusPatch {
    pub status: OrderStatus,
    pub updated_at: DateTime<Utc>,
}
