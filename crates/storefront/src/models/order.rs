//! Order drafts and submitted orders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use shop_sync_core::{OrderId, OrderStatus, Price, ProductId, Quantity, UserId};

use crate::models::{CartLineItem, Product};

/// One product line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub price: Price,
    pub quantity: Quantity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl From<&CartLineItem> for OrderLine {
    fn from(item: &CartLineItem) -> Self {
        let details = item.details.as_ref();
        Self {
            product_id: item.product_id.clone(),
            name: details.map(|d| d.name.clone()),
            price: item.price,
            quantity: item.quantity,
            size: item.size.clone(),
            image: details.and_then(|d| d.image.clone()),
        }
    }
}

/// An order payload before the remote store assigns it an id.
///
/// Fields the client does not model (shipping address, payment method, ...)
/// ride along in `extra` and are submitted untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub items: Vec<OrderLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OrderDraft {
    /// Draft an order for everything in `items`, totalled from the line
    /// price snapshots.
    #[must_use]
    pub fn from_cart_items(user_id: UserId, items: &[CartLineItem]) -> Self {
        let lines: Vec<OrderLine> = items.iter().map(OrderLine::from).collect();
        Self {
            user_id: Some(user_id),
            total_amount: Some(total_of(&lines)),
            items: lines,
            ..Self::default()
        }
    }

    /// Draft a direct purchase of a single product at its catalog price.
    #[must_use]
    pub fn single(
        user_id: Option<UserId>,
        product: &Product,
        quantity: Quantity,
        size: Option<String>,
    ) -> Self {
        let line = OrderLine {
            product_id: product.id.clone(),
            name: Some(product.name.clone()),
            price: product.price,
            quantity,
            size,
            image: product.image.clone(),
        };
        Self {
            user_id,
            total_amount: Some(total_of(std::slice::from_ref(&line))),
            items: vec![line],
            ..Self::default()
        }
    }

    /// Attach an extra field to the payload.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Sum of `quantity * price` over `lines`.
fn total_of(lines: &[OrderLine]) -> Price {
    // Each term is non-negative, so the sum is too.
    Price::new(lines.iter().map(|l| l.price.times(l.quantity)).sum()).unwrap_or(Price::ZERO)
}

/// An order as stored by the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub items: Vec<OrderLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<Price>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_single_draft_totals_quantity() {
        let product = Product {
            id: ProductId::new(3),
            name: "Mug".to_string(),
            price: Price::from_cents(1250).unwrap(),
            image: None,
            description: None,
            stock: 10,
            category_id: None,
            is_recommended: false,
        };
        let draft = OrderDraft::single(None, &product, Quantity::new(2).unwrap(), None);
        assert_eq!(draft.total_amount, Some(Price::from_cents(2500).unwrap()));
        assert_eq!(draft.items.len(), 1);
        assert_eq!(draft.status, None);
    }

    #[test]
    fn test_draft_extra_fields_are_flattened() {
        let draft = OrderDraft::default()
            .with_field("address", "1 Pineapple Way")
            .with_field("paymentMethod", "card");
        let value = serde_json::to_value(&draft).unwrap();
        assert_eq!(value["address"], json!("1 Pineapple Way"));
        assert_eq!(value["paymentMethod"], json!("card"));
        assert!(value.get("status").is_none());
    }

    #[test]
    fn test_order_keeps_unknown_fields() {
        let order: Order = serde_json::from_value(json!({
            "id": "12",
            "userId": 1,
            "status": "paid",
            "items": [],
            "address": "somewhere"
        }))
        .unwrap();
        assert_eq!(order.id, OrderId::new(12));
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.extra["address"], json!("somewhere"));
    }

    #[test]
    fn test_order_with_unlisted_status_parses() {
        let orders: Vec<Order> = serde_json::from_value(json!([
            {"id": 3, "userId": 1, "status": "refunded", "items": []},
            {"id": "b7", "userId": 1, "status": "pending", "items": []}
        ]))
        .unwrap();
        assert_eq!(orders[0].status, OrderStatus::Other("refunded".to_string()));
        assert_eq!(orders[1].id.as_str(), "b7");
    }
}
