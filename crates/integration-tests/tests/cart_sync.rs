//! Cart scenarios end to end through the REST client.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use shop_sync_core::{CartItemId, Price, ProductId, Quantity};
use shop_sync_integration_tests::{TestShop, USER_ID, cart_json};
use shop_sync_storefront::ErrorKind;
use shop_sync_storefront::models::AddToCart;

#[tokio::test]
async fn repeated_add_bumps_one_remote_line() {
    let shop = TestShop::start().await;
    let client = shop.logged_in_client().await;
    shop.mount_product(7, 12.5).await;

    Mock::given(method("POST"))
        .and(path("/cart"))
        .and(body_partial_json(json!({
            "userId": USER_ID, "productId": 7, "quantity": 1, "size": "M", "price": 12.5
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(cart_json(50, 7, 1, 12.5, Some("M"))))
        .expect(1)
        .mount(&shop.server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/cart/50"))
        .and(body_partial_json(json!({ "id": 50, "quantity": 3, "size": "M" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(cart_json(50, 7, 3, 12.5, Some("M"))))
        .expect(1)
        .mount(&shop.server)
        .await;

    let cart = client.cart();
    cart.add_to_cart(AddToCart::new(ProductId::new(7), Quantity::ONE).with_size("M"))
        .await
        .unwrap();
    cart.add_to_cart(AddToCart::new(ProductId::new(7), Quantity::new(2).unwrap()).with_size("M"))
        .await
        .unwrap();

    let items = cart.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].product_id, ProductId::new(7));
    assert_eq!(items[0].size.as_deref(), Some("M"));
    assert_eq!(items[0].quantity.get(), 3);
    assert_eq!(cart.total_count(), 3);
}

#[tokio::test]
async fn refresh_keeps_bare_line_when_one_lookup_fails() {
    let shop = TestShop::start().await;
    let client = shop.logged_in_client().await;
    shop.mount_cart(&[
        cart_json(11, 1, 1, 5.0, None),
        cart_json(12, 2, 2, 6.0, None),
        cart_json(13, 3, 1, 7.0, None),
    ])
    .await;
    shop.mount_product(1, 5.0).await;
    shop.mount_product(3, 7.0).await;
    Mock::given(method("GET"))
        .and(path("/products/2"))
        .respond_with(ResponseTemplate::new(500).set_body_string("catalog down"))
        .mount(&shop.server)
        .await;

    let cart = client.cart();
    cart.fetch_cart_list().await.unwrap();

    let items = cart.items();
    let ids: Vec<CartItemId> = items.iter().map(|i| i.id.clone()).collect();
    assert_eq!(
        ids,
        vec![CartItemId::new(11), CartItemId::new(12), CartItemId::new(13)]
    );
    assert!(items[0].is_enriched());
    assert!(!items[1].is_enriched());
    assert!(items[2].is_enriched());
    assert_eq!(items[0].details.as_ref().unwrap().name, "Product 1");
    // The bare line still counts toward the totals at its snapshot price.
    assert_eq!(cart.total_count(), 4);
    assert_eq!(cart.total_amount(), Price::from_cents(2400).unwrap().amount());
}

#[tokio::test]
async fn failed_clear_keeps_every_local_line() {
    let shop = TestShop::start().await;
    let client = shop.logged_in_client().await;
    shop.mount_cart(&[
        cart_json(21, 1, 1, 5.0, None),
        cart_json(22, 2, 1, 5.0, None),
        cart_json(23, 3, 1, 5.0, None),
    ])
    .await;
    for id in 1..=3 {
        shop.mount_product(id, 5.0).await;
    }
    Mock::given(method("DELETE"))
        .and(path("/cart/21"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&shop.server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/cart/22"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&shop.server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/cart/23"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&shop.server)
        .await;

    let cart = client.cart();
    cart.fetch_cart_list().await.unwrap();
    let err = cart.clear_cart().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NetworkFailure);
    assert_eq!(cart.len(), 3);
}

#[tokio::test]
async fn remove_is_idempotent_over_http() {
    let shop = TestShop::start().await;
    let client = shop.logged_in_client().await;
    shop.mount_cart(&[cart_json(31, 1, 1, 5.0, None)]).await;
    shop.mount_product(1, 5.0).await;
    Mock::given(method("DELETE"))
        .and(path("/cart/31"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&shop.server)
        .await;

    let cart = client.cart();
    cart.fetch_cart_list().await.unwrap();
    cart.remove_item(&CartItemId::new(31)).await.unwrap();
    cart.remove_item(&CartItemId::new(31)).await.unwrap();

    assert!(cart.is_empty());
}

#[tokio::test]
async fn logged_out_client_makes_no_requests() {
    let shop = TestShop::start().await;
    let client = shop.client();
    let cart = client.cart();

    let results = [
        cart.add_to_cart(AddToCart::new(ProductId::new(7), Quantity::ONE))
            .await
            .map(|_| ()),
        cart.update_item_quantity(&CartItemId::new(1), Quantity::ONE)
            .await
            .map(|_| ()),
        cart.remove_item(&CartItemId::new(1)).await,
        cart.clear_cart().await,
    ];

    for result in results {
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Unauthorized);
    }
    assert_eq!(shop.request_count().await, 0);
}

#[tokio::test]
async fn opaque_cart_ids_flow_through_add_and_update() {
    let shop = TestShop::start().await;
    let client = shop.logged_in_client().await;
    shop.mount_product(7, 4.0).await;

    let mut record = cart_json(0, 7, 1, 4.0, None);
    record["id"] = json!("c-1a");
    Mock::given(method("POST"))
        .and(path("/cart"))
        .respond_with(ResponseTemplate::new(201).set_body_json(record.clone()))
        .expect(1)
        .mount(&shop.server)
        .await;
    record["quantity"] = json!(2);
    Mock::given(method("PUT"))
        .and(path("/cart/c-1a"))
        .and(body_partial_json(json!({ "id": "c-1a", "quantity": 2 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(record))
        .expect(1)
        .mount(&shop.server)
        .await;

    let cart = client.cart();
    let line = cart
        .add_to_cart(AddToCart::new(ProductId::new(7), Quantity::ONE))
        .await
        .unwrap();
    assert_eq!(line.id.as_str(), "c-1a");

    cart.update_item_quantity(&line.id, Quantity::new(2).unwrap())
        .await
        .unwrap();
    assert_eq!(cart.items()[0].quantity.get(), 2);
}

#[tokio::test]
async fn remove_deletes_a_line_the_mirror_never_saw() {
    let shop = TestShop::start().await;
    let client = shop.logged_in_client().await;
    Mock::given(method("DELETE"))
        .and(path("/cart/77"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&shop.server)
        .await;

    let cart = client.cart();
    assert!(cart.is_empty());
    cart.remove_item(&CartItemId::new(77)).await.unwrap();

    assert!(cart.is_empty());
}
