//! Integration test harness for shop-sync.
//!
//! Every scenario runs the real [`RestClient`] against a `wiremock` server
//! standing in for the shop API, with the identity persisted to a temporary
//! directory.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shop-sync-integration-tests
//! ```
//!
//! [`RestClient`]: shop_sync_storefront::api::RestClient

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shop_sync_storefront::config::{ApiConfig, CatalogConfig, StorefrontConfig};
use shop_sync_storefront::models::Credentials;
use shop_sync_storefront::state::AppState;

/// User id every logged-in scenario runs as.
pub const USER_ID: i64 = 1;

/// A mock shop API plus a scratch directory for the identity file.
pub struct TestShop {
    pub server: MockServer,
    dir: TempDir,
}

impl TestShop {
    /// Start a mock server with nothing mounted.
    ///
    /// # Panics
    ///
    /// Panics if the scratch directory cannot be created.
    #[allow(clippy::expect_used)]
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
        }
    }

    #[must_use]
    pub fn session_file(&self) -> PathBuf {
        self.dir.path().join("session.json")
    }

    /// Client configuration pointing at the mock server.
    ///
    /// # Panics
    ///
    /// Panics if the mock server URI is not a valid base URL.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn config(&self) -> StorefrontConfig {
        StorefrontConfig {
            api: ApiConfig::new(&self.server.uri()).expect("mock server URI is valid"),
            catalog: CatalogConfig::default(),
            session_file: self.session_file(),
            sentry_dsn: None,
        }
    }

    /// A fresh client, restoring whatever identity the scratch file holds.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn client(&self) -> AppState {
        AppState::new(self.config()).expect("Failed to build client")
    }

    /// Mount the login lookup for `ana` / `pineapple`.
    pub async fn mount_login(&self) {
        Mock::given(method("GET"))
            .and(path("/users"))
            .and(query_param("username", "ana"))
            .and(query_param("password", "pineapple"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": USER_ID, "username": "ana", "email": "ana@example.com", "password": "pineapple" }
            ])))
            .mount(&self.server)
            .await;
    }

    /// A client logged in as [`USER_ID`].
    ///
    /// # Panics
    ///
    /// Panics if the login fails.
    #[allow(clippy::expect_used)]
    pub async fn logged_in_client(&self) -> AppState {
        self.mount_login().await;
        let client = self.client();
        client
            .session()
            .login(&Credentials::new("ana", "pineapple"))
            .await
            .expect("login against mock server");
        client
    }

    /// Mount `GET /products/{id}`.
    pub async fn mount_product(&self, id: i64, price: f64) {
        Mock::given(method("GET"))
            .and(path(format!("/products/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(product_json(id, price)))
            .mount(&self.server)
            .await;
    }

    /// Mount `GET /cart?userId=` returning `records`.
    pub async fn mount_cart(&self, records: &[Value]) {
        Mock::given(method("GET"))
            .and(path("/cart"))
            .and(query_param("userId", USER_ID.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(Value::from(records.to_vec())))
            .mount(&self.server)
            .await;
    }

    /// Bodies of every request received at `method` `path`, parsed as JSON.
    pub async fn bodies(&self, http_method: &str, request_path: &str) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.method.as_str() == http_method && r.url.path() == request_path)
            .filter_map(|r| serde_json::from_slice(&r.body).ok())
            .collect()
    }

    /// Number of requests the mock server has seen.
    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map_or(0, |requests| requests.len())
    }
}

#[must_use]
pub fn product_json(id: i64, price: f64) -> Value {
    json!({
        "id": id,
        "name": format!("Product {id}"),
        "price": price,
        "image": format!("/img/{id}.png"),
        "description": "Fresh from the grove",
        "stock": 25
    })
}

/// A cart record as stored by the shop API.
#[must_use]
pub fn cart_json(id: i64, product_id: i64, quantity: u32, price: f64, size: Option<&str>) -> Value {
    let mut record = json!({
        "id": id,
        "userId": USER_ID,
        "productId": product_id,
        "quantity": quantity,
        "price": price
    });
    if let (Some(size), Value::Object(fields)) = (size, &mut record) {
        fields.insert("size".to_string(), Value::from(size));
    }
    record
}
