//! In-memory `ShopApi` double with call recording and fault injection.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::Display;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use shop_sync_core::{CartItemId, OrderId, Price, ProductId, Quantity, UserId};

use crate::api::{
    ApiError, CartRecord, NewCartRecord, NewUserRecord, OrderStatusPatch, ShopApi, UserRecord,
};
use crate::models::{Category, Order, OrderDraft, Product, ProductQuery, UserInfo};
use crate::services::auth::{MemoryIdentityCache, PersistedIdentity, Session};

/// A recorded remote call.
#[derive(Debug, Clone)]
pub enum Call {
    GetProduct(ProductId),
    ListProducts(ProductQuery),
    ListCategories,
    ListCart(UserId),
    CreateCartItem(NewCartRecord),
    UpdateCartItem(CartRecord),
    DeleteCartItem(CartItemId),
    CreateOrder(Value),
    ListOrders(UserId),
    GetOrder(OrderId),
    PatchOrder(OrderId, OrderStatusPatch),
    DeleteOrder(OrderId),
    FindUsers(String),
    CreateUser(NewUserRecord),
    GetUser(UserId),
}

#[derive(Default)]
struct State {
    products: BTreeMap<ProductId, Product>,
    categories: Vec<Category>,
    cart: Vec<CartRecord>,
    orders: Vec<Order>,
    users: Vec<(UserRecord, String)>,
    next_id: i64,
    opaque_ids: bool,
    failing_products: HashSet<ProductId>,
    failing_deletes: HashSet<CartItemId>,
    product_delays: HashMap<ProductId, Duration>,
    offline: bool,
    fail_writes: bool,
    calls: Vec<Call>,
}

impl State {
    /// Next remote-assigned id: `101`, `102`, ... or `rec-101`, ... when
    /// opaque ids are on.
    fn next_id(&mut self) -> String {
        self.next_id += 1;
        let n = 100 + self.next_id;
        if self.opaque_ids {
            format!("rec-{n}")
        } else {
            n.to_string()
        }
    }

    /// Record `call` and fail if the shop is offline.
    fn enter(&mut self, call: Call) -> Result<(), ApiError> {
        self.calls.push(call);
        if self.offline {
            return Err(unavailable());
        }
        Ok(())
    }

    fn check_writes(&self) -> Result<(), ApiError> {
        if self.fail_writes {
            return Err(unavailable());
        }
        Ok(())
    }
}

fn unavailable() -> ApiError {
    ApiError::Api {
        status: 503,
        message: "service unavailable".to_string(),
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn matches_query(product: &Product, query: &ProductQuery) -> bool {
    query
        .category_id
        .as_ref()
        .is_none_or(|c| product.category_id.as_ref() == Some(c))
        && query.text.as_deref().is_none_or(|q| {
            contains_ignore_case(&product.name, q)
                || product
                    .description
                    .as_deref()
                    .is_some_and(|d| contains_ignore_case(d, q))
        })
        && query
            .name_like
            .as_deref()
            .is_none_or(|n| contains_ignore_case(&product.name, n))
        && (!query.recommended || product.is_recommended)
}

#[derive(Default)]
pub struct MemoryShop {
    state: Mutex<State>,
}

impl MemoryShop {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn with_product(self, product: Product) -> Self {
        self.state().products.insert(product.id.clone(), product);
        self
    }

    pub fn with_category(self, category: Category) -> Self {
        self.state().categories.push(category);
        self
    }

    /// Assign non-numeric ids (`rec-101`) to new records.
    pub fn with_opaque_ids(self) -> Self {
        self.state().opaque_ids = true;
        self
    }

    pub fn add_user(&self, username: &str, password: &str) -> UserRecord {
        let mut state = self.state();
        let record = UserRecord {
            id: UserId::new(state.next_id()),
            username: username.to_string(),
            email: Some(format!("{username}@example.com")),
            avatar: None,
        };
        state.users.push((record.clone(), password.to_string()));
        record
    }

    pub fn set_user_email(&self, id: &UserId, email: &str) {
        let mut state = self.state();
        if let Some((user, _)) = state.users.iter_mut().find(|(u, _)| u.id == *id) {
            user.email = Some(email.to_string());
        }
    }

    pub fn seed_cart(&self, record: CartRecord) {
        self.state().cart.push(record);
    }

    /// Delete a cart record behind the client's back.
    pub fn drop_cart_record(&self, id: &CartItemId) {
        self.state().cart.retain(|r| r.id != *id);
    }

    pub fn fail_product(&self, id: &ProductId) {
        self.state().failing_products.insert(id.clone());
    }

    pub fn heal_product(&self, id: &ProductId) {
        self.state().failing_products.remove(id);
    }

    pub fn delay_product(&self, id: &ProductId, delay: Duration) {
        self.state().product_delays.insert(id.clone(), delay);
    }

    pub fn fail_delete(&self, id: &CartItemId) {
        self.state().failing_deletes.insert(id.clone());
    }

    pub fn set_offline(&self, offline: bool) {
        self.state().offline = offline;
    }

    /// Make every create/update/delete fail while reads keep working.
    pub fn fail_writes(&self, fail: bool) {
        self.state().fail_writes = fail;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.state().calls.iter().filter(|c| predicate(c)).count()
    }

    pub fn cart_records(&self) -> Vec<CartRecord> {
        self.state().cart.clone()
    }

    /// JSON bodies of every `POST /orders`, in order.
    pub fn submitted_orders(&self) -> Vec<Value> {
        self.state()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::CreateOrder(body) => Some(body.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl ShopApi for MemoryShop {
    async fn get_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let delay = {
            let mut state = self.state();
            state.enter(Call::GetProduct(id.clone()))?;
            state.product_delays.get(id).copied()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.state();
        if state.failing_products.contains(id) {
            return Err(ApiError::Api {
                status: 500,
                message: "catalog exploded".to_string(),
            });
        }
        state
            .products
            .get(id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("product {id}")))
    }

    async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, ApiError> {
        let mut state = self.state();
        state.enter(Call::ListProducts(query.clone()))?;
        let limit = query.limit.map_or(usize::MAX, |l| l as usize);
        Ok(state
            .products
            .values()
            .filter(|p| matches_query(p, query))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        let mut state = self.state();
        state.enter(Call::ListCategories)?;
        Ok(state.categories.clone())
    }

    async fn list_cart(&self, user_id: &UserId) -> Result<Vec<CartRecord>, ApiError> {
        let mut state = self.state();
        state.enter(Call::ListCart(user_id.clone()))?;
        Ok(state
            .cart
            .iter()
            .filter(|r| r.user_id == *user_id)
            .cloned()
            .collect())
    }

    async fn create_cart_item(&self, item: &NewCartRecord) -> Result<CartRecord, ApiError> {
        let mut state = self.state();
        state.enter(Call::CreateCartItem(item.clone()))?;
        state.check_writes()?;
        let record = CartRecord {
            id: CartItemId::new(state.next_id()),
            user_id: item.user_id.clone(),
            product_id: item.product_id.clone(),
            quantity: item.quantity,
            price: Some(item.price),
            size: item.size.clone(),
            created_at: Some(item.created_at),
        };
        state.cart.push(record.clone());
        Ok(record)
    }

    async fn update_cart_item(&self, item: &CartRecord) -> Result<CartRecord, ApiError> {
        let mut state = self.state();
        state.enter(Call::UpdateCartItem(item.clone()))?;
        state.check_writes()?;
        let stored = state
            .cart
            .iter_mut()
            .find(|r| r.id == item.id)
            .ok_or_else(|| ApiError::NotFound(format!("cart item {}", item.id)))?;
        *stored = item.clone();
        Ok(stored.clone())
    }

    async fn delete_cart_item(&self, id: &CartItemId) -> Result<(), ApiError> {
        let mut state = self.state();
        state.enter(Call::DeleteCartItem(id.clone()))?;
        state.check_writes()?;
        if state.failing_deletes.contains(id) {
            return Err(unavailable());
        }
        let before = state.cart.len();
        state.cart.retain(|r| r.id != *id);
        if state.cart.len() == before {
            return Err(ApiError::NotFound(format!("cart item {id}")));
        }
        Ok(())
    }

    async fn create_order(&self, draft: &OrderDraft) -> Result<Order, ApiError> {
        let body = serde_json::to_value(draft).map_err(|e| ApiError::Parse(e.to_string()))?;
        let mut state = self.state();
        state.enter(Call::CreateOrder(body.clone()))?;
        state.check_writes()?;

        let mut stored = body;
        if let Value::Object(fields) = &mut stored {
            fields.insert("id".to_string(), Value::String(state.next_id()));
        }
        let order: Order =
            serde_json::from_value(stored).map_err(|e| ApiError::Parse(e.to_string()))?;
        state.orders.push(order.clone());
        Ok(order)
    }

    async fn list_orders(&self, user_id: &UserId) -> Result<Vec<Order>, ApiError> {
        let mut state = self.state();
        state.enter(Call::ListOrders(user_id.clone()))?;
        Ok(state
            .orders
            .iter()
            .filter(|o| o.user_id.as_ref() == Some(user_id))
            .cloned()
            .collect())
    }

    async fn get_order(&self, id: &OrderId) -> Result<Order, ApiError> {
        let mut state = self.state();
        state.enter(Call::GetOrder(id.clone()))?;
        state
            .orders
            .iter()
            .find(|o| o.id == *id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("order {id}")))
    }

    async fn patch_order(
        &self,
        id: &OrderId,
        patch: &OrderStatusPatch,
    ) -> Result<Order, ApiError> {
        let mut state = self.state();
        state.enter(Call::PatchOrder(id.clone(), patch.clone()))?;
        state.check_writes()?;
        let order = state
            .orders
            .iter_mut()
            .find(|o| o.id == *id)
            .ok_or_else(|| ApiError::NotFound(format!("order {id}")))?;
        order.status = patch.status.clone();
        order.updated_at = Some(patch.updated_at);
        Ok(order.clone())
    }

    async fn delete_order(&self, id: &OrderId) -> Result<(), ApiError> {
        let mut state = self.state();
        state.enter(Call::DeleteOrder(id.clone()))?;
        state.check_writes()?;
        let before = state.orders.len();
        state.orders.retain(|o| o.id != *id);
        if state.orders.len() == before {
            return Err(ApiError::NotFound(format!("order {id}")));
        }
        Ok(())
    }

    async fn find_users(
        &self,
        username: &str,
        password: Option<&str>,
    ) -> Result<Vec<UserRecord>, ApiError> {
        let mut state = self.state();
        state.enter(Call::FindUsers(username.to_string()))?;
        Ok(state
            .users
            .iter()
            .filter(|(u, pw)| u.username == username && password.is_none_or(|p| p == pw))
            .map(|(u, _)| u.clone())
            .collect())
    }

    async fn create_user(&self, user: &NewUserRecord) -> Result<UserRecord, ApiError> {
        let mut state = self.state();
        state.enter(Call::CreateUser(user.clone()))?;
        state.check_writes()?;
        let record = UserRecord {
            id: UserId::new(state.next_id()),
            username: user.username.clone(),
            email: Some(user.email.clone()),
            avatar: Some(user.avatar.clone()),
        };
        state.users.push((record.clone(), user.password.clone()));
        Ok(record)
    }

    async fn get_user(&self, id: &UserId) -> Result<UserRecord, ApiError> {
        let mut state = self.state();
        state.enter(Call::GetUser(id.clone()))?;
        state
            .users
            .iter()
            .find(|(u, _)| u.id == *id)
            .map(|(u, _)| u.clone())
            .ok_or_else(|| ApiError::NotFound(format!("user {id}")))
    }
}

/// A catalog product priced at `cents`.
#[allow(clippy::unwrap_used)]
pub fn product(id: impl Display, cents: i64) -> Product {
    Product {
        id: ProductId::new(&id),
        name: format!("Product {id}"),
        price: Price::from_cents(cents).unwrap(),
        image: Some(format!("/img/{id}.png")),
        description: None,
        stock: 10,
        category_id: None,
        is_recommended: false,
    }
}

/// A bare cart record without a price snapshot.
#[allow(clippy::unwrap_used)]
pub fn cart_record(
    id: impl Display,
    user_id: UserId,
    product_id: impl Display,
    quantity: i64,
) -> CartRecord {
    CartRecord {
        id: CartItemId::new(id),
        user_id,
        product_id: ProductId::new(product_id),
        quantity: Quantity::new(quantity).unwrap(),
        price: None,
        size: None,
        created_at: None,
    }
}

/// A session already holding an identity for user 1. Makes no remote calls.
pub fn logged_in(shop: &Arc<MemoryShop>) -> Arc<Session> {
    let cache = MemoryIdentityCache::with(PersistedIdentity {
        token: Some("test-token".to_string()),
        user_info: Some(UserInfo {
            id: UserId::new(1),
            username: "ana".to_string(),
            email: "ana@example.com".to_string(),
            avatar: None,
        }),
    });
    Arc::new(Session::restore(shop.clone(), Arc::new(cache)))
}

pub fn logged_out(shop: &Arc<MemoryShop>) -> Arc<Session> {
    Arc::new(Session::new(
        shop.clone(),
        Arc::new(MemoryIdentityCache::new()),
    ))
}
