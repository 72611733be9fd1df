//! Stateful services layered over the shop API.
//!
//! # Services
//!
//! - `auth` - Session store: login, registration, persisted identity
//! - `cart` - Cart store: local mirror of the remote cart
//! - `orders` - Order submission and queries
//!
//! The [`auth::Session`] is created first and handed to the other services
//! as `Arc<Session>`; they consult it on every gated call.

pub mod auth;
pub mod cart;
pub mod orders;

pub use auth::{AuthError, Session};
pub use cart::CartStore;
pub use orders::OrderService;
