//! Domain models for the storefront client.
//!
//! These are the shapes the rest of the crate works with. Raw wire records
//! returned by the shop API live in [`crate::api::types`] and are converted
//! into these types at the service boundary.

pub mod cart;
pub mod order;
pub mod product;
pub mod session;

pub use cart::{AddToCart, CartLineItem, ProductDetails};
pub use order::{Order, OrderDraft, OrderLine};
pub use product::{Category, Product, ProductQuery};
pub use session::{Credentials, Identity, ProfileUpdate, Registration, UserInfo};
