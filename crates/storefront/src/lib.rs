//! shop-sync storefront library.
//!
//! Client-side state for a shop backed by a REST service: a session gate,
//! a local cart mirror kept in sync with the remote cart, and order
//! submission. The remote service is always the system of record.
//!
//! Start from [`state::AppState`], or wire the pieces by hand:
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use shop_sync_storefront::{api::RestClient, catalog::Catalog, config::StorefrontConfig};
//! # use shop_sync_storefront::services::{CartStore, OrderService, Session};
//! # use shop_sync_storefront::services::auth::FileIdentityCache;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StorefrontConfig::from_env()?;
//! let api = Arc::new(RestClient::new(&config.api)?);
//! let session = Arc::new(Session::restore(
//!     api.clone(),
//!     Arc::new(FileIdentityCache::new(&config.session_file)),
//! ));
//! let cart = CartStore::new(session.clone(), api.clone(), Catalog::new(api.clone(), config.catalog));
//! let orders = OrderService::new(session, api);
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod state;

#[cfg(test)]
mod testing;

pub use error::{Error, ErrorKind, Result};
