//! shop-sync core - shared domain types.
//!
//! This crate provides the value types used across all shop-sync components:
//! - `storefront` - Cart synchronization and session gating library
//! - `cli` - Command-line driver for the library
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no async.
//! Everything here can be constructed and validated without a runtime.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, quantities, emails, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
