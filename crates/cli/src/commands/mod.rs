//! Command implementations.
//!
//! Each command builds on a shared [`AppState`]. The process is short-lived,
//! so commands that depend on the cart mirror fetch it first.
//!
//! [`AppState`]: shop_sync_storefront::state::AppState

pub mod cart;
pub mod order;
pub mod products;
pub mod session;

use std::io::Write;

use serde::Serialize;
use thiserror::Error;

use shop_sync_storefront::api::ApiError;
use shop_sync_storefront::services::AuthError;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// The HTTP client could not be built or a direct lookup failed.
    #[error("{0}")]
    Api(#[from] ApiError),

    /// Login, registration or logout failed.
    #[error("{0}")]
    Auth(#[from] AuthError),

    /// A cart or order operation failed.
    #[error("{0}")]
    Shop(#[from] shop_sync_storefront::Error),

    /// Results could not be written.
    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),

    /// Results could not be serialized.
    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
}

/// Writes command results to stdout, as text or JSON.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    json: bool,
}

impl Output {
    pub const fn new(json: bool) -> Self {
        Self { json }
    }

    /// Print `value` as JSON, or `text()` otherwise.
    pub fn emit<T: Serialize>(
        &self,
        value: &T,
        text: impl FnOnce() -> String,
    ) -> Result<(), CliError> {
        let rendered = if self.json {
            serde_json::to_string_pretty(value)?
        } else {
            text()
        };

        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{rendered}")?;
        Ok(())
    }
}
