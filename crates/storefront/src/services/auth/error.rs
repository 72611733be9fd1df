//! Authentication error types.

use thiserror::Error;

use super::cache::CacheError;
use crate::api::ApiError;
use crate::error::ErrorKind;

/// Errors that can occur during session operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] shop_sync_core::EmailError),

    /// Unknown username or wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Username already taken.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Registration or profile input rejected.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Operation needs a logged-in user.
    #[error("not logged in")]
    NotAuthenticated,

    /// Remote call failed.
    #[error("shop API error: {0}")]
    Api(#[from] ApiError),

    /// Persisted identity cache could not be read or written.
    #[error("identity cache error: {0}")]
    Cache(#[from] CacheError),
}

impl AuthError {
    /// The closed kind of this error, for failures that map onto one.
    ///
    /// Identity cache failures are local I/O problems and have no kind.
    #[must_use]
    pub const fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::InvalidCredentials | Self::NotAuthenticated => Some(ErrorKind::Unauthorized),
            Self::InvalidEmail(_) | Self::UserAlreadyExists | Self::InvalidInput(_) => {
                Some(ErrorKind::ValidationFailure)
            }
            Self::Api(ApiError::NotFound(_)) => Some(ErrorKind::NotFound),
            Self::Api(_) => Some(ErrorKind::NetworkFailure),
            Self::Cache(_) => None,
        }
    }
}
