//! Unified error handling with Sentry integration.
//!
//! Every public cart and order operation returns `Result<T, Error>`. Remote
//! failures are logged and captured at the operation boundary and converted
//! into one of four [`ErrorKind`]s, so callers can branch on the cause without
//! matching transport details.

use thiserror::Error;

use shop_sync_core::{PriceError, QuantityError};

use crate::api::ApiError;

/// Closed classification of failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No usable identity.
    Unauthorized,
    /// The remote store could not be reached or rejected the request.
    NetworkFailure,
    /// The referenced record does not exist.
    NotFound,
    /// The request was malformed before any remote call.
    ValidationFailure,
}

/// Error type for cart and order operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Attempted a gated action without a valid identity.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Remote call failed.
    #[error("Network failure: {0}")]
    Network(#[source] ApiError),

    /// Record not found locally or remotely.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Input rejected before reaching the remote store.
    #[error("Validation failed: {0}")]
    Validation(String),
}

impl Error {
    /// The closed kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::Network(_) => ErrorKind::NetworkFailure,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::ValidationFailure,
        }
    }

    /// Shorthand for the error returned by gated operations.
    pub(crate) fn login_required() -> Self {
        Self::Unauthorized("login required".to_string())
    }
}

impl From<ApiError> for Error {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::NotFound(what) => Self::NotFound(what),
            other => Self::Network(other),
        }
    }
}

impl From<QuantityError> for Error {
    fn from(err: QuantityError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<PriceError> for Error {
    fn from(err: PriceError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Result type alias for [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Log a failed remote call at the operation boundary and convert it.
///
/// Transport failures are also captured to Sentry; a 404 is an expected
/// outcome and is only logged.
pub(crate) fn remote_failure(operation: &'static str, err: ApiError) -> Error {
    if err.is_not_found() {
        tracing::warn!(operation, error = %err, "Remote record not found");
    } else {
        let event_id = sentry::capture_error(&err);
        tracing::error!(
            operation,
            error = %err,
            sentry_event_id = %event_id,
            "Remote call failed"
        );
    }
    Error::from(err)
}

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, username: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: Some(username.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for a cart or order action.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, String)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb
            .data
            .insert((*key).to_string(), serde_json::Value::String(value.clone()));
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::NotFound("cart item 3".to_string());
        assert_eq!(err.to_string(), "Not found: cart item 3");
        assert_eq!(Error::login_required().to_string(), "Unauthorized: login required");
    }

    #[test]
    fn test_api_error_kinds() {
        let not_found = Error::from(ApiError::NotFound("product 1".to_string()));
        assert_eq!(not_found.kind(), ErrorKind::NotFound);

        let server = Error::from(ApiError::Api {
            status: 500,
            message: "boom".to_string(),
        });
        assert_eq!(server.kind(), ErrorKind::NetworkFailure);
    }

    #[test]
    fn test_validation_kinds() {
        let err = Error::from(QuantityError::NotPositive(0));
        assert_eq!(err.kind(), ErrorKind::ValidationFailure);
        assert!(err.to_string().contains("at least 1"));
    }
}
