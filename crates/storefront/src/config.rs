//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `SHOP_API_URL` - Base URL of the shop REST API (default: `http://localhost:3000`)
//! - `SHOP_API_TIMEOUT_SECS` - HTTP request timeout (default: 10)
//! - `SHOP_SESSION_FILE` - Persisted identity cache (default: `.shop-sync/session.json`)
//! - `SHOP_CATALOG_TTL_SECS` - Product cache TTL, 0 disables caching (default: 300)
//! - `SHOP_CATALOG_CAPACITY` - Maximum cached products (default: 1000)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:3000";
const DEFAULT_SESSION_FILE: &str = ".shop-sync/session.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Top-level client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Shop REST API configuration
    pub api: ApiConfig,
    /// Product cache configuration
    pub catalog: CatalogConfig,
    /// Where the identity cache is persisted
    pub session_file: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Shop REST API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL, e.g. `http://localhost:3000`
    pub base_url: Url,
    /// Per-request timeout enforced by the HTTP client
    pub timeout: Duration,
}

/// Product cache configuration for the catalog gateway.
#[derive(Debug, Clone, Copy)]
pub struct CatalogConfig {
    /// Time-to-live of a cached product; zero disables the cache
    pub ttl: Duration,
    /// Maximum number of cached products
    pub capacity: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            capacity: 1000,
        }
    }
}

impl ApiConfig {
    /// Configuration for the given base URL with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `base_url` is not an absolute
    /// http(s) URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url("SHOP_API_URL", base_url)?,
            timeout: Duration::from_secs(10),
        })
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let base_url = parse_base_url(
            "SHOP_API_URL",
            &get_env_or_default("SHOP_API_URL", DEFAULT_API_URL),
        )?;
        let timeout = Duration::from_secs(get_parsed_env("SHOP_API_TIMEOUT_SECS", 10)?);

        let catalog = CatalogConfig {
            ttl: Duration::from_secs(get_parsed_env("SHOP_CATALOG_TTL_SECS", 300)?),
            capacity: get_parsed_env("SHOP_CATALOG_CAPACITY", 1000)?,
        };

        Ok(Self {
            api: ApiConfig { base_url, timeout },
            catalog,
            session_file: PathBuf::from(get_env_or_default(
                "SHOP_SESSION_FILE",
                DEFAULT_SESSION_FILE,
            )),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Get an environment variable parsed into `T`, or `default` when unset.
fn get_parsed_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Parse and validate the API base URL.
fn parse_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_url_accepts_http() {
        let url = parse_base_url("SHOP_API_URL", "http://localhost:3000").unwrap();
        assert_eq!(url.host_str(), Some("localhost"));
        assert_eq!(url.port(), Some(3000));
    }

    #[test]
    fn test_parse_base_url_rejects_other_schemes() {
        let err = parse_base_url("SHOP_API_URL", "ftp://example.com").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "SHOP_API_URL"));
        assert!(parse_base_url("SHOP_API_URL", "not a url").is_err());
    }

    #[test]
    fn test_get_parsed_env_default_when_unset() {
        let value: u64 = get_parsed_env("SHOP_SYNC_TEST_SURELY_UNSET_VAR", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_catalog_defaults() {
        let catalog = CatalogConfig::default();
        assert_eq!(catalog.ttl, Duration::from_secs(300));
        assert_eq!(catalog.capacity, 1000);
    }
}
