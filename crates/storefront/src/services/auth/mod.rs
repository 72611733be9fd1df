//! Session store.
//!
//! Single source of truth for "is there a usable identity right now". The
//! [`Session`] is created once at startup (usually via [`Session::restore`])
//! and shared as `Arc<Session>` with every store that gates on it. It is the
//! only component that reads or writes the persisted identity cache.

mod cache;
mod error;

pub use cache::{
    CacheError, FileIdentityCache, IdentityCache, MemoryIdentityCache, PersistedIdentity,
};
pub use error::AuthError;

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, instrument, warn};

use shop_sync_core::{Email, UserId};

use crate::api::{NewUserRecord, ShopApi};
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::models::{Credentials, Identity, ProfileUpdate, Registration, UserInfo};

/// Minimum password length accepted at registration.
const MIN_PASSWORD_LENGTH: usize = 6;

/// Maximum username length accepted at registration.
const MAX_USERNAME_LENGTH: usize = 32;

/// Avatar generator used for new accounts.
const AVATAR_BASE_URL: &str = "https://api.dicebear.com/7.x/avataaars/svg?seed=";

/// Current identity plus its persisted cache.
pub struct Session {
    api: Arc<dyn ShopApi>,
    cache: Arc<dyn IdentityCache>,
    identity: RwLock<Option<Identity>>,
}

impl Session {
    /// Create a logged-out session. The cache is not read.
    #[must_use]
    pub fn new(api: Arc<dyn ShopApi>, cache: Arc<dyn IdentityCache>) -> Self {
        Self {
            api,
            cache,
            identity: RwLock::new(None),
        }
    }

    /// Create a session from whatever the cache holds.
    ///
    /// A missing, partial, or unreadable cache yields a logged-out session.
    #[must_use]
    pub fn restore(api: Arc<dyn ShopApi>, cache: Arc<dyn IdentityCache>) -> Self {
        let identity = match cache.load() {
            Ok(Some(PersistedIdentity {
                token: Some(token),
                user_info: Some(user),
            })) => Some(Identity {
                token: SecretString::from(token),
                user,
            })
            .filter(Identity::is_valid),
            Ok(Some(_)) => {
                warn!("Identity cache is incomplete, starting logged out");
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read identity cache, starting logged out");
                None
            }
        };

        if let Some(identity) = &identity {
            set_sentry_user(&identity.user.id, &identity.user.username);
            info!(user_id = %identity.user.id, "Restored session");
        }

        Self {
            api,
            cache,
            identity: RwLock::new(identity),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<Identity>> {
        self.identity.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<Identity>> {
        self.identity.write().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Whether a valid identity is present. Evaluated on every call.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.read().as_ref().is_some_and(Identity::is_valid)
    }

    /// Id of the authenticated user.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.read()
            .as_ref()
            .filter(|identity| identity.is_valid())
            .map(|identity| identity.user.id.clone())
    }

    /// Profile of the authenticated user.
    #[must_use]
    pub fn current_user(&self) -> Option<UserInfo> {
        self.read()
            .as_ref()
            .filter(|identity| identity.is_valid())
            .map(|identity| identity.user.clone())
    }

    /// Snapshot of the current identity, valid or not.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.read().clone()
    }

    // =========================================================================
    // Login / Registration
    // =========================================================================

    /// Log in with username and password.
    ///
    /// On failure the existing identity, if any, is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if no user matches,
    /// `AuthError::Api` if the lookup fails, and `AuthError::Cache` if the
    /// identity cannot be persisted.
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn login(&self, credentials: &Credentials) -> Result<UserInfo, AuthError> {
        let username = credentials.username.trim();
        let password = credentials.password.expose_secret();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let users = self
            .api
            .find_users(username, Some(password))
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Login lookup failed"))?;

        let user = users
            .into_iter()
            .find(|u| u.username == username)
            .ok_or(AuthError::InvalidCredentials)?;

        self.establish(user.into())
    }

    /// Create an account and log into it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidInput` or `AuthError::InvalidEmail` for bad
    /// input (no remote call is made), `AuthError::UserAlreadyExists` if the
    /// username is taken, and `AuthError::Api` if a remote call fails.
    #[instrument(skip(self, registration), fields(username = %registration.username))]
    pub async fn register(&self, registration: &Registration) -> Result<UserInfo, AuthError> {
        let username = registration.username.trim();
        validate_username(username)?;
        let password = registration.password.expose_secret();
        validate_password(password)?;
        let email = Email::parse(&registration.email)?;

        let existing = self.api.find_users(username, None).await?;
        if existing.iter().any(|u| u.username == username) {
            return Err(AuthError::UserAlreadyExists);
        }

        let created = self
            .api
            .create_user(&NewUserRecord {
                username: username.to_string(),
                password: password.to_string(),
                email: email.to_string(),
                avatar: avatar_url(username),
                created_at: Utc::now(),
            })
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Registration failed"))?;

        info!(user_id = %created.id, "Registered new user");
        self.establish(created.into())
    }

    /// Persist and adopt a fresh identity for `user`.
    fn establish(&self, user: UserInfo) -> Result<UserInfo, AuthError> {
        let token = generate_token();

        self.cache.store(&PersistedIdentity {
            token: Some(token.clone()),
            user_info: Some(user.clone()),
        })?;

        *self.write() = Some(Identity {
            token: SecretString::from(token),
            user: user.clone(),
        });

        set_sentry_user(&user.id, &user.username);
        info!(user_id = %user.id, "Logged in");
        Ok(user)
    }

    /// Clear the identity and the persisted cache.
    ///
    /// The in-memory identity is always cleared, even if the cache cannot be
    /// removed. Calling this while logged out is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Cache` if the persisted cache cannot be removed.
    pub fn logout(&self) -> Result<(), AuthError> {
        let previous = self.write().take();
        clear_sentry_user();

        if let Some(identity) = previous {
            info!(user_id = %identity.user.id, "Logged out");
        }

        self.cache.clear().map_err(|e| {
            tracing::error!(error = %e, "Failed to clear identity cache");
            AuthError::from(e)
        })
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// Merge `update` into the current profile and persist it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotAuthenticated` when logged out,
    /// `AuthError::InvalidEmail`/`InvalidInput` for bad fields, and
    /// `AuthError::Cache` if the cache cannot be written (the in-memory
    /// profile is then left unchanged).
    pub fn update_user_info(&self, update: ProfileUpdate) -> Result<UserInfo, AuthError> {
        if let Some(email) = &update.email {
            Email::parse(email)?;
        }
        if let Some(username) = &update.username {
            validate_username(username.trim())?;
        }

        let mut guard = self.write();
        let identity = guard
            .as_mut()
            .filter(|identity| identity.is_valid())
            .ok_or(AuthError::NotAuthenticated)?;

        let mut user = identity.user.clone();
        user.apply(update);

        self.cache.store(&PersistedIdentity {
            token: Some(identity.token.expose_secret().to_string()),
            user_info: Some(user.clone()),
        })?;
        identity.user = user.clone();

        Ok(user)
    }

    /// Reload the profile from `GET /users/{id}`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotAuthenticated` when logged out and
    /// `AuthError::Api` if the lookup fails.
    #[instrument(skip(self))]
    pub async fn refresh_user(&self) -> Result<UserInfo, AuthError> {
        let user_id = self.user_id().ok_or(AuthError::NotAuthenticated)?;
        let record = self.api.get_user(&user_id).await?;

        self.update_user_info(ProfileUpdate {
            username: Some(record.username),
            email: record.email,
            avatar: record.avatar,
        })
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.current_user())
            .finish_non_exhaustive()
    }
}

/// 256-bit random token, URL-safe base64.
fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn avatar_url(username: &str) -> String {
    let seed: String = url::form_urlencoded::byte_serialize(username.as_bytes()).collect();
    format!("{AVATAR_BASE_URL}{seed}")
}

fn validate_username(username: &str) -> Result<(), AuthError> {
    if username.is_empty() {
        return Err(AuthError::InvalidInput("username cannot be empty".to_string()));
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(AuthError::InvalidInput(format!(
            "username must be at most {MAX_USERNAME_LENGTH} characters"
        )));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::InvalidInput(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}
