//! Session-related types.
//!
//! Types describing who is logged in and how that identity is persisted.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use shop_sync_core::UserId;

use crate::api::types::UserRecord;

/// Public profile of the logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl From<UserRecord> for UserInfo {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            username: record.username,
            email: record.email.unwrap_or_default(),
            avatar: record.avatar,
        }
    }
}

/// The current identity: an opaque token plus the user it belongs to.
#[derive(Debug, Clone)]
pub struct Identity {
    pub token: SecretString,
    pub user: UserInfo,
}

impl Identity {
    /// Whether the identity can authorize actions: the token is non-blank.
    ///
    /// The user id is always present by construction.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.token.expose_secret().trim().is_empty()
    }
}

/// Username/password login request.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(Into::<String>::into(password)),
        }
    }
}

/// New-account request.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub password: SecretString,
    pub email: String,
}

impl Registration {
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(Into::<String>::into(password)),
            email: email.into(),
        }
    }
}

/// Partial profile edit merged into the current [`UserInfo`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
}

impl UserInfo {
    /// Apply the fields set in `update`.
    pub fn apply(&mut self, update: ProfileUpdate) {
        if let Some(username) = update.username {
            self.username = username;
        }
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(avatar) = update.avatar {
            self.avatar = Some(avatar);
        }
    }
}
