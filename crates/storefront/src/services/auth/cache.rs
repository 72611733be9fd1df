//! Persisted identity cache.
//!
//! The identity is stored as two named slots, `token` and `userInfo`, in a
//! plain JSON object. There is no versioning: a file that does not parse is
//! reported as an error and the session starts logged out.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::UserInfo;

/// Errors reading or writing the identity cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed cache: {0}")]
    Format(#[from] serde_json::Error),
}

/// The persisted slots. Either may be missing in a damaged cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedIdentity {
    #[serde(rename = "token", default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(rename = "userInfo", default, skip_serializing_if = "Option::is_none")]
    pub user_info: Option<UserInfo>,
}

/// Storage for the persisted identity.
///
/// Calls are synchronous: login and logout must have written the cache by
/// the time they return.
pub trait IdentityCache: Send + Sync {
    /// Read the slots, `None` if nothing was ever stored.
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the storage cannot be read or parsed.
    fn load(&self) -> Result<Option<PersistedIdentity>, CacheError>;

    /// Replace both slots.
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the storage cannot be written.
    fn store(&self, identity: &PersistedIdentity) -> Result<(), CacheError>;

    /// Remove both slots. Clearing an empty cache succeeds.
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the storage cannot be removed.
    fn clear(&self) -> Result<(), CacheError>;
}

/// JSON file on disk.
#[derive(Debug, Clone)]
pub struct FileIdentityCache {
    path: PathBuf,
}

impl FileIdentityCache {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl IdentityCache for FileIdentityCache {
    fn load(&self) -> Result<Option<PersistedIdentity>, CacheError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn store(&self, identity: &PersistedIdentity) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        // Written beside the target, then renamed over it.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(identity)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// In-process cache; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryIdentityCache {
    slots: Mutex<Option<PersistedIdentity>>,
}

impl MemoryIdentityCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache pre-populated with `identity`.
    #[must_use]
    pub fn with(identity: PersistedIdentity) -> Self {
        Self {
            slots: Mutex::new(Some(identity)),
        }
    }
}

impl IdentityCache for MemoryIdentityCache {
    fn load(&self) -> Result<Option<PersistedIdentity>, CacheError> {
        Ok(self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn store(&self, identity: &PersistedIdentity) -> Result<(), CacheError> {
        *self.slots.lock().unwrap_or_else(PoisonError::into_inner) = Some(identity.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        *self.slots.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
