//! Credential persistence
//!
//! The credential record is three values: the access token, the refresh
//! token, and the access token's expiry in epoch milliseconds. They are
//! exposed under the key names the web client used for its cookies
//! (`accessToken`, `refreshToken`, `tokenExpirationTime`) so that a record
//! can be moved between clients unchanged.
//!
//! Three backends implement [`CredentialStore`]:
//!
//! - [`MemoryCredentialStore`] -- process lifetime only
//! - [`FileCredentialStore`]   -- JSON file in the user's data directory
//! - [`KeyringCredentialStore`] -- OS native credential store
//!
//! No backend validates token contents. [`CredentialStore::set`] always
//! writes the access token and its expiry together, so a record never holds
//! one without the other.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::config::{CredentialBackend, SessionConfig, MAX_TOKEN_LIFETIME_SECONDS};
use crate::error::CredentialError;
use crate::session::claims::decode_claims;

// ---------------------------------------------------------------------------
// CredentialKey / CredentialRecord
// ---------------------------------------------------------------------------

/// Names of the three persisted credential fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKey {
    /// Bearer token for authenticated calls
    AccessToken,
    /// Long-lived token used to mint new access tokens
    RefreshToken,
    /// Access token expiry, epoch milliseconds
    TokenExpirationTime,
}

impl CredentialKey {
    /// All keys, in storage order.
    pub const ALL: [CredentialKey; 3] = [
        CredentialKey::AccessToken,
        CredentialKey::RefreshToken,
        CredentialKey::TokenExpirationTime,
    ];

    /// Storage name of the key.
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialKey::AccessToken => "accessToken",
            CredentialKey::RefreshToken => "refreshToken",
            CredentialKey::TokenExpirationTime => "tokenExpirationTime",
        }
    }
}

impl std::fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serialized form of the credential record shared by all backends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Bearer token for authenticated calls
    #[serde(
        rename = "accessToken",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub access_token: Option<String>,

    /// Token exchanged for a new access token on expiry
    #[serde(
        rename = "refreshToken",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub refresh_token: Option<String>,

    /// Access token expiry, epoch milliseconds
    #[serde(
        rename = "tokenExpirationTime",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub expires_at: Option<i64>,
}

impl CredentialRecord {
    /// Builds a complete record for a freshly issued token pair.
    ///
    /// The expiry comes from the access token's `exp` claim. Tokens without
    /// a decodable `exp` get `now + default_lifetime`.
    pub fn issue(access_token: &str, refresh_token: &str, default_lifetime: Duration) -> Self {
        let expires_at = decode_claims(access_token)
            .and_then(|claims| claims.expires_at_millis())
            .unwrap_or_else(|| {
                Utc::now()
                    .checked_add_signed(default_lifetime)
                    .unwrap_or(DateTime::<Utc>::MAX_UTC)
                    .timestamp_millis()
            });

        Self {
            access_token: Some(access_token.to_string()),
            refresh_token: Some(refresh_token.to_string()),
            expires_at: Some(expires_at),
        }
    }

    /// Reads one field as its stored string form.
    pub fn get(&self, key: CredentialKey) -> Option<String> {
        match key {
            CredentialKey::AccessToken => self.access_token.clone(),
            CredentialKey::RefreshToken => self.refresh_token.clone(),
            CredentialKey::TokenExpirationTime => self.expires_at.map(|ms| ms.to_string()),
        }
    }

    /// Returns `true` when no field is set.
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none() && self.expires_at.is_none()
    }
}

// ---------------------------------------------------------------------------
// CredentialStore
// ---------------------------------------------------------------------------

/// Key/value persistence boundary for the session's credentials.
///
/// Implementations must be safe to share between tasks; the session guard
/// holds them behind an `Arc`.
pub trait CredentialStore: Send + Sync {
    /// Reads one credential field. `Ok(None)` means the field is not stored.
    fn get(&self, key: CredentialKey) -> Result<Option<String>, CredentialError>;

    /// Stores a new token pair together with the access token's expiry.
    fn set(&self, access_token: &str, refresh_token: &str) -> Result<(), CredentialError>;

    /// Removes all three fields. A no-op when nothing is stored.
    fn clear(&self) -> Result<(), CredentialError>;
}

/// Opens the backend selected in the session configuration.
///
/// `ephemeral` forces the in-memory backend regardless of configuration.
pub fn open_store(
    config: &SessionConfig,
    ephemeral: bool,
) -> Result<Arc<dyn CredentialStore>, CredentialError> {
    let seconds = config
        .default_token_lifetime_seconds
        .min(MAX_TOKEN_LIFETIME_SECONDS);
    let lifetime = Duration::seconds(i64::try_from(seconds).unwrap_or(i64::MAX / 1000));
    let backend = if ephemeral {
        CredentialBackend::Memory
    } else {
        config.credential_backend
    };

    tracing::debug!("Opening {:?} credential store", backend);

    Ok(match backend {
        CredentialBackend::Memory => Arc::new(MemoryCredentialStore::new(lifetime)),
        CredentialBackend::Keyring => Arc::new(KeyringCredentialStore::new(lifetime)),
        CredentialBackend::File => {
            let path = match &config.credentials_path {
                Some(path) => PathBuf::from(path),
                None => FileCredentialStore::default_path()?,
            };
            Arc::new(FileCredentialStore::new(path, lifetime))
        }
    })
}

// ---------------------------------------------------------------------------
// MemoryCredentialStore
// ---------------------------------------------------------------------------

/// Credential store that lives only as long as the process.
///
/// # Examples
///
/// ```
/// use chrono::Duration;
/// use fashionfiend::session::credentials::{CredentialKey, CredentialStore, MemoryCredentialStore};
///
/// let store = MemoryCredentialStore::new(Duration::hours(1));
/// store.set("access", "refresh").unwrap();
/// assert_eq!(store.get(CredentialKey::AccessToken).unwrap().as_deref(), Some("access"));
/// assert!(store.get(CredentialKey::TokenExpirationTime).unwrap().is_some());
///
/// store.clear().unwrap();
/// assert!(store.get(CredentialKey::RefreshToken).unwrap().is_none());
/// ```
#[derive(Debug)]
pub struct MemoryCredentialStore {
    record: RwLock<CredentialRecord>,
    default_lifetime: Duration,
}

impl MemoryCredentialStore {
    /// Creates an empty store.
    pub fn new(default_lifetime: Duration) -> Self {
        Self::with_record(CredentialRecord::default(), default_lifetime)
    }

    /// Creates a store pre-loaded with `record`.
    pub fn with_record(record: CredentialRecord, default_lifetime: Duration) -> Self {
        Self {
            record: RwLock::new(record),
            default_lifetime,
        }
    }

    /// Copy of the current record.
    pub fn snapshot(&self) -> CredentialRecord {
        self.record
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: CredentialKey) -> Result<Option<String>, CredentialError> {
        Ok(self.snapshot().get(key))
    }

    fn set(&self, access_token: &str, refresh_token: &str) -> Result<(), CredentialError> {
        let record = CredentialRecord::issue(access_token, refresh_token, self.default_lifetime);
        *self
            .record
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = record;
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialError> {
        *self
            .record
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = CredentialRecord::default();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileCredentialStore
// ---------------------------------------------------------------------------

/// Credential store backed by a JSON file.
///
/// The file is re-read on every access so that several client processes
/// see each other's refreshes. On Unix the file is created with mode `0600`.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    default_lifetime: Duration,
}

impl FileCredentialStore {
    /// Creates a store using the file at `path`. The file need not exist.
    pub fn new<P: Into<PathBuf>>(path: P, default_lifetime: Duration) -> Self {
        Self {
            path: path.into(),
            default_lifetime,
        }
    }

    /// `credentials.json` in the platform data directory.
    pub fn default_path() -> Result<PathBuf, CredentialError> {
        let dirs = ProjectDirs::from("com", "fashionfiend", "fashionfiend")
            .ok_or(CredentialError::NoDataDir)?;
        Ok(dirs.data_dir().join("credentials.json"))
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<CredentialRecord, CredentialError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(CredentialRecord::default()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(CredentialRecord::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, record: &CredentialRecord) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(record)?;
        std::fs::write(&self.path, json)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, key: CredentialKey) -> Result<Option<String>, CredentialError> {
        Ok(self.load()?.get(key))
    }

    fn set(&self, access_token: &str, refresh_token: &str) -> Result<(), CredentialError> {
        let record = CredentialRecord::issue(access_token, refresh_token, self.default_lifetime);
        self.save(&record)
    }

    fn clear(&self) -> Result<(), CredentialError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// KeyringCredentialStore
// ---------------------------------------------------------------------------

/// Credential store backed by the OS keyring (Keychain on macOS, Secret
/// Service on Linux, Credential Manager on Windows).
///
/// The whole record is stored as one JSON entry so that the token pair and
/// its expiry are replaced atomically.
#[derive(Debug)]
pub struct KeyringCredentialStore {
    service: String,
    default_lifetime: Duration,
}

impl KeyringCredentialStore {
    const USER: &'static str = "credentials";

    /// Creates a store under the `fashionfiend` keyring service.
    pub fn new(default_lifetime: Duration) -> Self {
        Self::with_service("fashionfiend", default_lifetime)
    }

    /// Creates a store under a custom keyring service name.
    pub fn with_service(service: impl Into<String>, default_lifetime: Duration) -> Self {
        Self {
            service: service.into(),
            default_lifetime,
        }
    }

    fn entry(&self) -> Result<keyring::Entry, CredentialError> {
        Ok(keyring::Entry::new(&self.service, Self::USER)?)
    }

    fn load(&self) -> Result<CredentialRecord, CredentialError> {
        match self.entry()?.get_password() {
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(keyring::Error::NoEntry) => Ok(CredentialRecord::default()),
            Err(e) => Err(e.into()),
        }
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn get(&self, key: CredentialKey) -> Result<Option<String>, CredentialError> {
        Ok(self.load()?.get(key))
    }

    fn set(&self, access_token: &str, refresh_token: &str) -> Result<(), CredentialError> {
        let record = CredentialRecord::issue(access_token, refresh_token, self.default_lifetime);
        let json = serde_json::to_string(&record)?;
        self.entry()?.set_password(&json)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialError> {
        match self.entry()?.delete_password() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
