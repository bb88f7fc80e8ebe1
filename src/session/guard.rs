//! Session guard: hands out bearer tokens that are currently valid
//!
//! Every authenticated request goes through
//! [`SessionGuard::ensure_valid_access_token`]. The per-call state machine
//! is:
//!
//! ```text
//! Valid                          -> serve cached token (no network)
//! Expired & refresh token        -> Refreshing -> Refreshed | RefreshFailed
//! Expired & no refresh token     -> NoRefreshToken (fatal)
//! ```
//!
//! A refresh is attempted at most once per call. If the backend then
//! rejects the new token, the caller sees a plain HTTP error, never a
//! second refresh. Concurrent callers are not serialized: two requests that
//! both observe an expired token both refresh, and the last write to the
//! credential store wins.

use std::sync::Arc;

use chrono::Utc;

use crate::error::AuthError;
use crate::session::claims::decode_claims;
use crate::session::credentials::{CredentialKey, CredentialStore};
use crate::session::refresh::TokenRefresher;

/// Usability of the stored access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// Present and not past its expiry
    Valid,
    /// Absent, past its expiry, or with no recorded expiry
    Expired,
}

/// Classifies a stored token.
///
/// `expires_at` is the raw stored string; anything that does not parse as
/// epoch milliseconds counts as expired. A token expiring exactly at `now`
/// is still valid.
pub fn assess(access_token: Option<&str>, expires_at: Option<&str>, now_millis: i64) -> TokenState {
    let expires_at = expires_at.and_then(|raw| raw.trim().parse::<i64>().ok());
    match (access_token, expires_at) {
        (Some(token), Some(expires_at)) if !token.is_empty() && now_millis <= expires_at => {
            TokenState::Valid
        }
        _ => TokenState::Expired,
    }
}

/// Guarantees authenticated requests carry a usable bearer token.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use chrono::Duration;
/// use fashionfiend::session::credentials::{CredentialStore, MemoryCredentialStore};
/// use fashionfiend::session::guard::{SessionGuard, TokenState};
/// use fashionfiend::session::refresh::HttpTokenRefresher;
///
/// let store = Arc::new(MemoryCredentialStore::new(Duration::hours(1)));
/// store.set("opaque-access", "opaque-refresh").unwrap();
///
/// let refresher = HttpTokenRefresher::new(
///     reqwest::Client::new(),
///     url::Url::parse("http://127.0.0.1:8000").unwrap(),
/// );
/// let guard = SessionGuard::new(store, Arc::new(refresher));
/// assert_eq!(guard.token_state().unwrap(), TokenState::Valid);
/// ```
#[derive(Clone)]
pub struct SessionGuard {
    store: Arc<dyn CredentialStore>,
    refresher: Arc<dyn TokenRefresher>,
}

impl std::fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGuard").finish_non_exhaustive()
    }
}

impl SessionGuard {
    /// Creates a guard over `store` that refreshes through `refresher`.
    pub fn new(store: Arc<dyn CredentialStore>, refresher: Arc<dyn TokenRefresher>) -> Self {
        Self { store, refresher }
    }

    /// The underlying credential store.
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Classifies the stored access token without touching the network.
    pub fn token_state(&self) -> Result<TokenState, AuthError> {
        let access = self.store.get(CredentialKey::AccessToken)?;
        let expires_at = self.store.get(CredentialKey::TokenExpirationTime)?;
        Ok(assess(
            access.as_deref(),
            expires_at.as_deref(),
            Utc::now().timestamp_millis(),
        ))
    }

    /// User id claim (`_id`, else `sub`) of the stored access token.
    pub fn user_id(&self) -> Result<Option<String>, AuthError> {
        Ok(self
            .store
            .get(CredentialKey::AccessToken)?
            .and_then(|token| decode_claims(&token))
            .and_then(|claims| claims.user_id().map(str::to_string)))
    }

    /// Returns a bearer token that is valid right now.
    ///
    /// # Errors
    ///
    /// - [`AuthError::NoRefreshToken`] when the token is expired and no
    ///   refresh token is stored. No network call is made.
    /// - [`AuthError::RefreshFailed`] when the auth service rejects the
    ///   refresh or cannot be reached. All stored credentials are cleared.
    /// - [`AuthError::Credentials`] when the store itself fails.
    pub async fn ensure_valid_access_token(&self) -> Result<String, AuthError> {
        let access = self.store.get(CredentialKey::AccessToken)?;
        let expires_at = self.store.get(CredentialKey::TokenExpirationTime)?;
        let now = Utc::now().timestamp_millis();

        if let (TokenState::Valid, Some(token)) =
            (assess(access.as_deref(), expires_at.as_deref(), now), access)
        {
            tracing::debug!("Reusing cached access token");
            return Ok(token);
        }

        let refresh_token = self
            .store
            .get(CredentialKey::RefreshToken)?
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::NoRefreshToken)?;

        tracing::info!("Access token expired, refreshing");
        match self.refresher.refresh(&refresh_token).await {
            Ok(pair) => {
                self.store.set(&pair.access_token, &pair.refresh_token)?;
                tracing::debug!("Stored refreshed token pair");
                Ok(pair.access_token)
            }
            Err(e) => {
                tracing::warn!("Token refresh failed, clearing credentials: {}", e);
                if let Err(clear_err) = self.store.clear() {
                    tracing::error!("Failed to clear credentials after refresh failure: {}", clear_err);
                }
                Err(AuthError::RefreshFailed {
                    reason: e.to_string(),
                })
            }
        }
    }
}
