//! Unverified JWT payload decoding
//!
//! The client never validates access tokens; the server does. It only peeks
//! at the payload for two values: `exp`, which drives the stored expiry
//! timestamp, and `_id`, which is the user id the conversation endpoints
//! are keyed by.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;

/// The subset of access-token claims the client reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TokenClaims {
    /// Expiry as seconds since the Unix epoch
    #[serde(default)]
    pub exp: Option<i64>,

    /// Backend user id
    #[serde(default, rename = "_id")]
    pub id: Option<String>,

    /// Standard subject claim, used when `_id` is absent
    #[serde(default)]
    pub sub: Option<String>,
}

impl TokenClaims {
    /// Expiry converted to epoch milliseconds.
    pub fn expires_at_millis(&self) -> Option<i64> {
        self.exp.map(|secs| secs.saturating_mul(1000))
    }

    /// User id from `_id`, falling back to `sub`.
    pub fn user_id(&self) -> Option<&str> {
        self.id.as_deref().or(self.sub.as_deref())
    }
}

/// Decodes the payload segment of a JWT.
///
/// Returns `None` for anything that is not a three-part token with a
/// base64url JSON payload. Padding is tolerated.
///
/// # Examples
///
/// ```
/// use fashionfiend::session::claims::decode_claims;
///
/// // {"exp":1700000000,"_id":"u1"}
/// let token = "e30.eyJleHAiOjE3MDAwMDAwMDAsIl9pZCI6InUxIn0.sig";
/// let claims = decode_claims(token).unwrap();
/// assert_eq!(claims.exp, Some(1_700_000_000));
/// assert_eq!(claims.user_id(), Some("u1"));
///
/// assert!(decode_claims("opaque-token").is_none());
/// ```
pub fn decode_claims(token: &str) -> Option<TokenClaims> {
    let mut parts = token.split('.');
    let (_header, payload, _signature) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    serde_json::from_slice(&bytes).ok()
}
