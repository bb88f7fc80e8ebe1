//! Access-token refresh against the auth service
//!
//! [`TokenRefresher`] is the seam between the session guard and the auth
//! service. [`HttpTokenRefresher`] is the production implementation; tests
//! substitute fakes or point it at a mock server.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A freshly minted token pair.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenPair {
    /// New short-lived access token
    pub access_token: String,
    /// New (possibly rotated) refresh token
    pub refresh_token: String,
}

/// Why a refresh attempt failed.
#[derive(Error, Debug)]
pub enum RefreshError {
    /// The auth service could not be reached
    #[error("refresh request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The auth service answered with a non-success status
    #[error("auth service returned {status}: {message}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// `message` field of the error body, or a generic description
        message: String,
    },

    /// A success response without a usable token pair
    #[error("malformed refresh response: {0}")]
    MalformedResponse(String),
}

/// Exchanges a refresh token for a new token pair.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Performs one refresh call. Implementations must not retry.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, RefreshError>;
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    #[serde(rename = "refreshToken")]
    refresh_token: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    #[serde(default)]
    data: Option<TokenPair>,
}

#[derive(Deserialize)]
struct RefreshFailure {
    #[serde(default)]
    message: Option<String>,
}

/// Calls `POST {base}/auth/token/refresh`.
///
/// # Examples
///
/// ```
/// use fashionfiend::session::refresh::HttpTokenRefresher;
///
/// let refresher = HttpTokenRefresher::new(
///     reqwest::Client::new(),
///     url::Url::parse("http://127.0.0.1:8000").unwrap(),
/// );
/// assert_eq!(refresher.endpoint().as_str(), "http://127.0.0.1:8000/auth/token/refresh");
/// ```
#[derive(Debug, Clone)]
pub struct HttpTokenRefresher {
    http: reqwest::Client,
    endpoint: url::Url,
}

impl HttpTokenRefresher {
    /// Creates a refresher for the auth service rooted at `base_url`.
    pub fn new(http: reqwest::Client, base_url: url::Url) -> Self {
        let endpoint = crate::api::join_segments(&base_url, &["auth", "token", "refresh"]);
        Self { http, endpoint }
    }

    /// Fully resolved refresh endpoint.
    pub fn endpoint(&self) -> &url::Url {
        &self.endpoint
    }
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, RefreshError> {
        let resp = self
            .http
            .post(self.endpoint.clone())
            .json(&RefreshRequest { refresh_token })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp
                .json::<RefreshFailure>()
                .await
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| "Failed to refresh token".to_string());
            return Err(RefreshError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body: RefreshResponse = resp
            .json()
            .await
            .map_err(|e| RefreshError::MalformedResponse(e.to_string()))?;

        match body.data {
            Some(pair) if !pair.access_token.is_empty() => Ok(pair),
            _ => Err(RefreshError::MalformedResponse(
                "missing data.access_token".to_string(),
            )),
        }
    }
}
