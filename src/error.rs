//! Error types for FashionFiend
//!
//! Each layer gets its own `thiserror` enum so callers can match on the
//! failures they care about:
//!
//! - [`CredentialError`] -- the credential store backend failed
//! - [`AuthError`] -- the session guard could not produce a usable token
//! - [`ApiError`] -- an authenticated conversation call failed
//! - [`FiendError`] -- application-level failures (config, CLI input)
//!
//! Command handlers use the [`Result`] alias, which wraps everything in
//! `anyhow::Error`.

use thiserror::Error;

/// Failures of a credential store backend.
#[derive(Error, Debug)]
pub enum CredentialError {
    /// OS keyring rejected the operation
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    /// Credential file could not be read or written
    #[error("Credential file error: {0}")]
    Io(#[from] std::io::Error),

    /// Credential file contents are not valid JSON
    #[error("Credential serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No per-user data directory could be determined
    #[error("Could not determine a data directory for credentials")]
    NoDataDir,
}

/// Failures of the session guard.
///
/// `NoRefreshToken` and `RefreshFailed` are fatal for the current session:
/// nothing short of a fresh login can recover.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Access token is expired or absent and there is no refresh token
    #[error("No refresh token available, log in again")]
    NoRefreshToken,

    /// The auth service rejected the refresh token or could not be reached.
    /// Stored credentials have been cleared.
    #[error("Failed to refresh access token: {reason}")]
    RefreshFailed {
        /// Human readable cause reported by the auth service or transport
        reason: String,
    },

    /// The credential store itself failed
    #[error("Credential store error: {0}")]
    Credentials(#[from] CredentialError),
}

impl AuthError {
    /// Returns `true` when the user must log in again.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::NoRefreshToken | Self::RefreshFailed { .. })
    }
}

/// Failures of the conversation gateway.
#[derive(Error, Debug)]
pub enum ApiError {
    /// No valid bearer token could be obtained
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The server answered with a non-success status
    #[error("{operation} failed with HTTP status {status}")]
    RequestFailed {
        /// Gateway operation name, e.g. `list_conversations`
        operation: &'static str,
        /// HTTP status code returned by the server
        status: u16,
    },

    /// The request never produced a response
    #[error("{operation} request failed: {source}")]
    Transport {
        /// Gateway operation name
        operation: &'static str,
        /// Underlying transport error
        #[source]
        source: reqwest::Error,
    },

    /// The response body did not have the expected shape
    #[error("{operation} returned an unexpected body: {reason}")]
    Decode {
        /// Gateway operation name
        operation: &'static str,
        /// What was wrong with the body
        reason: String,
    },
}

impl ApiError {
    /// Returns `true` when the failure came from the session guard and the
    /// user has to log in again.
    pub fn is_session_fatal(&self) -> bool {
        match self {
            Self::Auth(e) => e.is_fatal(),
            _ => false,
        }
    }

    /// HTTP status for `RequestFailed` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Application-level errors
#[derive(Error, Debug)]
pub enum FiendError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid command-line or interactive input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The command needs a logged-in session
    #[error("Not logged in: {0}")]
    NotLoggedIn(String),

    /// Conversation gateway errors
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Session guard errors
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Credential store errors
    #[error(transparent)]
    Credentials(#[from] CredentialError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for command handlers and configuration loading
pub type Result<T> = anyhow::Result<T>;

/// Returns `true` when `error` means the user has to log in again.
pub fn is_session_fatal(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        if let Some(e) = cause.downcast_ref::<AuthError>() {
            e.is_fatal()
        } else if let Some(e) = cause.downcast_ref::<ApiError>() {
            e.is_session_fatal()
        } else if let Some(e) = cause.downcast_ref::<FiendError>() {
            match e {
                FiendError::Api(api) => api.is_session_fatal(),
                FiendError::Auth(auth) => auth.is_fatal(),
                _ => false,
            }
        } else {
            false
        }
    })
}
