//! Authenticated session lifecycle
//!
//! # Module Layout
//!
//! - [`claims`]      -- unverified JWT payload decoding (`exp`, `_id`)
//! - [`credentials`] -- credential store trait and its backends
//! - [`guard`]       -- token validity check and refresh-once logic
//! - [`refresh`]     -- auth service refresh endpoint

pub mod claims;
pub mod credentials;
pub mod guard;
pub mod refresh;

pub use credentials::{CredentialKey, CredentialRecord, CredentialStore};
pub use guard::{SessionGuard, TokenState};
pub use refresh::{HttpTokenRefresher, TokenPair, TokenRefresher};
