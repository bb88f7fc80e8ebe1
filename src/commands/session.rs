//! Session commands: `login`, `logout`, `status`

use crate::commands::AppContext;
use crate::error::{FiendError, Result};
use crate::session::{CredentialKey, TokenState};
use chrono::{DateTime, Utc};
use colored::Colorize;

/// What `status` reports about the stored credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    /// Classification of the stored access token
    pub state: TokenState,
    /// Whether an access token is stored at all
    pub has_access_token: bool,
    /// Whether a refresh token is stored
    pub has_refresh_token: bool,
    /// Access token expiry, when stored and parseable
    pub expires_at: Option<DateTime<Utc>>,
    /// User id claim of the access token
    pub user_id: Option<String>,
}

impl SessionStatus {
    /// Human readable summary line.
    pub fn summary(&self) -> &'static str {
        match (self.has_access_token, self.state, self.has_refresh_token) {
            (false, _, false) => "Not logged in",
            (_, TokenState::Valid, _) => "Logged in",
            (_, TokenState::Expired, true) => "Access token expired, will refresh on next request",
            (_, TokenState::Expired, false) => "Access token expired, log in again",
        }
    }
}

/// Reads the stored session without contacting the server.
pub fn session_status(ctx: &AppContext) -> Result<SessionStatus> {
    let store = ctx.guard.store();
    let access = store.get(CredentialKey::AccessToken)?;
    let refresh = store.get(CredentialKey::RefreshToken)?;
    let expires_at = store
        .get(CredentialKey::TokenExpirationTime)?
        .and_then(|raw| raw.parse::<i64>().ok())
        .and_then(DateTime::<Utc>::from_timestamp_millis);

    Ok(SessionStatus {
        state: ctx.guard.token_state()?,
        has_access_token: access.is_some_and(|t| !t.is_empty()),
        has_refresh_token: refresh.is_some_and(|t| !t.is_empty()),
        expires_at,
        user_id: ctx.guard.user_id()?,
    })
}

/// Stores a token pair issued by the auth service.
///
/// # Errors
///
/// Returns error if either token is empty or the store fails
pub fn login(ctx: &AppContext, access_token: &str, refresh_token: &str) -> Result<()> {
    let access_token = access_token.trim();
    let refresh_token = refresh_token.trim();
    if access_token.is_empty() || refresh_token.is_empty() {
        return Err(FiendError::InvalidInput(
            "access and refresh tokens must not be empty".to_string(),
        )
        .into());
    }

    ctx.guard.store().set(access_token, refresh_token)?;
    tracing::info!("Stored new credentials");

    let status = session_status(ctx)?;
    println!("{}", "Logged in".green());
    print_details(&status);
    Ok(())
}

/// Removes stored credentials.
pub fn logout(ctx: &AppContext) -> Result<()> {
    ctx.guard.store().clear()?;
    tracing::info!("Cleared credentials");
    println!("{}", "Logged out".green());
    Ok(())
}

/// Prints the stored session state.
pub fn status(ctx: &AppContext) -> Result<()> {
    let status = session_status(ctx)?;
    let summary = match status.state {
        TokenState::Valid => status.summary().green(),
        TokenState::Expired if status.has_refresh_token => status.summary().yellow(),
        TokenState::Expired => status.summary().red(),
    };
    println!("{}", summary);
    print_details(&status);
    Ok(())
}

fn print_details(status: &SessionStatus) {
    if let Some(user_id) = &status.user_id {
        println!("  user:    {}", user_id.cyan());
    }
    if let Some(expires_at) = status.expires_at {
        println!(
            "  expires: {}",
            expires_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
}
