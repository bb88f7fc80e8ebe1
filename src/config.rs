//! Configuration management for FashionFiend
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.
//!
//! Precedence, lowest to highest: built-in defaults, the YAML file,
//! `FASHIONFIEND_*` environment variables, command-line flags.

use crate::error::{FiendError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Main configuration structure for FashionFiend
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend endpoints and HTTP behavior
    #[serde(default)]
    pub api: ApiConfig,
    /// Credential storage
    #[serde(default)]
    pub session: SessionConfig,
    /// Product preview lookups
    #[serde(default)]
    pub preview: PreviewConfig,
    /// Interactive chat settings
    #[serde(default)]
    pub chat: ChatConfig,
}

/// Backend endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Root of the backend (auth refresh and recommendations)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Root of the conversation endpoints, when they live under a prefix
    /// such as `/p/bpx`. Defaults to `base_url`.
    #[serde(default)]
    pub conversation_base_url: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            conversation_base_url: None,
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

/// Where credentials are persisted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialBackend {
    /// OS native credential store
    Keyring,
    /// JSON file in the user's data directory
    #[default]
    File,
    /// Process memory only; nothing survives exit
    Memory,
}

impl std::str::FromStr for CredentialBackend {
    type Err = FiendError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "keyring" => Ok(Self::Keyring),
            "file" => Ok(Self::File),
            "memory" => Ok(Self::Memory),
            other => Err(FiendError::Config(format!(
                "Invalid credential backend: {}. Must be one of: keyring, file, memory",
                other
            ))),
        }
    }
}

/// Session and credential settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Credential storage backend
    #[serde(default)]
    pub credential_backend: CredentialBackend,

    /// Credential file location for the `file` backend
    #[serde(default)]
    pub credentials_path: Option<String>,

    /// Access token lifetime assumed when the token carries no `exp` claim
    #[serde(default = "default_token_lifetime_seconds")]
    pub default_token_lifetime_seconds: u64,
}

/// Upper bound for `session.default_token_lifetime_seconds`: one year.
pub const MAX_TOKEN_LIFETIME_SECONDS: u64 = 31_536_000;

fn default_token_lifetime_seconds() -> u64 {
    3600
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            credential_backend: CredentialBackend::default(),
            credentials_path: None,
            default_token_lifetime_seconds: default_token_lifetime_seconds(),
        }
    }
}

/// Product preview settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// Look up preview images for recommended products
    #[serde(default = "default_preview_enabled")]
    pub enabled: bool,

    /// Link-preview service endpoint
    #[serde(default = "default_preview_endpoint")]
    pub endpoint: String,
}

fn default_preview_enabled() -> bool {
    true
}

fn default_preview_endpoint() -> String {
    "https://api.microlink.io".to_string()
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            enabled: default_preview_enabled(),
            endpoint: default_preview_endpoint(),
        }
    }
}

/// Interactive chat settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Conversations listed before "show more"
    #[serde(default = "default_sidebar_page_size")]
    pub sidebar_page_size: usize,

    /// User id for conversation listing. When unset it is read from the
    /// access token's `_id` claim.
    #[serde(default)]
    pub user_id: Option<String>,
}

fn default_sidebar_page_size() -> usize {
    crate::chat::sidebar::DEFAULT_PAGE_SIZE
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            sidebar_page_size: default_sidebar_page_size(),
            user_id: None,
        }
    }
}

impl Config {
    /// Load configuration from file, environment, and CLI
    ///
    /// A missing file is not an error: defaults are used and a warning is
    /// logged. A file that exists but does not parse is an error.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| FiendError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| FiendError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(base_url) = std::env::var("FASHIONFIEND_BASE_URL") {
            tracing::debug!(base_url = %base_url, "Env override: FASHIONFIEND_BASE_URL");
            self.api.base_url = base_url;
        }

        if let Ok(url) = std::env::var("FASHIONFIEND_CONVERSATION_BASE_URL") {
            tracing::debug!(url = %url, "Env override: FASHIONFIEND_CONVERSATION_BASE_URL");
            self.api.conversation_base_url = Some(url);
        }

        if let Ok(timeout) = std::env::var("FASHIONFIEND_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.api.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid FASHIONFIEND_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(backend) = std::env::var("FASHIONFIEND_CREDENTIAL_BACKEND") {
            match backend.parse() {
                Ok(value) => self.session.credential_backend = value,
                Err(_) => {
                    tracing::warn!("Invalid credential backend: {}, keeping configured", backend)
                }
            }
        }

        if let Ok(path) = std::env::var("FASHIONFIEND_CREDENTIALS_PATH") {
            self.session.credentials_path = Some(path);
        }

        if let Ok(enabled) = std::env::var("FASHIONFIEND_PREVIEW_ENABLED") {
            match enabled.parse::<bool>() {
                Ok(v) => self.preview.enabled = v,
                Err(_) => {
                    tracing::warn!("Invalid value for FASHIONFIEND_PREVIEW_ENABLED: {}", enabled)
                }
            }
        }

        if let Ok(user_id) = std::env::var("FASHIONFIEND_USER_ID") {
            self.chat.user_id = Some(user_id);
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(base_url) = &cli.base_url {
            tracing::debug!("Using base URL override: {}", base_url);
            self.api.base_url = base_url.clone();
        }

        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if a URL is not `http(s)` or a numeric setting is out
    /// of range
    pub fn validate(&self) -> Result<()> {
        parse_http_url("api.base_url", &self.api.base_url)?;

        if let Some(url) = &self.api.conversation_base_url {
            parse_http_url("api.conversation_base_url", url)?;
        }

        if self.api.timeout_seconds == 0 {
            return Err(
                FiendError::Config("timeout_seconds must be greater than 0".to_string()).into(),
            );
        }

        if self.api.timeout_seconds > 600 {
            return Err(FiendError::Config(
                "timeout_seconds must be less than or equal to 600".to_string(),
            )
            .into());
        }

        if self.session.default_token_lifetime_seconds == 0 {
            return Err(FiendError::Config(
                "default_token_lifetime_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.session.default_token_lifetime_seconds > MAX_TOKEN_LIFETIME_SECONDS {
            return Err(FiendError::Config(format!(
                "default_token_lifetime_seconds must be less than or equal to {}",
                MAX_TOKEN_LIFETIME_SECONDS
            ))
            .into());
        }

        if self.preview.enabled {
            parse_http_url("preview.endpoint", &self.preview.endpoint)?;
        }

        if self.chat.sidebar_page_size == 0 {
            return Err(
                FiendError::Config("sidebar_page_size must be greater than 0".to_string()).into(),
            );
        }

        Ok(())
    }

    /// Root URL for the auth and recommendation endpoints.
    pub fn api_base_url(&self) -> Result<Url> {
        parse_http_url("api.base_url", &self.api.base_url)
    }

    /// Root URL for the conversation endpoints.
    pub fn conversation_base_url(&self) -> Result<Url> {
        match &self.api.conversation_base_url {
            Some(url) => parse_http_url("api.conversation_base_url", url),
            None => self.api_base_url(),
        }
    }

    /// Link-preview service endpoint.
    pub fn preview_endpoint(&self) -> Result<Url> {
        parse_http_url("preview.endpoint", &self.preview.endpoint)
    }
}

fn parse_http_url(field: &str, value: &str) -> Result<Url> {
    let url = Url::parse(value)
        .map_err(|e| FiendError::Config(format!("Invalid {}: {} ({})", field, value, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(FiendError::Config(format!(
            "Invalid {}: scheme must be http or https, got {}",
            field, scheme
        ))
        .into()),
    }
}
