/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

- `session`       -- login, logout and status
- `conversations` -- conversation listing, creation, deletion, messages and feedback
- `chat`          -- single questions and the interactive chat loop

Every handler receives an [`AppContext`] holding the configured gateways.
*/

use crate::api::{
    plain_cards, ConversationClient, PreviewClient, ProductCard, ProductRef, RecommendationClient,
};
use crate::config::Config;
use crate::error::{FiendError, Result};
use crate::session::credentials::open_store;
use crate::session::{HttpTokenRefresher, SessionGuard};
use std::sync::Arc;
use std::time::Duration;

pub mod chat;
pub mod conversations;
pub mod render;
pub mod session;
pub mod special_commands;

/// Shared state for one CLI invocation.
#[derive(Debug, Clone)]
pub struct AppContext {
    /// Validated configuration
    pub config: Config,
    /// Session guard over the configured credential store
    pub guard: Arc<SessionGuard>,
    /// Authenticated conversation gateway
    pub conversations: Arc<ConversationClient>,
    /// Unauthenticated recommendation gateway
    pub recommendations: Arc<RecommendationClient>,
    /// Preview lookups, when enabled
    pub previews: Option<PreviewClient>,
}

impl AppContext {
    /// Wires the gateways from configuration.
    ///
    /// All gateways share one HTTP client with the configured timeout.
    /// `ephemeral` forces the in-memory credential store.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built, a configured URL
    /// is invalid, or the credential store cannot be opened
    pub fn build(config: Config, ephemeral: bool) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api.timeout_seconds))
            .user_agent(concat!("fashionfiend/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let api_base = config.api_base_url()?;
        let store = open_store(&config.session, ephemeral)?;
        let refresher = HttpTokenRefresher::new(http.clone(), api_base.clone());
        let guard = Arc::new(SessionGuard::new(store, Arc::new(refresher)));

        let conversations = Arc::new(ConversationClient::new(
            http.clone(),
            config.conversation_base_url()?,
            Arc::clone(&guard),
        ));
        let recommendations = Arc::new(RecommendationClient::new(http.clone(), api_base));

        let previews = if config.preview.enabled {
            Some(PreviewClient::new(http, config.preview_endpoint()?))
        } else {
            None
        };

        tracing::debug!(
            "Using backend {} (conversations at {})",
            config.api.base_url,
            config
                .api
                .conversation_base_url
                .as_deref()
                .unwrap_or(&config.api.base_url)
        );

        Ok(Self {
            config,
            guard,
            conversations,
            recommendations,
            previews,
        })
    }

    /// User id for conversation listing and creation.
    ///
    /// The configured `chat.user_id` wins; otherwise the `_id` claim of the
    /// stored access token is used.
    ///
    /// # Errors
    ///
    /// Returns [`FiendError::NotLoggedIn`] when neither is available
    pub fn user_id(&self) -> Result<String> {
        if let Some(user_id) = &self.config.chat.user_id {
            return Ok(user_id.clone());
        }

        self.guard.user_id()?.ok_or_else(|| {
            FiendError::NotLoggedIn(
                "no user id in the stored access token; run `fashionfiend login` or set chat.user_id"
                    .to_string(),
            )
            .into()
        })
    }

    /// Product cards for display, with preview images when enabled.
    pub async fn cards(&self, products: &[ProductRef]) -> Vec<ProductCard> {
        match &self.previews {
            Some(previews) => previews.enrich(products).await,
            None => plain_cards(products),
        }
    }
}
