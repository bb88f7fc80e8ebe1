//! FashionFiend - fashion recommendation chat client library
//!
//! This library provides the client side of the FashionFiend service:
//! credential persistence with transparent token refresh, the conversation
//! and recommendation gateways, and the chat state built on top of them.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `session`: credential store, JWT claims, token refresh and the session guard
//! - `api`: HTTP gateways for conversations, recommendations and product previews
//! - `chat`: chat transcript and conversation list state
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//! - `commands`: CLI command handlers
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use fashionfiend::commands::AppContext;
//! use fashionfiend::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let ctx = AppContext::build(config, false)?;
//!     let user_id = ctx.user_id()?;
//!     for conversation in ctx.conversations.list(&user_id).await? {
//!         println!("{} {}", conversation.id, conversation.name);
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod chat;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod session;

// Re-export commonly used types
pub use api::{ConversationClient, RecommendationClient};
pub use chat::{ChatSession, ConversationList};
pub use config::Config;
pub use error::{ApiError, AuthError, CredentialError, FiendError, Result};
pub use session::{CredentialStore, SessionGuard};
