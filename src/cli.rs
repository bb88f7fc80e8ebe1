//! Command-line interface definition for FashionFiend
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for session management, conversations, and chat.

use clap::{Args, Parser, Subcommand};

/// FashionFiend - fashion recommendation chat client
///
/// Ask for outfit advice, keep conversations, and rate answers against a
/// FashionFiend backend.
#[derive(Parser, Debug, Clone)]
#[command(name = "fashionfiend")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Override the backend base URL
    #[arg(long, global = true, env = "FASHIONFIEND_BASE_URL")]
    pub base_url: Option<String>,

    /// Keep credentials in memory only for this invocation
    #[arg(long, global = true)]
    pub ephemeral: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for FashionFiend
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Store a token pair issued by the auth service
    Login {
        /// Access token (JWT)
        #[arg(long, env = "FASHIONFIEND_ACCESS_TOKEN", hide_env_values = true)]
        access_token: String,

        /// Refresh token
        #[arg(long, env = "FASHIONFIEND_REFRESH_TOKEN", hide_env_values = true)]
        refresh_token: String,
    },

    /// Remove stored credentials
    Logout,

    /// Show the stored session state
    Status,

    /// Manage conversations
    Conversations {
        /// Conversation subcommand
        #[command(subcommand)]
        command: ConversationCommand,
    },

    /// Print the messages of a conversation
    Messages {
        /// Conversation id
        conversation_id: String,
    },

    /// Ask a single question and print the answer
    Ask {
        /// The question
        question: String,

        /// Save the exchange to this conversation
        #[arg(long)]
        conversation: Option<String>,
    },

    /// Start an interactive chat
    Chat {
        /// Continue this conversation
        #[arg(long)]
        conversation: Option<String>,
    },

    /// Rate an answer
    Feedback(FeedbackArgs),
}

/// Conversation management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConversationCommand {
    /// List conversations, most recent first
    List {
        /// Show every conversation instead of the first page
        #[arg(long)]
        all: bool,
    },

    /// Create a conversation
    Create {
        /// Display name
        name: String,
    },

    /// Delete a conversation
    Delete {
        /// Conversation id
        id: String,
    },
}

/// Arguments for `feedback`
#[derive(Args, Debug, Clone)]
pub struct FeedbackArgs {
    /// Conversation containing the message
    pub conversation_id: String,

    /// Id of the AI message being rated
    pub message_id: String,

    /// Mark the answer as helpful
    #[arg(long, conflicts_with = "down")]
    pub up: bool,

    /// Mark the answer as unhelpful
    #[arg(long)]
    pub down: bool,

    /// Free-form comment
    #[arg(long, default_value = "")]
    pub text: String,
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            json_logs: false,
            base_url: None,
            ephemeral: false,
            command: Commands::Status,
        }
    }
}
