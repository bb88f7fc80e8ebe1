//! FashionFiend - fashion recommendation chat client
//!
#![doc = "FashionFiend - fashion recommendation chat client"]
#![doc = "Main entry point for the fashionfiend CLI."]

use anyhow::Result;
use colored::Colorize;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fashionfiend::cli::{Cli, Commands};
use fashionfiend::commands::{self, AppContext};
use fashionfiend::config::Config;
use fashionfiend::error::is_session_fatal;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose, cli.json_logs);

    let result = run(cli).await;
    if let Err(e) = &result {
        if is_session_fatal(e) {
            eprintln!("Run {} to sign in again.", "fashionfiend login".cyan());
        }
    }
    result
}

async fn run(cli: Cli) -> Result<()> {
    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    let ctx = AppContext::build(config, cli.ephemeral)?;
    if cli.ephemeral {
        tracing::debug!("Using in-memory credentials");
    }

    // Execute command
    match cli.command {
        Commands::Login {
            access_token,
            refresh_token,
        } => {
            tracing::info!("Storing credentials");
            commands::session::login(&ctx, &access_token, &refresh_token)
        }
        Commands::Logout => commands::session::logout(&ctx),
        Commands::Status => commands::session::status(&ctx),
        Commands::Conversations { command } => {
            tracing::debug!("Starting conversation command");
            commands::conversations::handle_conversations(&ctx, command).await
        }
        Commands::Messages { conversation_id } => {
            commands::conversations::show_messages(&ctx, &conversation_id).await
        }
        Commands::Ask {
            question,
            conversation,
        } => {
            if let Some(c) = &conversation {
                tracing::debug!("Saving exchange to conversation: {}", c);
            }
            commands::chat::ask(&ctx, &question, conversation).await
        }
        Commands::Chat { conversation } => {
            tracing::info!("Starting interactive chat mode");
            if let Some(c) = &conversation {
                tracing::debug!("Resuming conversation: {}", c);
            }
            commands::chat::run_chat(&ctx, conversation).await
        }
        Commands::Feedback(args) => commands::conversations::submit_feedback(&ctx, args).await,
    }
}

/// Initialize tracing subscriber with environment filter
///
/// `RUST_LOG` wins when set; otherwise `--verbose` selects debug output.
/// Logs go to stderr so command output on stdout stays clean.
fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose {
        "fashionfiend=debug"
    } else {
        "fashionfiend=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
