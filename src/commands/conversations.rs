//! Conversation commands: list, create, delete, messages, feedback

use crate::api::{Conversation, Feedback, MessageId};
use crate::chat::ConversationList;
use crate::cli::{ConversationCommand, FeedbackArgs};
use crate::commands::render::print_message;
use crate::commands::AppContext;
use crate::error::{FiendError, Result};
use colored::Colorize;
use prettytable::{format, Table};
use std::sync::Arc;

/// Handle conversation subcommands
pub async fn handle_conversations(ctx: &AppContext, command: ConversationCommand) -> Result<()> {
    match command {
        ConversationCommand::List { all } => list(ctx, all).await,
        ConversationCommand::Create { name } => create(ctx, &name).await,
        ConversationCommand::Delete { id } => delete(ctx, &id).await,
    }
}

async fn list(ctx: &AppContext, all: bool) -> Result<()> {
    let user_id = ctx.user_id()?;
    let mut sidebar = ConversationList::new(
        Arc::clone(&ctx.conversations),
        ctx.config.chat.sidebar_page_size,
    );
    sidebar.refresh(&user_id).await?;
    if all {
        sidebar.show_more();
    }

    if sidebar.all().is_empty() {
        println!("{}", "No conversations found.".yellow());
        return Ok(());
    }

    println!("\nConversations:");
    conversation_table(sidebar.visible()).printstd();
    if sidebar.has_more() {
        println!(
            "Showing {} of {}. Use {} to see all.",
            sidebar.visible().len(),
            sidebar.all().len(),
            "fashionfiend conversations list --all".cyan()
        );
    }
    println!();
    Ok(())
}

/// Table of conversations, one row each.
pub fn conversation_table(conversations: &[Conversation]) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(prettytable::row![
        "ID".bold(),
        "Name".bold(),
        "Created".bold()
    ]);

    for conversation in conversations {
        let name = if conversation.name.chars().count() > 40 {
            let short: String = conversation.name.chars().take(37).collect();
            format!("{}...", short)
        } else {
            conversation.name.clone()
        };
        let created = conversation.created_at.as_deref().unwrap_or("-");
        table.add_row(prettytable::row![conversation.id.cyan(), name, created]);
    }
    table
}

async fn create(ctx: &AppContext, name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(FiendError::InvalidInput("conversation name must not be empty".to_string()).into());
    }

    let user_id = ctx.user_id()?;
    let conversation = ctx.conversations.create(&user_id, name).await?;
    tracing::info!("Created conversation {}", conversation.id);
    println!(
        "{} {}",
        "Created conversation".green(),
        conversation.id.cyan()
    );
    Ok(())
}

async fn delete(ctx: &AppContext, id: &str) -> Result<()> {
    let user_id = ctx.user_id()?;
    let mut sidebar = ConversationList::new(
        Arc::clone(&ctx.conversations),
        ctx.config.chat.sidebar_page_size,
    );
    sidebar.delete(&user_id, id).await?;
    println!("{}", format!("Deleted conversation {}", id).green());
    Ok(())
}

/// Print the messages of a conversation
pub async fn show_messages(ctx: &AppContext, conversation_id: &str) -> Result<()> {
    let messages = ctx.conversations.list_messages(conversation_id).await?;
    if messages.is_empty() {
        println!("{}", "No messages yet.".yellow());
        return Ok(());
    }

    for message in &messages {
        let cards = ctx.cards(&message.content.products).await;
        print_message(message, &cards);
    }
    Ok(())
}

/// Feedback described by the `feedback` arguments.
pub fn feedback_from_args(args: &FeedbackArgs) -> Feedback {
    Feedback {
        upvote: args.up,
        downvote: args.down,
        text: args.text.clone(),
    }
}

/// Message id as typed on the command line. Client-generated ids are
/// numeric and are sent back as numbers.
pub fn parse_message_id(raw: &str) -> MessageId {
    match raw.parse::<i64>() {
        Ok(n) => MessageId::Number(n),
        Err(_) => MessageId::from(raw),
    }
}

/// Rate an answer
pub async fn submit_feedback(ctx: &AppContext, args: FeedbackArgs) -> Result<()> {
    let feedback = feedback_from_args(&args);
    let message_id = parse_message_id(&args.message_id);
    ctx.conversations
        .submit_feedback(&args.conversation_id, &message_id, &feedback)
        .await?;
    println!("{}", "Feedback recorded".green());
    Ok(())
}
