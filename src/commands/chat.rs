//! Chat commands: `ask` and the interactive loop
//!
//! Both run a [`ChatSession`]. With `--conversation` the session is bound
//! to a saved conversation and every question and answer is also posted
//! to it; otherwise nothing is persisted and no login is needed.

use crate::api::{plain_cards, Feedback, Message, Role};
use crate::chat::{ChatSession, ConversationList};
use crate::commands::conversations::conversation_table;
use crate::commands::render::print_message;
use crate::commands::special_commands::{parse_special_command, print_help, SpecialCommand};
use crate::commands::AppContext;
use crate::error::{is_session_fatal, FiendError, Result};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::sync::Arc;

/// Opens a chat session, bound to `conversation` when one is given.
///
/// A bound session needs a usable login, which is checked up front so an
/// expired session fails before the first question rather than on save.
async fn open_session(ctx: &AppContext, conversation: Option<String>) -> Result<ChatSession> {
    match conversation {
        Some(conversation_id) => {
            ctx.guard.ensure_valid_access_token().await?;
            Ok(ChatSession::bound(
                Arc::clone(&ctx.recommendations),
                conversation_id,
                Arc::clone(&ctx.conversations),
            ))
        }
        None => Ok(ChatSession::new(Arc::clone(&ctx.recommendations))),
    }
}

/// Ask a single question and print the answer
///
/// # Errors
///
/// Returns error for a blank question, or when a conversation is given and
/// the session cannot be authenticated
pub async fn ask(ctx: &AppContext, question: &str, conversation: Option<String>) -> Result<()> {
    if question.trim().is_empty() {
        return Err(FiendError::InvalidInput("question must not be empty".to_string()).into());
    }

    let session = open_session(ctx, conversation).await?;
    let Some(pending) = session.submit(question) else {
        return Err(FiendError::InvalidInput("question must not be empty".to_string()).into());
    };

    let reply = pending
        .wait()
        .await
        .ok_or_else(|| anyhow::anyhow!("chat session closed before the answer arrived"))?;
    let cards = ctx.cards(&reply.content.products).await;
    print_message(&reply, &cards);

    session.settle().await;
    Ok(())
}

/// Start interactive chat
///
/// # Errors
///
/// Returns error if the session cannot be opened, history cannot be
/// loaded, or the line editor cannot be created
pub async fn run_chat(ctx: &AppContext, conversation: Option<String>) -> Result<()> {
    let session = open_session(ctx, conversation).await?;
    let loaded = session.load_history().await?;

    let mut rl = DefaultEditor::new()?;
    let mut sidebar: Option<ConversationList> = None;

    print_welcome_banner(session.conversation_id(), loaded);
    for message in session.messages() {
        print_message(&message, &plain_cards(&message.content.products));
    }

    loop {
        let prompt = format!("{} ", "you>".cyan().bold());
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                match parse_special_command(trimmed) {
                    Ok(SpecialCommand::None) => {}
                    Ok(SpecialCommand::Help) => {
                        print_help();
                        continue;
                    }
                    Ok(SpecialCommand::History) => {
                        for message in session.messages() {
                            print_message(&message, &plain_cards(&message.content.products));
                        }
                        continue;
                    }
                    Ok(SpecialCommand::Conversations) => {
                        if let Err(e) = show_conversations(ctx, &mut sidebar).await {
                            report(&e);
                        }
                        continue;
                    }
                    Ok(SpecialCommand::ShowMore) => {
                        page_conversations(&mut sidebar, true);
                        continue;
                    }
                    Ok(SpecialCommand::ShowLess) => {
                        page_conversations(&mut sidebar, false);
                        continue;
                    }
                    Ok(SpecialCommand::Rate { upvote, text }) => {
                        if let Err(e) = rate_last_answer(ctx, &session, upvote, text).await {
                            report(&e);
                        }
                        continue;
                    }
                    Ok(SpecialCommand::Exit) => break,
                    Err(e) => {
                        eprintln!("{}", e.to_string().red());
                        continue;
                    }
                }

                let Some(pending) = session.submit(trimmed) else {
                    continue;
                };
                match pending.wait().await {
                    Some(reply) => {
                        let cards = ctx.cards(&reply.content.products).await;
                        print_message(&reply, &cards);
                    }
                    None => break,
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                tracing::error!("Readline error: {:?}", err);
                break;
            }
        }
    }

    session.settle().await;
    session.close();
    println!("Goodbye!");
    Ok(())
}

fn print_welcome_banner(conversation_id: Option<&str>, loaded: usize) {
    println!("\n{}", "FashionFiend chat".magenta().bold());
    match conversation_id {
        Some(id) => println!(
            "Conversation: {} ({} earlier messages)",
            id.cyan(),
            loaded
        ),
        None => println!("Conversation: {}", "unsaved".dimmed()),
    }
    println!("Type '/help' for available commands, 'exit' to quit\n");
}

fn report(error: &anyhow::Error) {
    eprintln!("{}", error.to_string().red());
    if is_session_fatal(error) {
        eprintln!("Run {} to sign in again.", "fashionfiend login".cyan());
    }
}

async fn show_conversations(ctx: &AppContext, sidebar: &mut Option<ConversationList>) -> Result<()> {
    let user_id = ctx.user_id()?;
    let list = sidebar.get_or_insert_with(|| {
        ConversationList::new(
            Arc::clone(&ctx.conversations),
            ctx.config.chat.sidebar_page_size,
        )
    });
    list.refresh(&user_id).await?;
    print_sidebar(list);
    Ok(())
}

fn page_conversations(sidebar: &mut Option<ConversationList>, expand: bool) {
    match sidebar {
        Some(list) => {
            if expand {
                list.show_more();
            } else {
                list.show_less();
            }
            print_sidebar(list);
        }
        None => println!("{}", "Use /conversations to load the list first.".yellow()),
    }
}

fn print_sidebar(list: &ConversationList) {
    if list.all().is_empty() {
        println!("{}", "No conversations found.".yellow());
        return;
    }
    conversation_table(list.visible()).printstd();
    if list.has_more() {
        println!("{} more, type /more to show all", list.all().len() - list.visible().len());
    } else if list.is_expanded() {
        println!("Type /less to collapse");
    }
    println!();
}

/// Most recent AI message in a transcript.
fn last_answer(messages: &[Message]) -> Option<&Message> {
    messages.iter().rev().find(|m| m.role == Role::Ai)
}

async fn rate_last_answer(
    ctx: &AppContext,
    session: &ChatSession,
    upvote: bool,
    text: String,
) -> Result<()> {
    let Some(conversation_id) = session.conversation_id() else {
        return Err(FiendError::InvalidInput(
            "ratings are saved with a conversation; start chat with --conversation".to_string(),
        )
        .into());
    };

    session.settle().await;
    let messages = session.messages();
    let Some(answer) = last_answer(&messages) else {
        return Err(FiendError::InvalidInput("there is no answer to rate yet".to_string()).into());
    };
    let Some(message_id) = session.saved_id(answer) else {
        return Err(FiendError::InvalidInput(
            "the last answer was not saved to the conversation, so it cannot be rated".to_string(),
        )
        .into());
    };

    let feedback = if upvote {
        Feedback::upvote(text)
    } else {
        Feedback::downvote(text)
    };
    ctx.conversations
        .submit_feedback(conversation_id, &message_id, &feedback)
        .await?;
    println!("{}", "Thanks for the feedback".green());
    Ok(())
}
