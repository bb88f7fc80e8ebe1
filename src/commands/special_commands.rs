//! Special commands parser for interactive chat mode
//!
//! Special commands are entered at the chat prompt instead of a question.
//! They are prefixed with `/` and are case-insensitive; `exit` and `quit`
//! also work without the prefix.

use colored::Colorize;
use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },
}

/// Special commands that can be executed during interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Display help information
    Help,

    /// Reprint the transcript of this session
    History,

    /// Show the conversation list
    Conversations,

    /// Show every conversation in the list
    ShowMore,

    /// Collapse the conversation list to its first page
    ShowLess,

    /// Rate the most recent answer
    ///
    /// `/up [comment]` or `/down [comment]`.
    Rate { upvote: bool, text: String },

    /// Exit the interactive session
    Exit,

    /// Not a special command
    ///
    /// The input should be sent as a question.
    None,
}

/// Parse a user input string into a special command
///
/// # Errors
///
/// Returns `CommandError::UnknownCommand` if input starts with "/" but is
/// not a valid command, and `CommandError::UnsupportedArgument` if a
/// command that takes no argument is given one.
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if !trimmed.starts_with('/') && lower != "exit" && lower != "quit" {
        return Ok(SpecialCommand::None);
    }

    let (head, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (trimmed, ""),
    };
    let command = head.to_lowercase();

    let no_argument = |cmd: SpecialCommand| {
        if rest.is_empty() {
            Ok(cmd)
        } else {
            Err(CommandError::UnsupportedArgument {
                command: command.clone(),
                arg: rest.to_string(),
            })
        }
    };

    match command.as_str() {
        "/help" | "/?" => no_argument(SpecialCommand::Help),
        "/history" => no_argument(SpecialCommand::History),
        "/conversations" | "/convs" => no_argument(SpecialCommand::Conversations),
        "/more" => no_argument(SpecialCommand::ShowMore),
        "/less" => no_argument(SpecialCommand::ShowLess),
        "/up" => Ok(SpecialCommand::Rate {
            upvote: true,
            text: rest.to_string(),
        }),
        "/down" => Ok(SpecialCommand::Rate {
            upvote: false,
            text: rest.to_string(),
        }),
        "/exit" | "/quit" | "exit" | "quit" => no_argument(SpecialCommand::Exit),
        _ => Err(CommandError::UnknownCommand(trimmed.to_string())),
    }
}

/// Print help for the special commands
pub fn print_help() {
    println!("{}", "Chat commands:".bold());
    println!("  {}            Show this help", "/help".cyan());
    println!("  {}         Reprint this session's messages", "/history".cyan());
    println!("  {}   List your conversations", "/conversations".cyan());
    println!("  {} / {}     Show all or only the first page", "/more".cyan(), "/less".cyan());
    println!("  {} [comment]   Rate the last answer as helpful", "/up".cyan());
    println!("  {} [comment] Rate the last answer as unhelpful", "/down".cyan());
    println!("  {}            Leave the chat (also: exit, quit)", "/exit".cyan());
    println!();
    println!("Anything else is sent as a question.");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert_eq!(
            parse_special_command("what shoes go with a navy suit?").unwrap(),
            SpecialCommand::None
        );
    }

    #[test]
    fn test_exit_aliases() {
        for input in ["/exit", "/quit", "exit", "QUIT", "  /Exit  "] {
            assert_eq!(parse_special_command(input).unwrap(), SpecialCommand::Exit);
        }
    }

    #[test]
    fn test_help_and_history() {
        assert_eq!(parse_special_command("/help").unwrap(), SpecialCommand::Help);
        assert_eq!(parse_special_command("/?").unwrap(), SpecialCommand::Help);
        assert_eq!(
            parse_special_command("/HISTORY").unwrap(),
            SpecialCommand::History
        );
    }

    #[test]
    fn test_rate_keeps_comment_case() {
        assert_eq!(
            parse_special_command("/down Too Formal for a picnic").unwrap(),
            SpecialCommand::Rate {
                upvote: false,
                text: "Too Formal for a picnic".to_string()
            }
        );
        assert_eq!(
            parse_special_command("/up").unwrap(),
            SpecialCommand::Rate {
                upvote: true,
                text: String::new()
            }
        );
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            parse_special_command("/dance"),
            Err(CommandError::UnknownCommand("/dance".to_string()))
        );
    }

    #[test]
    fn test_argument_on_bare_command() {
        assert_eq!(
            parse_special_command("/history all"),
            Err(CommandError::UnsupportedArgument {
                command: "/history".to_string(),
                arg: "all".to_string()
            })
        );
    }
}
