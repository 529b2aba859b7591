//! Special commands parser for interactive chat mode
//!
//! Special commands manage the chat list without leaving the session:
//! - Start, list, open, search, rename, and delete chats
//! - Show or set the location attached to messages
//! - Display help information
//! - Exit the session
//!
//! Commands are prefixed with `/`. The command word is case-insensitive;
//! arguments (IDs, titles, queries) are kept as typed.

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

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during interactive chat
///
/// These commands act on the chat list or session rather than being sent
/// to the assistant.
#[derive(Debug, Clone, PartialEq)]
pub enum SpecialCommand {
    /// Leave the active chat; the next message starts a new one
    NewChat,

    /// Show the chat list
    ListChats,

    /// Make a chat active, loading its history if needed
    Open(String),

    /// List chats matching a query
    Search(String),

    /// Open the first chat matching a query
    Find(String),

    /// Rename a chat; without a title the REPL prompts for one
    Rename { id: String, title: Option<String> },

    /// Delete a chat after confirmation
    Delete(String),

    /// Show the location attached to messages
    ShowLocation,

    /// Enable location from coordinates
    SetLocation { latitude: f64, longitude: f64 },

    /// Stop attaching a location and clear the saved one
    ClearLocation,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command
    ///
    /// The input should be sent to the assistant as a message.
    None,
}

fn missing(command: &str, usage: &str) -> CommandError {
    CommandError::MissingArgument {
        command: command.to_string(),
        usage: usage.to_string(),
    }
}

fn required_arg(command: &str, rest: &str, usage: &str) -> Result<String, CommandError> {
    if rest.is_empty() {
        Err(missing(command, usage))
    } else {
        Ok(rest.to_string())
    }
}

fn parse_coordinate(command: &str, raw: &str, range: f64) -> Result<f64, CommandError> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && v.abs() <= range)
        .ok_or_else(|| CommandError::UnsupportedArgument {
            command: command.to_string(),
            arg: raw.to_string(),
        })
}

/// Parse a user input string into a special command
///
/// # Errors
///
/// Returns CommandError::UnknownCommand if input starts with "/" but is not a valid command.
/// Returns CommandError::UnsupportedArgument if a command receives an invalid argument.
/// Returns CommandError::MissingArgument if a command requires an argument but none was provided.
///
/// # Examples
///
/// ```
/// use chatai::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// let cmd = parse_special_command("/rename 65f0 Weekend trip").unwrap();
/// assert_eq!(
///     cmd,
///     SpecialCommand::Rename {
///         id: "65f0".to_string(),
///         title: Some("Weekend trip".to_string())
///     }
/// );
///
/// let cmd = parse_special_command("coffee near me").unwrap();
/// assert_eq!(cmd, SpecialCommand::None);
///
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if lower == "exit" || lower == "quit" {
        return Ok(SpecialCommand::Exit);
    }
    if !trimmed.starts_with('/') {
        return Ok(SpecialCommand::None);
    }

    let (word, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((word, rest)) => (word.to_lowercase(), rest.trim()),
        None => (lower.clone(), ""),
    };

    match word.as_str() {
        "/new" => Ok(SpecialCommand::NewChat),
        "/chats" | "/list" => Ok(SpecialCommand::ListChats),
        "/open" => required_arg("/open", rest, "/open <chat-id>").map(SpecialCommand::Open),
        "/search" => required_arg("/search", rest, "/search <text>").map(SpecialCommand::Search),
        "/find" => required_arg("/find", rest, "/find <text>").map(SpecialCommand::Find),
        "/delete" => {
            required_arg("/delete", rest, "/delete <chat-id>").map(SpecialCommand::Delete)
        }
        "/rename" => {
            let usage = "/rename <chat-id> [new title]";
            let (id, title) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            if id.is_empty() {
                return Err(missing("/rename", usage));
            }
            let title = Some(title.trim())
                .filter(|t| !t.is_empty())
                .map(str::to_string);
            Ok(SpecialCommand::Rename {
                id: id.to_string(),
                title,
            })
        }
        "/location" => {
            let args: Vec<&str> = rest.split_whitespace().collect();
            match args.as_slice() {
                [] => Ok(SpecialCommand::ShowLocation),
                [arg] if arg.eq_ignore_ascii_case("off") || arg.eq_ignore_ascii_case("clear") => {
                    Ok(SpecialCommand::ClearLocation)
                }
                [lat, lon] => Ok(SpecialCommand::SetLocation {
                    latitude: parse_coordinate("/location", lat, 90.0)?,
                    longitude: parse_coordinate("/location", lon, 180.0)?,
                }),
                _ => Err(CommandError::UnsupportedArgument {
                    command: "/location".to_string(),
                    arg: rest.to_string(),
                }),
            }
        }
        "/help" | "/?" => Ok(SpecialCommand::Help),
        "/exit" | "/quit" => Ok(SpecialCommand::Exit),
        _ => Err(CommandError::UnknownCommand(trimmed.to_string())),
    }
}

/// Print help for special commands
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat Mode
===========================================

CHATS:
  /new                 - Start a new chat with your next message
  /chats               - List chats, most recently updated first
  /open <id>           - Open a chat
  /search <text>       - List chats whose title or messages contain text
  /find <text>         - Open the first chat matching text
  /rename <id> [title] - Rename a chat (prompts when no title is given)
  /delete <id>         - Delete a chat (asks for confirmation)

LOCATION:
  /location            - Show the location attached to messages
  /location <lat> <lon> - Enable location from coordinates
  /location off        - Stop sharing and clear the saved location

SESSION CONTROL:
  /help                - Show this help message
  /?                   - Same as /help
  exit                 - Exit interactive mode
  quit                 - Same as exit

NOTES:
  - Command names are case-insensitive
  - Regular text (not starting with /) is sent to the assistant
  - Chat IDs are shown by /chats
"#
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_text_is_not_a_command() {
        assert_eq!(
            parse_special_command("best tacos nearby").unwrap(),
            SpecialCommand::None
        );
    }

    #[test]
    fn test_parse_exit_aliases() {
        for input in ["exit", "QUIT", "/exit", "/quit"] {
            assert_eq!(parse_special_command(input).unwrap(), SpecialCommand::Exit);
        }
    }

    #[test]
    fn test_parse_new_and_list() {
        assert_eq!(
            parse_special_command("/NEW").unwrap(),
            SpecialCommand::NewChat
        );
        assert_eq!(
            parse_special_command("/chats").unwrap(),
            SpecialCommand::ListChats
        );
    }

    #[test]
    fn test_parse_open_keeps_id_case() {
        assert_eq!(
            parse_special_command("/open 65F0ab").unwrap(),
            SpecialCommand::Open("65F0ab".to_string())
        );
    }

    #[test]
    fn test_parse_open_missing_id() {
        assert!(matches!(
            parse_special_command("/open"),
            Err(CommandError::MissingArgument { .. })
        ));
    }

    #[test]
    fn test_parse_search_keeps_spaces() {
        assert_eq!(
            parse_special_command("/search  Coffee Shops ").unwrap(),
            SpecialCommand::Search("Coffee Shops".to_string())
        );
    }

    #[test]
    fn test_parse_rename_requires_id() {
        assert!(parse_special_command("/rename").is_err());
        assert!(parse_special_command("/rename   ").is_err());
    }

    #[test]
    fn test_parse_rename_without_title_opens_editor() {
        assert_eq!(
            parse_special_command("/rename abc").unwrap(),
            SpecialCommand::Rename {
                id: "abc".to_string(),
                title: None
            }
        );
        assert_eq!(
            parse_special_command("/rename abc   Trip  plans ").unwrap(),
            SpecialCommand::Rename {
                id: "abc".to_string(),
                title: Some("Trip  plans".to_string())
            }
        );
    }

    #[test]
    fn test_parse_location_variants() {
        assert_eq!(
            parse_special_command("/location").unwrap(),
            SpecialCommand::ShowLocation
        );
        assert_eq!(
            parse_special_command("/location off").unwrap(),
            SpecialCommand::ClearLocation
        );
        assert_eq!(
            parse_special_command("/location 40.7 -74.0").unwrap(),
            SpecialCommand::SetLocation {
                latitude: 40.7,
                longitude: -74.0
            }
        );
    }

    #[test]
    fn test_parse_location_rejects_out_of_range() {
        assert!(matches!(
            parse_special_command("/location 91 0"),
            Err(CommandError::UnsupportedArgument { .. })
        ));
        assert!(parse_special_command("/location north").is_err());
    }

    #[test]
    fn test_parse_unknown_command() {
        assert_eq!(
            parse_special_command("/foo bar"),
            Err(CommandError::UnknownCommand("/foo bar".to_string()))
        );
    }
}
