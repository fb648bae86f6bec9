//! Special commands parser for interactive chat mode
//!
//! Special commands let the user browse backend tools, pull the combined
//! summary or moon phase on demand, toggle the periodic refresh, inspect
//! the session and leave. Commands are prefixed with `/` and are
//! case-insensitive; anything else is sent to a backend as a message.

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
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// List the tools offered by both backends
    ShowTools,

    /// Copy the sample query of the numbered tool (1-based) into the prompt
    PickTool(usize),

    /// Fetch the combined market and moon-phase summary now
    Summary,

    /// Show the current moon phase
    Moon,

    /// Start the periodic summary refresh
    StartWatch,

    /// Stop the periodic summary refresh
    StopWatch,

    /// Display session status
    ShowStatus,

    /// Clear the screen and the saved transcript
    Clear,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command
    ///
    /// The input is sent to a backend as a chat message.
    None,
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
/// use cryptomoon::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(parse_special_command("/tool 2").unwrap(), SpecialCommand::PickTool(2));
/// assert_eq!(parse_special_command("/WATCH stop").unwrap(), SpecialCommand::StopWatch);
/// assert_eq!(parse_special_command("btc price").unwrap(), SpecialCommand::None);
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if !trimmed.starts_with('/') && lower != "exit" && lower != "quit" {
        return Ok(SpecialCommand::None);
    }

    match lower.as_str() {
        "/tools" => Ok(SpecialCommand::ShowTools),

        "/tool" => Err(CommandError::MissingArgument {
            command: "/tool".to_string(),
            usage: "/tool <number>".to_string(),
        }),
        input if input.starts_with("/tool ") => {
            let arg = input[6..].trim();
            match arg.parse::<usize>() {
                Ok(n) if n > 0 => Ok(SpecialCommand::PickTool(n)),
                _ => Err(CommandError::UnsupportedArgument {
                    command: "/tool".to_string(),
                    arg: arg.to_string(),
                }),
            }
        }

        "/summary" => Ok(SpecialCommand::Summary),
        "/moon" => Ok(SpecialCommand::Moon),

        "/watch start" | "/watch on" => Ok(SpecialCommand::StartWatch),
        "/watch stop" | "/watch off" => Ok(SpecialCommand::StopWatch),
        "/watch" => Err(CommandError::MissingArgument {
            command: "/watch".to_string(),
            usage: "/watch <start|stop>".to_string(),
        }),
        input if input.starts_with("/watch ") => Err(CommandError::UnsupportedArgument {
            command: "/watch".to_string(),
            arg: input[7..].trim().to_string(),
        }),

        "/status" => Ok(SpecialCommand::ShowStatus),
        "/clear" => Ok(SpecialCommand::Clear),
        "/help" | "/?" => Ok(SpecialCommand::Help),

        "exit" | "quit" | "/exit" | "/quit" => Ok(SpecialCommand::Exit),

        input if input.starts_with('/') => {
            let cmd = input.split_whitespace().next().unwrap_or(input);
            Err(CommandError::UnknownCommand(cmd.to_string()))
        }

        _ => Ok(SpecialCommand::None),
    }
}

/// Display help text for special commands
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat
=====================================

TOOLS:
  /tools          - List tools offered by the crypto and moon backends
  /tool <n>       - Put the sample query of tool <n> into the prompt

MARKET DATA:
  /summary        - Fetch the combined market and moon-phase summary
  /moon           - Show the current moon phase (cached for a day)

PERIODIC REFRESH:
  /watch start    - Publish a fresh summary every refresh interval
  /watch stop     - Stop the periodic refresh

SESSION:
  /status         - Show backends, cache location and refresh state
  /clear          - Clear the screen and the saved transcript
  /help           - Show this help message
  /?              - Same as /help
  exit            - Exit interactive mode
  quit            - Same as exit

NOTES:
  - Commands are case-insensitive
  - Regular text (not starting with /) is sent to a backend
  - Messages mentioning the moon or lunar phases go to the moon backend
  - Everything else goes to the crypto backend
"#
    );
}
