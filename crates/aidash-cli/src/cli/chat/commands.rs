//! Slash command parsing for the chat loop.
//!
//! Commands start with `/` and control the session instead of being sent to
//! the project backend.

use console::style;

/// Number of messages `/history` shows when no count is given.
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Available slash commands in the chat loop.
#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    /// Show available commands.
    Help,
    /// Clear the terminal screen.
    Clear,
    /// Exit the chat session.
    Exit,
    /// Show the last N messages of this project's history.
    History(usize),
    /// Delete this project's stored history.
    Reset,
    /// Upload a document; it is attached to the next message.
    Upload(String),
    /// Stop the reply being streamed.
    Cancel,
    /// Unknown command, or a known one used wrongly.
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input doesn't start with `/`.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let parts: Vec<&str> = trimmed.splitn(2, ' ').collect();
    let cmd = parts[0].to_lowercase();
    let arg = parts
        .get(1)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty());

    match cmd.as_str() {
        "/help" | "/h" | "/?" => Some(ChatCommand::Help),
        "/clear" | "/cls" => Some(ChatCommand::Clear),
        "/exit" | "/quit" | "/q" => Some(ChatCommand::Exit),
        "/history" => match arg.map(str::parse::<usize>) {
            None => Some(ChatCommand::History(DEFAULT_HISTORY_LIMIT)),
            Some(Ok(n)) if n > 0 => Some(ChatCommand::History(n)),
            Some(_) => Some(ChatCommand::Unknown(
                "/history takes a positive number".to_string(),
            )),
        },
        "/reset" => Some(ChatCommand::Reset),
        "/upload" | "/up" => match arg {
            Some(path) => Some(ChatCommand::Upload(unquote(path).to_string())),
            None => Some(ChatCommand::Unknown("/upload requires a file path".to_string())),
        },
        "/cancel" | "/stop" => Some(ChatCommand::Cancel),
        other => Some(ChatCommand::Unknown(other.to_string())),
    }
}

fn unquote(path: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = path
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    path
}

/// Help text listing the available commands.
pub fn help_text(uploads_enabled: bool) -> String {
    let mut rows = vec![
        ("/help", "Show this help message"),
        ("/clear", "Clear the screen"),
        ("/exit", "End the chat session"),
        ("/history [n]", "Show the last n messages (default 20)"),
        ("/reset", "Delete this project's history"),
    ];
    if uploads_enabled {
        rows.push(("/upload <path>", "Upload a document and attach it to your next message"));
    }

    let mut text = format!("\n  {}\n\n", style("Available commands:").bold());
    for (command, description) in rows {
        text.push_str(&format!("  {}  {description}\n", style(format!("{command:<14}")).cyan()));
    }
    text.push_str(&format!(
        "\n  {}\n",
        style("Ctrl+C or /cancel stops a streaming reply, Ctrl+D exits").dim()
    ));
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_help() {
        assert_eq!(parse("/help"), Some(ChatCommand::Help));
        assert_eq!(parse("/h"), Some(ChatCommand::Help));
        assert_eq!(parse("/?"), Some(ChatCommand::Help));
    }

    #[test]
    fn test_parse_exit() {
        assert_eq!(parse("/exit"), Some(ChatCommand::Exit));
        assert_eq!(parse("/QUIT"), Some(ChatCommand::Exit));
        assert_eq!(parse("/q"), Some(ChatCommand::Exit));
    }

    #[test]
    fn test_parse_history_limit() {
        assert_eq!(parse("/history"), Some(ChatCommand::History(DEFAULT_HISTORY_LIMIT)));
        assert_eq!(parse("/history 5"), Some(ChatCommand::History(5)));
        assert!(matches!(parse("/history 0"), Some(ChatCommand::Unknown(_))));
        assert!(matches!(parse("/history lots"), Some(ChatCommand::Unknown(_))));
    }

    #[test]
    fn test_parse_upload_keeps_spaces_and_strips_quotes() {
        assert_eq!(
            parse("/upload ~/docs/my notes.pdf"),
            Some(ChatCommand::Upload("~/docs/my notes.pdf".to_string()))
        );
        assert_eq!(
            parse("/upload \"a b.txt\""),
            Some(ChatCommand::Upload("a b.txt".to_string()))
        );
        assert_eq!(
            parse("/upload   "),
            Some(ChatCommand::Unknown("/upload requires a file path".to_string()))
        );
    }

    #[test]
    fn test_parse_reset_and_cancel() {
        assert_eq!(parse("/reset"), Some(ChatCommand::Reset));
        assert_eq!(parse("/cancel"), Some(ChatCommand::Cancel));
        assert_eq!(parse("/stop"), Some(ChatCommand::Cancel));
    }

    #[test]
    fn test_help_text_lists_upload_only_when_enabled() {
        assert!(help_text(true).contains("/upload"));
        assert!(!help_text(false).contains("/upload"));
        assert!(help_text(false).contains("/reset"));
    }

    #[test]
    fn test_parse_not_command() {
        assert_eq!(parse("hello world"), None);
        assert_eq!(parse("what does a/b mean"), None);
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(parse("/foo"), Some(ChatCommand::Unknown("/foo".to_string())));
    }
}
