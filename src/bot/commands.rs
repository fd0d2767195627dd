use std::borrow::Cow;
use teloxide::utils::command::BotCommands;

/// Supported commands for the bot
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    /// Show the rule selection menu
    #[command(description = "Pick a rule and show its latest blocked requests.")]
    Rules,
    /// Show the command list
    #[command(description = "Show this help.")]
    Help,
}

/// Parse `text` as a bot command, honoring `@username` addressing.
///
/// With an empty `bot_username` any `@suffix` is accepted, since there is
/// no name to compare it against.
#[must_use]
pub fn parse_command(text: &str, bot_username: &str) -> Option<Command> {
    let text = if bot_username.is_empty() {
        strip_addressee(text)
    } else {
        Cow::Borrowed(text)
    };
    Command::parse(&text, bot_username).ok()
}

/// Drop the `@name` part of the leading command word.
fn strip_addressee(text: &str) -> Cow<'_, str> {
    let end = text.find(char::is_whitespace).unwrap_or(text.len());
    match text[..end].find('@') {
        Some(at) => Cow::Owned(format!("{}{}", &text[..at], &text[end..])),
        None => Cow::Borrowed(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("/rules", ""), Some(Command::Rules));
        assert_eq!(parse_command("/help", ""), Some(Command::Help));
        assert_eq!(parse_command("/rules@waf_bot", "waf_bot"), Some(Command::Rules));
        assert_eq!(parse_command("/rules@other_bot", "waf_bot"), None);
        assert_eq!(parse_command("rules", ""), None);
        assert_eq!(parse_command("/unknown", ""), None);
    }

    #[test]
    fn test_addressed_command_without_known_username() {
        assert_eq!(parse_command("/rules@waf_bot", ""), Some(Command::Rules));
        assert_eq!(parse_command("/help@WAF_Bot", ""), Some(Command::Help));
        assert_eq!(parse_command("/unknown@waf_bot", ""), None);
        assert_eq!(parse_command("mail me@example.com", ""), None);
    }

    #[test]
    fn test_help_lists_commands() {
        let help = Command::descriptions().to_string();
        assert!(help.contains("/rules"));
        assert!(help.contains("/help"));
    }
}
