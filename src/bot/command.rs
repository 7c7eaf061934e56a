//! Inbound message parsing.
//!
//! Every message is either a slash command or a candidate parade state.

/// What an inbound message asks the bot to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/print` or `/report`: send the consolidated report.
    Print,
    /// `/status`: send the submission status board.
    Status,
    /// `/clear` or `/reset`: wipe every group's state.
    Clear,
    /// `/start` or `/help`.
    Help,
    /// A slash command the bot does not know. Ignored.
    Unknown(String),
    /// A command addressed to another bot (`/print@OtherBot`). Ignored.
    OtherBot(String),
    /// Anything else; classified as a parade state.
    ParadeState(String),
}

impl Command {
    /// Parse message content.
    ///
    /// Commands are matched on the first word only, case-insensitively. A
    /// `@BotName` suffix must name `bot_username` when that is known;
    /// otherwise any suffix is accepted and dropped.
    pub fn parse(content: &str, bot_username: Option<&str>) -> Self {
        let trimmed = content.trim();
        if !trimmed.starts_with('/') {
            return Command::ParadeState(content.to_string());
        }

        let word = trimmed.split_whitespace().next().unwrap_or(trimmed);
        let (name, target) = match word.split_once('@') {
            Some((name, target)) => (name, Some(target)),
            None => (word, None),
        };

        if let (Some(target), Some(own)) = (target, bot_username) {
            if !target.eq_ignore_ascii_case(own.trim_start_matches('@')) {
                return Command::OtherBot(target.to_string());
            }
        }

        let name = name.to_lowercase();
        match name.as_str() {
            "/print" | "/report" => Command::Print,
            "/status" => Command::Status,
            "/clear" | "/reset" => Command::Clear,
            "/start" | "/help" => Command::Help,
            _ => Command::Unknown(name),
        }
    }
}
