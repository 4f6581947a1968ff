//! Inbound chat text → `Command`.

/// What a chat message asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    OpenSession,
    CloseSession,
    /// `None` when the user typed `/search` with no id.
    Search(Option<String>),
    ListSessions,
    Help,
    /// Anything that is not a slash command is treated as an order line.
    Order(String),
}

impl Command {
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        let Some(rest) = trimmed.strip_prefix('/') else {
            return Command::Order(trimmed.to_string());
        };

        let mut parts = rest.split_whitespace();
        let word = parts.next().unwrap_or("");
        // Group chats address commands as `/cmd@botname`.
        let word = word.split('@').next().unwrap_or(word);

        match word {
            "open-session" | "open_session" => Command::OpenSession,
            "close-session" | "close_session" => Command::CloseSession,
            "search" => Command::Search(parts.next().map(str::to_string)),
            "list-sessions" | "list_sessions" => Command::ListSessions,
            _ => Command::Help,
        }
    }
}
