//! Conversation history types.
//!
//! A generation run records every exchange as a [`ConversationTurn`] in an
//! append-only [`ConversationHistory`]. The history is replayed verbatim into
//! every later prompt, so insertion order is dialogue order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl fmt::Display for TurnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnRole::User => write!(f, "user"),
            TurnRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// One recorded exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

/// Append-only, ordered record of a run's turns.
///
/// Turns cannot be edited or removed once pushed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversationHistory {
    turns: Vec<ConversationTurn>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Renders the history as `ROLE: content` blocks separated by blank lines.
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(|turn| format!("{}: {}", turn.role.to_string().to_uppercase(), turn.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_empty_history() {
        assert_eq!(ConversationHistory::new().render(), "");
    }

    #[test]
    fn test_render_preserves_order() {
        let mut history = ConversationHistory::new();
        history.push(ConversationTurn::user("User intent: lint commits"));
        history.push(ConversationTurn::assistant("1. Which linter?"));
        history.push(ConversationTurn::user("Answer: commitlint"));

        assert_eq!(
            history.render(),
            "USER: User intent: lint commits\n\nASSISTANT: 1. Which linter?\n\nUSER: Answer: commitlint"
        );
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_render_is_pure() {
        let mut history = ConversationHistory::new();
        history.push(ConversationTurn::user("a"));
        assert_eq!(history.render(), history.render());
        assert_eq!(history.len(), 1);
    }
}
