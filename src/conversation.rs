//! Conversation history for a game session
//!
//! The history is an ordered list of tagged turns. Every session starts
//! with the scenario's opening narration as an assistant turn, so the
//! list is never empty and the first turn is always the narrator's.

use serde::{Deserialize, Serialize};

/// Speaker labels used when rendering a transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakerLabels {
    /// Label for the player's turns
    #[serde(default = "default_player_label")]
    pub player: String,

    /// Label for the narrator's turns
    #[serde(default = "default_narrator_label")]
    pub narrator: String,
}

fn default_player_label() -> String {
    "Player".to_string()
}

fn default_narrator_label() -> String {
    "Game Master".to_string()
}

impl Default for SpeakerLabels {
    fn default() -> Self {
        Self {
            player: default_player_label(),
            narrator: default_narrator_label(),
        }
    }
}

/// A single turn in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "speaker", content = "text", rename_all = "lowercase")]
pub enum Turn {
    /// Something the player typed or said
    User(String),

    /// A narrator reply from the game master model
    Assistant(String),
}

impl Turn {
    /// The turn's text content
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::User(text) | Self::Assistant(text) => text,
        }
    }

    /// Chat API role for this turn
    #[must_use]
    pub const fn role(&self) -> &'static str {
        match self {
            Self::User(_) => "user",
            Self::Assistant(_) => "assistant",
        }
    }

    /// Whether this turn came from the narrator
    #[must_use]
    pub const fn is_assistant(&self) -> bool {
        matches!(self, Self::Assistant(_))
    }
}

/// Ordered turn history, seeded with an opening narration
#[derive(Debug, Clone)]
pub struct Conversation {
    opening: String,
    turns: Vec<Turn>,
}

impl Conversation {
    /// Create a conversation seeded with the opening narration
    #[must_use]
    pub fn new(opening: impl Into<String>) -> Self {
        let opening = opening.into();
        let turns = vec![Turn::Assistant(opening.clone())];
        Self { opening, turns }
    }

    /// Append a player turn
    pub fn push_user(&mut self, text: impl Into<String>) {
        self.turns.push(Turn::User(text.into()));
    }

    /// Append a narrator turn
    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.turns.push(Turn::Assistant(text.into()));
    }

    /// Drop all history and re-seed with the opening narration
    pub fn restart(&mut self) {
        self.turns.clear();
        self.turns.push(Turn::Assistant(self.opening.clone()));
    }

    /// All turns in order
    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Number of turns
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether the history is empty (never true after construction)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The most recent narrator reply, if any
    #[must_use]
    pub fn last_reply(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|turn| turn.is_assistant())
            .map(Turn::text)
    }

    /// Serialize the history as a plain-text log
    ///
    /// Each turn becomes a `<Speaker>: <text>` block; blocks are joined
    /// by blank lines.
    #[must_use]
    pub fn transcript(&self, labels: &SpeakerLabels) -> String {
        self.turns
            .iter()
            .map(|turn| {
                let label = if turn.is_assistant() {
                    &labels.narrator
                } else {
                    &labels.player
                };
                format!("{label}: {}", turn.text())
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
