//! Game session orchestration
//!
//! A [`GameSession`] ties one scenario to one conversation and one chat
//! backend. It is the only place player turns enter the history, so the
//! ordering rules live here: the player's turn is recorded before the
//! narrator is asked for a reply, and a failed request leaves that turn
//! in place. No retry, no rollback.

use std::path::Path;
use std::sync::Arc;

use uuid::Uuid;

use crate::chat::ChatProvider;
use crate::conversation::Conversation;
use crate::options::extract_options;
use crate::scenario::Scenario;
use crate::{Error, Result};

/// Default filename for exported transcripts
pub const DEFAULT_EXPORT_FILENAME: &str = "chat-export.txt";

/// A narrator reply plus any numbered options it offered
#[derive(Debug, Clone, serde::Serialize)]
pub struct SessionReply {
    /// Full reply text
    pub reply: String,

    /// Choices extracted from numbered lines, in order of appearance
    pub options: Vec<String>,
}

/// One running game
pub struct GameSession {
    id: Uuid,
    scenario: Scenario,
    conversation: Conversation,
    chat: Arc<dyn ChatProvider>,
}

impl GameSession {
    /// Start a session, seeding the history with the scenario's opening
    #[must_use]
    pub fn new(scenario: Scenario, chat: Arc<dyn ChatProvider>) -> Self {
        let conversation = Conversation::new(scenario.opening());

        tracing::info!(
            scenario = %scenario.id,
            backend = chat.name(),
            "session started"
        );

        Self {
            id: Uuid::new_v4(),
            scenario,
            conversation,
            chat,
        }
    }

    /// Session identifier
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// The scenario this session is playing
    #[must_use]
    pub const fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    /// The conversation so far
    #[must_use]
    pub const fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// The most recent narrator reply
    #[must_use]
    pub fn last_reply(&self) -> Option<&str> {
        self.conversation.last_reply()
    }

    /// Send a player message and return the narrator's reply
    ///
    /// The message is trimmed first; an empty result is rejected without
    /// touching the history. Otherwise the player turn is appended, the
    /// chat backend is asked once, and its reply is appended on success.
    ///
    /// # Errors
    ///
    /// Returns error if the message is empty or the backend fails. On
    /// backend failure the player turn remains in the history.
    pub async fn send(&mut self, message: &str) -> Result<SessionReply> {
        let message = message.trim();
        if message.is_empty() {
            return Err(Error::Chat("empty message".to_string()));
        }

        self.conversation.push_user(message);

        let reply = self
            .chat
            .complete(self.scenario.system_prompt(), self.conversation.turns())
            .await?;

        self.conversation.push_assistant(reply.clone());

        let options = extract_options(&reply);
        tracing::debug!(
            turns = self.conversation.len(),
            options = options.len(),
            "narrator replied"
        );

        Ok(SessionReply { reply, options })
    }

    /// Restart the game, keeping only a fresh opening narration
    pub fn restart(&mut self) {
        self.conversation.restart();
        tracing::info!(scenario = %self.scenario.id, "session restarted");
    }

    /// Render the conversation as a plain-text transcript
    #[must_use]
    pub fn transcript(&self) -> String {
        self.conversation.transcript(&self.scenario.labels)
    }

    /// Write the transcript to a file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written
    pub fn export_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.transcript())?;
        tracing::info!(path = %path.display(), "transcript exported");
        Ok(())
    }

    /// Build an image prompt for the current scene
    ///
    /// Returns `None` before the narrator has said anything (never the
    /// case in practice, since the opening seeds the history).
    #[must_use]
    pub fn scene_prompt(&self) -> Option<String> {
        self.last_reply()
            .map(|reply| self.scenario.image_prompt(reply))
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::conversation::Turn;

    /// Replies with a fixed script, one entry per call
    struct ScriptedChat {
        replies: std::sync::Mutex<Vec<String>>,
    }

    impl ScriptedChat {
        fn new(replies: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                replies: std::sync::Mutex::new(
                    replies.iter().rev().map(ToString::to_string).collect(),
                ),
            })
        }
    }

    #[async_trait]
    impl ChatProvider for ScriptedChat {
        async fn complete(&self, _system_prompt: &str, _turns: &[Turn]) -> Result<String> {
            self.replies
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| Error::Chat("script exhausted".to_string()))
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    fn test_scenario() -> Scenario {
        serde_json::from_str(
            r#"{
                "version": "1.0.0",
                "id": "test",
                "name": "Test",
                "prompt": {
                    "system": "You are a narrator.",
                    "opening": "You stand at a crossroads."
                }
            }"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn send_appends_both_turns() {
        let chat = ScriptedChat::new(&["You go north.\n1. Continue\n2. Rest"]);
        let mut session = GameSession::new(test_scenario(), chat);
        assert_eq!(session.conversation().len(), 1);

        let reply = session.send("Go north").await.unwrap();

        assert_eq!(reply.reply, "You go north.\n1. Continue\n2. Rest");
        assert_eq!(reply.options, vec!["Continue", "Rest"]);
        assert_eq!(session.conversation().len(), 3);
    }

    #[tokio::test]
    async fn failed_send_keeps_player_turn() {
        let chat = ScriptedChat::new(&[]);
        let mut session = GameSession::new(test_scenario(), chat);

        let result = session.send("Go north").await;

        assert!(result.is_err());
        assert_eq!(session.conversation().len(), 2);
        assert_eq!(
            session.conversation().turns()[1],
            Turn::User("Go north".to_string())
        );
    }

    #[tokio::test]
    async fn empty_message_is_rejected_without_history_change() {
        let chat = ScriptedChat::new(&["unused"]);
        let mut session = GameSession::new(test_scenario(), chat);

        assert!(session.send("   ").await.is_err());
        assert_eq!(session.conversation().len(), 1);
    }

    #[tokio::test]
    async fn restart_reseeds_single_opening_turn() {
        let chat = ScriptedChat::new(&["North it is."]);
        let mut session = GameSession::new(test_scenario(), chat);
        session.send("Go north").await.unwrap();
        assert_eq!(session.conversation().len(), 3);

        session.restart();

        assert_eq!(session.conversation().len(), 1);
        assert_eq!(session.last_reply(), Some("You stand at a crossroads."));
    }

    #[tokio::test]
    async fn scene_prompt_uses_latest_reply() {
        let chat = ScriptedChat::new(&["A ruined tower looms ahead."]);
        let mut session = GameSession::new(test_scenario(), chat);
        session.send("Look around").await.unwrap();

        let prompt = session.scene_prompt().unwrap();
        assert_eq!(prompt, "Fantasy game scene: A ruined tower looms ahead.");
    }
}
