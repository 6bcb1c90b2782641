//! Shared test utilities

use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use fable_gateway::chat::ChatProvider;
use fable_gateway::conversation::Turn;
use fable_gateway::{Error, Result, Scenario};

/// Chat backend that replays a fixed script of replies
///
/// Replies come back in order; once the script runs out every call
/// fails, which doubles as a backend outage.
pub struct ScriptedChat {
    replies: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedChat {
    #[must_use]
    pub fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().rev().map(ToString::to_string).collect()),
            calls: AtomicUsize::new(0),
        })
    }

    /// Number of completion requests made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatProvider for ScriptedChat {
    async fn complete(&self, _system_prompt: &str, _turns: &[Turn]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.replies
            .lock()
            .expect("script lock")
            .pop()
            .ok_or_else(|| Error::Chat("script exhausted".to_string()))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Chat backend that always fails
pub struct FailingChat;

#[async_trait]
impl ChatProvider for FailingChat {
    async fn complete(&self, _system_prompt: &str, _turns: &[Turn]) -> Result<String> {
        Err(Error::Chat("backend unavailable".to_string()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Build a minimal scenario for tests
#[must_use]
pub fn test_scenario() -> Scenario {
    serde_json::from_str(
        r#"{
            "version": "1.0.0",
            "id": "test-dungeon",
            "name": "Test Dungeon",
            "prompt": {
                "system": "You are the game master. Offer numbered options.",
                "opening": "You stand at the dungeon gate."
            }
        }"#,
    )
    .expect("test scenario should parse")
}
