//! Chat completion backends
//!
//! The game master needs exactly one capability: produce the next
//! narrator reply given the system instructions and the turn history.
//! Backends implement `ChatProvider`; `from_config` picks the
//! configured one.

pub mod groq;
pub mod ollama;

pub use groq::GroqChat;
pub use ollama::OllamaChat;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::conversation::Turn;
use crate::{Config, Error, Result};

/// Sampling temperature for narrator replies
pub const TEMPERATURE: f32 = 0.7;

/// Maximum tokens per narrator reply
pub const MAX_TOKENS: u32 = 1024;

/// A chat message in provider wire format
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// Message role ("system", "user", or "assistant")
    pub role: &'static str,

    /// Message text
    pub content: String,
}

/// Build the provider message list: system instructions first, then history
#[must_use]
pub fn build_messages(system_prompt: &str, turns: &[Turn]) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(turns.len() + 1);
    messages.push(ChatMessage {
        role: "system",
        content: system_prompt.to_string(),
    });
    for turn in turns {
        messages.push(ChatMessage {
            role: turn.role(),
            content: turn.text().to_string(),
        });
    }
    messages
}

/// Trait for chat completion backends
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Generate the next narrator reply for the given history
    ///
    /// Exactly one request is made per call; there is no retry.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response has an
    /// unexpected shape
    async fn complete(&self, system_prompt: &str, turns: &[Turn]) -> Result<String>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

/// Build the configured chat backend
///
/// # Errors
///
/// Returns error if the backend name is unknown or its credential is
/// missing
pub fn from_config(config: &Config) -> Result<Arc<dyn ChatProvider>> {
    match config.chat.provider.as_str() {
        "groq" => {
            let backend = GroqChat::new(
                config.api_keys.groq.clone().unwrap_or_default(),
                config.chat.model.clone(),
            )?;
            Ok(Arc::new(backend))
        }
        "ollama" => {
            let backend = OllamaChat::new(config.chat.ollama_url.clone(), config.chat.model.clone())?;
            Ok(Arc::new(backend))
        }
        other => Err(Error::Config(format!("unknown chat provider: {other}"))),
    }
}
