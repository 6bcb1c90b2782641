//! Groq chat completion backend

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::chat::{ChatMessage, ChatProvider, MAX_TOKENS, TEMPERATURE, build_messages};
use crate::conversation::Turn;
use crate::{Error, Result};

/// Default Groq API base URL (OpenAI-compatible)
const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1";

/// Groq chat backend
pub struct GroqChat {
    client: Client,
    api_key: String,
    model: String,
    api_url: String,
}

impl GroqChat {
    /// Create a new Groq backend
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty. The check happens here so
    /// a missing credential is reported before any request is made.
    pub fn new(api_key: String, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("GROQ_API_KEY required for chat".to_string()));
        }

        Ok(Self {
            client: Client::new(),
            api_key,
            model,
            api_url: DEFAULT_API_URL.to_string(),
        })
    }

    /// Point the backend at a different OpenAI-compatible host
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

#[async_trait]
impl ChatProvider for GroqChat {
    async fn complete(&self, system_prompt: &str, turns: &[Turn]) -> Result<String> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: build_messages(system_prompt, turns),
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        tracing::debug!(model = %self.model, turns = turns.len(), "requesting narrator reply");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Chat(format!("Groq request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Chat(format!("Groq API error: {status} - {body}")));
        }

        let result: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Chat(format!("failed to parse Groq response: {e}")))?;

        result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Chat("invalid response format from Groq API".to_string()))
    }

    fn name(&self) -> &'static str {
        "groq"
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
