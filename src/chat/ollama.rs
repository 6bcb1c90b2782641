//! Ollama chat completion backend (local models)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::chat::{ChatMessage, ChatProvider, MAX_TOKENS, TEMPERATURE, build_messages};
use crate::conversation::Turn;
use crate::{Error, Result};

/// Ollama chat backend
///
/// Talks to a local Ollama server; no credential required.
pub struct OllamaChat {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaChat {
    /// Create a new Ollama backend
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is not a valid URL
    pub fn new(base_url: String, model: String) -> Result<Self> {
        url::Url::parse(&base_url)
            .map_err(|e| Error::Config(format!("invalid Ollama URL '{base_url}': {e}")))?;

        Ok(Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }
}

#[async_trait]
impl ChatProvider for OllamaChat {
    async fn complete(&self, system_prompt: &str, turns: &[Turn]) -> Result<String> {
        let request = OllamaChatRequest {
            model: &self.model,
            messages: build_messages(system_prompt, turns),
            stream: false,
            options: OllamaOptions {
                temperature: TEMPERATURE,
                num_predict: MAX_TOKENS,
            },
        };

        tracing::debug!(model = %self.model, turns = turns.len(), "requesting narrator reply");

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                Error::Chat(format!(
                    "Ollama request failed: {e}; make sure Ollama is running (ollama serve)"
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Chat(format!("Ollama API error: {status} - {body}")));
        }

        let result: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Chat(format!("failed to parse Ollama response: {e}")))?;

        result
            .message
            .content
            .ok_or_else(|| Error::Chat("invalid response format from Ollama".to_string()))
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}

#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
}

#[derive(Deserialize)]
struct OllamaMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_rejected() {
        let err = OllamaChat::new("not a url".to_string(), "llama3".to_string()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let backend = OllamaChat::new("http://localhost:11434/".to_string(), "llama3".to_string())
            .unwrap();
        assert_eq!(backend.base_url, "http://localhost:11434");
    }
}
