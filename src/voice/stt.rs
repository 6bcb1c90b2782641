//! Speech-to-text (STT) transcription
//!
//! Both backends speak the Whisper transcription protocol, so a single
//! request path covers them. Only the endpoint and credentials differ.

use crate::{Error, Result};

/// Response from a Whisper-compatible transcription API
#[derive(serde::Deserialize)]
struct WhisperResponse {
    text: String,
}

/// STT provider backend
#[derive(Clone, Copy, Debug)]
enum SttBackend {
    OpenAi,
    Groq,
}

impl SttBackend {
    const fn endpoint(self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1/audio/transcriptions",
            Self::Groq => "https://api.groq.com/openai/v1/audio/transcriptions",
        }
    }
}

/// Transcribes player speech to text
pub struct SpeechToText {
    client: reqwest::Client,
    api_key: String,
    model: String,
    backend: SttBackend,
}

impl SpeechToText {
    /// Create a new STT instance using `OpenAI` Whisper
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_whisper(api_key: String, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for Whisper".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            backend: SttBackend::OpenAi,
        })
    }

    /// Create a new STT instance using Groq's hosted Whisper
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_groq(api_key: String, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "Groq API key required for transcription".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            backend: SttBackend::Groq,
        })
    }

    /// Transcribe audio to text
    ///
    /// # Arguments
    ///
    /// * `audio` - WAV audio bytes
    ///
    /// # Errors
    ///
    /// Returns error if transcription fails
    pub async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        tracing::debug!(
            audio_bytes = audio.len(),
            backend = ?self.backend,
            "starting transcription"
        );

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio.to_vec())
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Stt(e.to_string()))?,
            )
            .text("model", self.model.clone());

        let response = self
            .client
            .post(self.backend.endpoint())
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Whisper request failed");
                e
            })?;

        let status = response.status();
        tracing::debug!(status = %status, "received response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Whisper API error");
            return Err(Error::Stt(format!("Whisper API error {status}: {body}")));
        }

        let result: WhisperResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse response");
            e
        })?;

        tracing::info!(transcript = %result.text, "transcription complete");
        Ok(result.text)
    }
}
