//! Text-to-speech (TTS) synthesis

use std::collections::HashMap;

use crate::{Error, Result};

/// Fixed sentence spoken when previewing a voice
pub const PREVIEW_SENTENCE: &str = "This is a preview of the selected voice.";

/// Voices available from the `OpenAI` speech endpoint
const OPENAI_VOICES: &[&str] = &["alloy", "echo", "fable", "nova", "onyx", "shimmer"];

/// TTS provider backend
#[derive(Clone, Copy, Debug)]
enum TtsProvider {
    OpenAi,
    ElevenLabs,
}

/// A voice offered by a TTS backend
#[derive(Debug, Clone, serde::Serialize)]
pub struct VoiceInfo {
    /// Identifier passed back to the backend when synthesizing
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// BCP 47 locale tag, best effort for backends that do not report one
    pub locale: String,
}

/// Pick a default voice from a catalog
///
/// Preference order: the preferred name or id if present, then a
/// British English voice, then any English voice, then the first
/// voice in the catalog.
#[must_use]
pub fn pick_default_voice<'a>(
    voices: &'a [VoiceInfo],
    preferred: Option<&str>,
) -> Option<&'a VoiceInfo> {
    if let Some(wanted) = preferred {
        if let Some(voice) = voices.iter().find(|v| v.name == wanted || v.id == wanted) {
            return Some(voice);
        }
    }

    voices
        .iter()
        .find(|v| v.locale == "en-GB")
        .or_else(|| voices.iter().find(|v| v.locale.starts_with("en")))
        .or_else(|| voices.first())
}

/// Synthesizes narration audio from text
pub struct TextToSpeech {
    client: reqwest::Client,
    api_key: String,
    voice: String,
    speed: f32,
    model: String,
    provider: TtsProvider,
}

impl TextToSpeech {
    /// Create a new TTS instance using `OpenAI`
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_openai(api_key: String, voice: String, speed: f32) -> Result<Self> {
        Self::new_openai_with_model(api_key, voice, speed, "tts-1".to_string())
    }

    /// Create a new TTS instance using `OpenAI` with custom model
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_openai_with_model(
        api_key: String,
        voice: String,
        speed: f32,
        model: String,
    ) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("OpenAI API key required for TTS".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            voice,
            speed,
            model,
            provider: TtsProvider::OpenAi,
        })
    }

    /// Create a new TTS instance using `ElevenLabs`
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_elevenlabs(api_key: String, voice_id: String) -> Result<Self> {
        Self::new_elevenlabs_with_model(api_key, voice_id, "eleven_monolingual_v1".to_string())
    }

    /// Create a new TTS instance using `ElevenLabs` with custom model
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_elevenlabs_with_model(
        api_key: String,
        voice_id: String,
        model: String,
    ) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "ElevenLabs API key required for TTS".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            voice: voice_id,
            speed: 1.0, // ElevenLabs does not take a speed parameter
            model,
            provider: TtsProvider::ElevenLabs,
        })
    }

    /// Replace the voice, keeping everything else
    #[must_use]
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    /// The currently selected voice
    #[must_use]
    pub fn voice(&self) -> &str {
        &self.voice
    }

    /// Synthesize text to speech
    ///
    /// # Arguments
    ///
    /// * `text` - Text to synthesize
    ///
    /// # Returns
    ///
    /// Audio bytes (MP3 format)
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        match self.provider {
            TtsProvider::OpenAi => self.synthesize_openai(text).await,
            TtsProvider::ElevenLabs => self.synthesize_elevenlabs(text).await,
        }
    }

    /// Synthesize the fixed preview sentence with the selected voice
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    pub async fn preview(&self) -> Result<Vec<u8>> {
        self.synthesize(PREVIEW_SENTENCE).await
    }

    /// List the voices the backend offers
    ///
    /// The `OpenAI` catalog is fixed, so no request is made for it.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be queried
    pub async fn list_voices(&self) -> Result<Vec<VoiceInfo>> {
        match self.provider {
            TtsProvider::OpenAi => Ok(OPENAI_VOICES
                .iter()
                .map(|&name| VoiceInfo {
                    id: name.to_string(),
                    name: name.to_string(),
                    locale: "en-US".to_string(),
                })
                .collect()),
            TtsProvider::ElevenLabs => self.list_elevenlabs_voices().await,
        }
    }

    /// Synthesize using OpenAI TTS
    async fn synthesize_openai(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f32,
        }

        let request = TtsRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            speed: self.speed,
        };

        tracing::debug!(voice = %self.voice, chars = text.len(), "synthesizing speech");

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/speech")
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("OpenAI TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }

    /// Synthesize using ElevenLabs TTS
    async fn synthesize_elevenlabs(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct ElevenLabsRequest<'a> {
            text: &'a str,
            model_id: &'a str,
        }

        let url = format!(
            "https://api.elevenlabs.io/v1/text-to-speech/{}",
            self.voice
        );

        let request = ElevenLabsRequest {
            text,
            model_id: &self.model,
        };

        tracing::debug!(voice = %self.voice, chars = text.len(), "synthesizing speech");

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("ElevenLabs TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }

    /// Fetch the voice catalog from ElevenLabs
    async fn list_elevenlabs_voices(&self) -> Result<Vec<VoiceInfo>> {
        #[derive(serde::Deserialize)]
        struct VoicesResponse {
            voices: Vec<ElevenLabsVoice>,
        }

        #[derive(serde::Deserialize)]
        struct ElevenLabsVoice {
            voice_id: String,
            name: String,
            #[serde(default)]
            labels: HashMap<String, String>,
        }

        let response = self
            .client
            .get("https://api.elevenlabs.io/v1/voices")
            .header("xi-api-key", &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("ElevenLabs API error {status}: {body}")));
        }

        let catalog: VoicesResponse = response.json().await?;

        Ok(catalog
            .voices
            .into_iter()
            .map(|voice| {
                let locale = voice
                    .labels
                    .get("language")
                    .cloned()
                    .unwrap_or_else(|| "en".to_string());
                VoiceInfo {
                    id: voice.voice_id,
                    name: voice.name,
                    locale,
                }
            })
            .collect())
    }
}
