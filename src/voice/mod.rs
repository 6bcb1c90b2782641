//! Voice input and output
//!
//! Microphone capture and utterance detection feed Whisper
//! transcription on the way in; narration goes back out through TTS
//! synthesis and cancellable playback.

mod capture;
mod listener;
mod playback;
mod speaker;
mod stt;
mod tts;

pub use capture::{AudioCapture, SAMPLE_RATE, samples_to_wav};
pub use listener::{CaptureState, Listener, UtteranceDetector};
pub use playback::{AudioPlayback, PLAYBACK_SAMPLE_RATE};
pub use speaker::Speaker;
pub use stt::SpeechToText;
pub use tts::{PREVIEW_SENTENCE, TextToSpeech, VoiceInfo, pick_default_voice};

use crate::config::Config;
use crate::{Error, Result};

/// Transcription model used with the Groq backend
const GROQ_STT_MODEL: &str = "whisper-large-v3";

/// Build the configured TTS backend
///
/// # Errors
///
/// Returns error if the provider is unknown or its API key is missing
pub fn tts_from_config(config: &Config) -> Result<TextToSpeech> {
    match config.voice.provider.as_str() {
        "openai" => {
            #[allow(clippy::cast_possible_truncation)]
            let speed = config.voice.tts_speed as f32;
            TextToSpeech::new_openai_with_model(
                config.api_keys.openai.clone().unwrap_or_default(),
                config.voice.tts_voice.clone(),
                speed,
                config.voice.tts_model.clone(),
            )
        }
        "elevenlabs" => TextToSpeech::new_elevenlabs(
            config.api_keys.elevenlabs.clone().unwrap_or_default(),
            config.voice.tts_voice.clone(),
        ),
        other => Err(Error::Config(format!("unknown voice provider: {other}"))),
    }
}

/// Build a transcription backend from whichever key is configured
///
/// Prefers `OpenAI` Whisper; falls back to Groq's hosted Whisper when
/// only a Groq key is present.
///
/// # Errors
///
/// Returns error if no usable API key is configured
pub fn stt_from_config(config: &Config) -> Result<SpeechToText> {
    if let Some(key) = config.api_keys.openai.clone().filter(|k| !k.is_empty()) {
        return SpeechToText::new_whisper(key, config.voice.stt_model.clone());
    }

    if let Some(key) = config.api_keys.groq.clone().filter(|k| !k.is_empty()) {
        return SpeechToText::new_groq(key, GROQ_STT_MODEL.to_string());
    }

    Err(Error::Config(
        "OPENAI_API_KEY or GROQ_API_KEY required for speech recognition".to_string(),
    ))
}

/// Build a speaker when voice output is enabled
///
/// Returns `None` when voice is disabled in the configuration.
///
/// # Errors
///
/// Returns error if voice is enabled but the TTS backend cannot be built
pub fn speaker_from_config(config: &Config) -> Result<Option<Speaker>> {
    if !config.voice.enabled {
        return Ok(None);
    }

    Ok(Some(Speaker::new(tts_from_config(config)?)))
}
