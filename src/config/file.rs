//! TOML configuration file loading
//!
//! Supports `~/.config/omni/fable/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct FableConfigFile {
    /// Scenario identifier (e.g. "temple")
    #[serde(default)]
    pub scenario: Option<String>,

    /// Chat backend configuration
    #[serde(default)]
    pub chat: ChatFileConfig,

    /// Scene image configuration
    #[serde(default)]
    pub image: ImageFileConfig,

    /// Voice/audio configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,

    /// Server/runtime configuration
    #[serde(default)]
    pub server: ServerFileConfig,
}

/// Chat backend configuration
#[derive(Debug, Default, Deserialize)]
pub struct ChatFileConfig {
    /// Backend name ("groq" or "ollama")
    pub provider: Option<String>,

    /// Model identifier (e.g. "mixtral-8x7b-32768")
    pub model: Option<String>,

    /// Ollama server URL
    pub ollama_url: Option<String>,
}

/// Scene image configuration
#[derive(Debug, Default, Deserialize)]
pub struct ImageFileConfig {
    /// Backend name ("comfy", "hosted", or "none")
    pub provider: Option<String>,

    /// ComfyUI server URL
    pub comfy_url: Option<String>,

    /// Hosted image API base URL
    pub hosted_url: Option<String>,

    /// Output size (e.g. "512x512")
    pub size: Option<String>,

    /// Poll interval for job status, in milliseconds
    pub poll_interval_ms: Option<u64>,

    /// Maximum number of status polls before giving up
    pub max_polls: Option<u32>,
}

/// Voice processing configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// Enable voice input/output
    pub enabled: Option<bool>,

    /// TTS provider ("openai" or "elevenlabs")
    pub provider: Option<String>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: Option<String>,

    /// TTS voice identifier (e.g. "fable")
    pub tts_voice: Option<String>,

    /// TTS speed multiplier
    pub tts_speed: Option<f64>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub groq: Option<String>,
    pub openai: Option<String>,
    pub elevenlabs: Option<String>,
    pub nebius: Option<String>,
}

/// Server/runtime configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// HTTP API server port
    pub port: Option<u16>,
}

/// Load the TOML config file from the standard path
///
/// Returns `FableConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> FableConfigFile {
    let Some(path) = config_file_path() else {
        return FableConfigFile::default();
    };

    if !path.exists() {
        return FableConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                FableConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            FableConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/omni/fable/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| {
        d.config_dir()
            .join("omni")
            .join("fable")
            .join("config.toml")
    })
}
