//! Configuration management for the Fable gateway

pub mod file;

use std::path::PathBuf;

use crate::{Error, Result, Scenario};

/// Scenario played when nothing else is configured
pub const DEFAULT_SCENARIO: &str = "temple";

/// Fable gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Active scenario
    pub scenario: Scenario,

    /// Path to scenario cache directory
    pub scenario_cache_dir: PathBuf,

    /// Path to data directory (exports, cache, etc)
    pub data_dir: PathBuf,

    /// Chat backend configuration
    pub chat: ChatConfig,

    /// Scene image configuration
    pub image: ImageConfig,

    /// Voice configuration
    pub voice: VoiceConfig,

    /// API keys
    pub api_keys: ApiKeys,

    /// HTTP API server configuration
    pub server: ServerConfig,
}

/// Chat backend configuration
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Backend name ("groq" or "ollama")
    pub provider: String,

    /// Model identifier for chat completions
    pub model: String,

    /// Ollama server URL
    pub ollama_url: String,
}

/// Scene image configuration
#[derive(Debug, Clone)]
pub struct ImageConfig {
    /// Backend name ("comfy", "hosted", or "none")
    pub provider: String,

    /// ComfyUI server URL
    pub comfy_url: String,

    /// Hosted image API base URL
    pub hosted_url: String,

    /// Output size (e.g. "512x512")
    pub size: String,

    /// Poll interval for job status, in milliseconds
    pub poll_interval_ms: u64,

    /// Maximum number of status polls before giving up
    pub max_polls: u32,
}

/// Voice processing configuration
#[derive(Debug, Clone, Default)]
pub struct VoiceConfig {
    /// Enable voice input/output
    pub enabled: bool,

    /// TTS provider ("openai" or "elevenlabs")
    pub provider: String,

    /// STT model (e.g. "whisper-1")
    pub stt_model: String,

    /// TTS model (e.g. "tts-1")
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f64,
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// `Groq` API key (for chat completions)
    pub groq: Option<String>,

    /// `OpenAI` API key (for Whisper and TTS)
    pub openai: Option<String>,

    /// `ElevenLabs` API key (optional TTS)
    pub elevenlabs: Option<String>,

    /// `Nebius` API key (hosted image generation)
    pub nebius: Option<String>,
}

/// HTTP API server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
}

/// Return the XDG cache directory for scenario files, creating it if needed
///
/// Uses `~/.cache/omni/fable/scenarios/` on Linux
pub fn scenario_cache_dir() -> PathBuf {
    let cache_dir = directories::BaseDirs::new().map_or_else(
        || PathBuf::from(".cache/omni/fable/scenarios"),
        |d| d.cache_dir().join("omni").join("fable").join("scenarios"),
    );

    if let Err(e) = std::fs::create_dir_all(&cache_dir) {
        tracing::warn!(
            path = %cache_dir.display(),
            error = %e,
            "failed to create scenario cache directory"
        );
    }

    cache_dir
}

impl Config {
    /// Load configuration for a scenario
    ///
    /// # Errors
    ///
    /// Returns error if the scenario file cannot be loaded
    pub fn load(scenario_id: Option<&str>) -> Result<Self> {
        Self::load_with_options(scenario_id, false)
    }

    /// Load configuration with explicit voice disable option
    ///
    /// # Errors
    ///
    /// Returns error if the scenario file cannot be loaded
    pub fn load_with_options(scenario_id: Option<&str>, disable_voice: bool) -> Result<Self> {
        // Load optional TOML config file (env > toml > default)
        let fc = file::load_config_file();

        // Scenario id priority: argument > env > toml > default
        let scenario_id = scenario_id
            .map(str::to_string)
            .or_else(|| std::env::var("FABLE_SCENARIO").ok())
            .or(fc.scenario)
            .unwrap_or_else(|| DEFAULT_SCENARIO.to_string());

        // Load scenario with priority: env override > cache > embedded
        let scenario = Self::load_scenario_with_priority(&scenario_id)?;
        let cache_dir = scenario_cache_dir();

        // Load API keys (env > toml > None)
        let api_keys = ApiKeys {
            groq: std::env::var("GROQ_API_KEY").ok().or(fc.api_keys.groq),
            openai: std::env::var("OPENAI_API_KEY").ok().or(fc.api_keys.openai),
            elevenlabs: std::env::var("ELEVENLABS_API_KEY")
                .ok()
                .or(fc.api_keys.elevenlabs),
            nebius: std::env::var("NEBIUS_API_KEY").ok().or(fc.api_keys.nebius),
        };

        // Chat backend (env > toml > default)
        let chat = ChatConfig {
            provider: std::env::var("FABLE_CHAT_PROVIDER")
                .ok()
                .or(fc.chat.provider)
                .unwrap_or_else(|| "groq".to_string()),
            model: std::env::var("FABLE_CHAT_MODEL")
                .ok()
                .or(fc.chat.model)
                .unwrap_or_else(|| "mixtral-8x7b-32768".to_string()),
            ollama_url: std::env::var("OLLAMA_URL")
                .ok()
                .or(fc.chat.ollama_url)
                .unwrap_or_else(|| "http://localhost:11434".to_string()),
        };

        // Scene images (env > toml > default)
        let image = ImageConfig {
            provider: std::env::var("FABLE_IMAGE_PROVIDER")
                .ok()
                .or(fc.image.provider)
                .unwrap_or_else(|| "comfy".to_string()),
            comfy_url: std::env::var("COMFYUI_URL")
                .ok()
                .or(fc.image.comfy_url)
                .unwrap_or_else(|| "http://127.0.0.1:8188".to_string()),
            hosted_url: std::env::var("FABLE_IMAGE_API_URL")
                .ok()
                .or(fc.image.hosted_url)
                .unwrap_or_else(|| "https://api.nebius.ai/v1".to_string()),
            size: fc.image.size.unwrap_or_else(|| "512x512".to_string()),
            poll_interval_ms: fc.image.poll_interval_ms.unwrap_or(1000),
            max_polls: fc.image.max_polls.unwrap_or(120),
        };

        // Voice config (env > toml > default)
        let voice_enabled = if disable_voice {
            false
        } else {
            fc.voice.enabled.unwrap_or(true)
        };
        let voice = VoiceConfig {
            enabled: voice_enabled,
            provider: std::env::var("FABLE_TTS_PROVIDER")
                .ok()
                .or(fc.voice.provider)
                .unwrap_or_else(|| "openai".to_string()),
            stt_model: std::env::var("FABLE_STT_MODEL")
                .ok()
                .or(fc.voice.stt_model)
                .unwrap_or_else(|| "whisper-1".to_string()),
            tts_model: std::env::var("FABLE_TTS_MODEL")
                .ok()
                .or(fc.voice.tts_model)
                .unwrap_or_else(|| "tts-1".to_string()),
            tts_voice: std::env::var("FABLE_TTS_VOICE")
                .ok()
                .or(fc.voice.tts_voice)
                .unwrap_or_else(|| "fable".to_string()),
            tts_speed: fc.voice.tts_speed.unwrap_or(1.0),
        };

        if disable_voice {
            tracing::info!("voice explicitly disabled via --disable-voice");
        }

        // Determine data directory (~/.local/share/omni/fable on Linux)
        let data_dir = directories::BaseDirs::new()
            .map_or_else(|| PathBuf::from("."), |d| d.data_dir().join("omni").join("fable"));

        // Ensure data dir exists
        std::fs::create_dir_all(&data_dir).ok();

        // API server config (env > toml > default)
        let server = ServerConfig {
            port: std::env::var("FABLE_PORT")
                .or_else(|_| std::env::var("PORT"))
                .ok()
                .and_then(|s| s.parse().ok())
                .or(fc.server.port)
                .unwrap_or(18890),
        };

        Ok(Self {
            scenario,
            scenario_cache_dir: cache_dir,
            data_dir,
            chat,
            image,
            voice,
            api_keys,
            server,
        })
    }

    /// Load a scenario with priority: env override, cache, embedded
    ///
    /// # Errors
    ///
    /// Returns error if the scenario cannot be loaded from any source
    fn load_scenario_with_priority(scenario_id: &str) -> Result<Scenario> {
        // 1. FABLE_SCENARIOS_DIR env var (dev override)
        if let Ok(dir) = std::env::var("FABLE_SCENARIOS_DIR") {
            let path = PathBuf::from(&dir);
            if path.exists() {
                match Self::load_scenario(&path, scenario_id) {
                    Ok(scenario) => {
                        tracing::info!(
                            scenario_id,
                            path = %path.display(),
                            "loaded scenario from FABLE_SCENARIOS_DIR"
                        );
                        return Ok(scenario);
                    }
                    Err(e) => {
                        tracing::warn!(
                            scenario_id,
                            error = %e,
                            "FABLE_SCENARIOS_DIR set but scenario not found, continuing"
                        );
                    }
                }
            } else {
                tracing::warn!(
                    path = %dir,
                    "FABLE_SCENARIOS_DIR set but directory does not exist"
                );
            }
        }

        // 2. Local cache (user-placed scenario files)
        match Self::load_cached_scenario(scenario_id) {
            Ok(scenario) => {
                tracing::info!(scenario_id, "loaded scenario from cache");
                return Ok(scenario);
            }
            Err(e) => {
                tracing::debug!(
                    scenario_id,
                    error = %e,
                    "no cached scenario, trying embedded"
                );
            }
        }

        // 3. Embedded fallback
        Self::load_embedded_scenario(scenario_id)
    }

    /// Load a scenario.json file from a directory
    fn load_scenario(scenarios_dir: &std::path::Path, scenario_id: &str) -> Result<Scenario> {
        let json_path = scenarios_dir.join(format!("{scenario_id}.json"));
        if json_path.exists() {
            let content = std::fs::read_to_string(&json_path)?;
            let scenario: Scenario = serde_json::from_str(&content)
                .map_err(|e| Error::Config(format!("failed to parse {scenario_id}.json: {e}")))?;
            tracing::debug!(path = %json_path.display(), "loaded scenario from JSON");
            return Ok(scenario);
        }

        Err(Error::ScenarioNotFound(scenario_id.to_string()))
    }

    /// Embedded default scenario data for when no local files are available
    const EMBEDDED_SCENARIOS: &[(&str, &str)] = &[
        ("temple", include_str!("../../scenarios/temple.json")),
        ("voidrunner", include_str!("../../scenarios/voidrunner.json")),
    ];

    /// Load an embedded scenario compiled into the binary
    ///
    /// # Errors
    ///
    /// Returns error if the scenario ID is not found in embedded data
    pub fn load_embedded_scenario(scenario_id: &str) -> Result<Scenario> {
        Self::EMBEDDED_SCENARIOS
            .iter()
            .find(|(id, _)| *id == scenario_id)
            .and_then(|(_, json)| {
                let scenario: Scenario = serde_json::from_str(json).ok()?;
                tracing::info!(scenario_id, "loaded scenario from embedded data");
                Some(scenario)
            })
            .ok_or_else(|| Error::ScenarioNotFound(scenario_id.to_string()))
    }

    /// Return the embedded scenario array for enumeration
    #[must_use]
    pub const fn embedded_scenarios() -> &'static [(&'static str, &'static str)] {
        Self::EMBEDDED_SCENARIOS
    }

    /// Load a scenario from the cache directory
    fn load_cached_scenario(scenario_id: &str) -> Result<Scenario> {
        let cache_dir = scenario_cache_dir();
        Self::load_scenario(&cache_dir, scenario_id)
    }
}
