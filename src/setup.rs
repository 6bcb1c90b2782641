//! Interactive first-run setup wizard (`fable setup`)

use std::path::PathBuf;

use dialoguer::{Confirm, Input, Select};

use crate::Config;
use crate::config::file::{
    ApiKeysFileConfig, ChatFileConfig, FableConfigFile, ImageFileConfig, ServerFileConfig,
    VoiceFileConfig,
};

/// Run the interactive setup wizard
///
/// # Errors
///
/// Returns error if user input fails or config cannot be written
pub fn run_setup() -> anyhow::Result<()> {
    println!("Fable Setup\n");

    // Load existing config if present
    let existing = crate::config::file::load_config_file();
    let config_path = crate::config::file::config_file_path()
        .unwrap_or_else(|| PathBuf::from("~/.config/omni/fable/config.toml"));

    if config_path.exists() {
        println!("Existing config found at {}\n", config_path.display());
    }

    // 1. Scenario selection
    let scenarios = Config::embedded_scenarios();
    let scenario_labels: Vec<&str> = scenarios.iter().map(|(id, _)| *id).collect();

    let default_scenario = existing
        .scenario
        .as_deref()
        .and_then(|s| scenario_labels.iter().position(|&l| l == s))
        .unwrap_or(0);

    let scenario_idx = Select::new()
        .with_prompt("Select a scenario")
        .items(&scenario_labels)
        .default(default_scenario)
        .interact()?;
    let scenario = scenario_labels[scenario_idx].to_string();

    // 2. Chat provider + API key
    let providers = ["Groq", "Ollama"];
    let default_provider = existing
        .chat
        .provider
        .as_deref()
        .and_then(|p| providers.iter().position(|&l| l.eq_ignore_ascii_case(p)))
        .unwrap_or(0);

    let provider_idx = Select::new()
        .with_prompt("Select a chat provider")
        .items(&providers)
        .default(default_provider)
        .interact()?;
    let provider_name = providers[provider_idx].to_lowercase();

    let mut api_keys = ApiKeysFileConfig::default();
    let mut ollama_url = existing.chat.ollama_url.clone();

    if provider_name == "groq" {
        let existing_key = existing.api_keys.groq.as_deref();
        api_keys.groq = prompt_api_key("Groq", "GROQ_API_KEY", existing_key)?;
    } else {
        let default_url = ollama_url
            .clone()
            .unwrap_or_else(|| "http://localhost:11434".to_string());
        let url: String = Input::new()
            .with_prompt("Ollama URL")
            .default(default_url)
            .interact_text()?;
        ollama_url = Some(url);
    }

    // 3. Chat model
    let default_model = existing
        .chat
        .model
        .as_deref()
        .unwrap_or(match provider_name.as_str() {
            "ollama" => "llama3",
            _ => "mixtral-8x7b-32768",
        });

    let model: String = Input::new()
        .with_prompt("Chat model")
        .default(default_model.to_string())
        .interact_text()?;

    // 4. Scene images (optional)
    let image_backends = ["ComfyUI (local)", "Hosted API (Nebius)", "(none)"];
    let default_backend = match existing.image.provider.as_deref() {
        Some("hosted") => 1,
        Some("none") => 2,
        _ => 0,
    };

    let backend_idx = Select::new()
        .with_prompt("Scene image backend")
        .items(&image_backends)
        .default(default_backend)
        .interact()?;

    let mut image = ImageFileConfig::default();
    match backend_idx {
        0 => {
            image.provider = Some("comfy".to_string());
            let default_url = existing
                .image
                .comfy_url
                .clone()
                .unwrap_or_else(|| "http://127.0.0.1:8188".to_string());
            let url: String = Input::new()
                .with_prompt("ComfyUI URL")
                .default(default_url)
                .interact_text()?;
            image.comfy_url = Some(url);
        }
        1 => {
            image.provider = Some("hosted".to_string());
            let existing_key = existing.api_keys.nebius.as_deref();
            api_keys.nebius = prompt_api_key("Nebius", "NEBIUS_API_KEY", existing_key)?;
        }
        _ => {
            image.provider = Some("none".to_string());
        }
    }

    // 5. Voice (optional)
    let voice_default = existing.voice.enabled.unwrap_or(true);
    let enable_voice = Confirm::new()
        .with_prompt("Enable voice (speech in and out)?")
        .default(voice_default)
        .interact()?;

    let voice = if enable_voice {
        if api_keys.openai.is_none() {
            let existing_key = existing.api_keys.openai.as_deref();
            api_keys.openai = prompt_api_key("OpenAI", "OPENAI_API_KEY", existing_key)?;
        }

        let default_voice = existing
            .voice
            .tts_voice
            .clone()
            .unwrap_or_else(|| "fable".to_string());
        let tts_voice: String = Input::new()
            .with_prompt("Narrator voice")
            .default(default_voice)
            .interact_text()?;

        VoiceFileConfig {
            enabled: Some(true),
            provider: existing.voice.provider.or_else(|| Some("openai".to_string())),
            stt_model: Some(
                existing
                    .voice
                    .stt_model
                    .unwrap_or_else(|| "whisper-1".to_string()),
            ),
            tts_model: Some(
                existing
                    .voice
                    .tts_model
                    .unwrap_or_else(|| "tts-1".to_string()),
            ),
            tts_voice: Some(tts_voice),
            tts_speed: existing.voice.tts_speed.or(Some(1.0)),
        }
    } else {
        VoiceFileConfig {
            enabled: Some(false),
            ..VoiceFileConfig::default()
        }
    };

    // 6. Build and write config
    let config_file = FableConfigFile {
        scenario: Some(scenario),
        chat: ChatFileConfig {
            provider: Some(provider_name),
            model: Some(model),
            ollama_url,
        },
        image: ImageFileConfig {
            size: existing.image.size,
            poll_interval_ms: existing.image.poll_interval_ms,
            max_polls: existing.image.max_polls,
            hosted_url: existing.image.hosted_url,
            ..image
        },
        voice,
        api_keys,
        server: ServerFileConfig {
            port: existing.server.port,
        },
    };

    write_config(&config_path, &config_file)?;
    println!("\nConfig written to {}", config_path.display());

    println!("\nSetup complete! Run `fable` to play, or `fable serve` for the API.");

    Ok(())
}

/// Prompt for an API key, keeping an existing one when left blank
fn prompt_api_key(
    label: &str,
    env_hint: &str,
    existing: Option<&str>,
) -> anyhow::Result<Option<String>> {
    let masked = existing.map(|k| {
        if k.len() > 8 {
            format!("{}...{}", &k[..4], &k[k.len() - 4..])
        } else {
            "****".to_string()
        }
    });

    let prompt = if let Some(ref m) = masked {
        format!("{label} API key (current: {m}, leave blank to keep)")
    } else {
        format!("{label} API key ({env_hint})")
    };

    let input: String = Input::new()
        .with_prompt(&prompt)
        .allow_empty(true)
        .interact_text()?;

    if input.is_empty() {
        Ok(existing.map(str::to_string))
    } else {
        Ok(Some(input))
    }
}

/// Serialize and write the config file
fn write_config(path: &PathBuf, config: &FableConfigFile) -> anyhow::Result<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let toml = serialize_config(config);
    std::fs::write(path, toml)?;

    Ok(())
}

/// Serialize config to a readable TOML string
fn serialize_config(config: &FableConfigFile) -> String {
    let mut out = String::new();

    if let Some(ref scenario) = config.scenario {
        out.push_str(&format!("scenario = \"{scenario}\"\n\n"));
    }

    // [chat]
    let chat = &config.chat;
    if chat.provider.is_some() || chat.model.is_some() || chat.ollama_url.is_some() {
        out.push_str("[chat]\n");
        if let Some(ref provider) = chat.provider {
            out.push_str(&format!("provider = \"{provider}\"\n"));
        }
        if let Some(ref model) = chat.model {
            out.push_str(&format!("model = \"{model}\"\n"));
        }
        if let Some(ref url) = chat.ollama_url {
            out.push_str(&format!("ollama_url = \"{url}\"\n"));
        }
        out.push('\n');
    }

    // [image]
    let image = &config.image;
    if image.provider.is_some() || image.comfy_url.is_some() || image.hosted_url.is_some() {
        out.push_str("[image]\n");
        if let Some(ref provider) = image.provider {
            out.push_str(&format!("provider = \"{provider}\"\n"));
        }
        if let Some(ref url) = image.comfy_url {
            out.push_str(&format!("comfy_url = \"{url}\"\n"));
        }
        if let Some(ref url) = image.hosted_url {
            out.push_str(&format!("hosted_url = \"{url}\"\n"));
        }
        if let Some(ref size) = image.size {
            out.push_str(&format!("size = \"{size}\"\n"));
        }
        if let Some(interval) = image.poll_interval_ms {
            out.push_str(&format!("poll_interval_ms = {interval}\n"));
        }
        if let Some(max) = image.max_polls {
            out.push_str(&format!("max_polls = {max}\n"));
        }
        out.push('\n');
    }

    // [voice]
    if config.voice.enabled.is_some() {
        out.push_str("[voice]\n");
        if let Some(enabled) = config.voice.enabled {
            out.push_str(&format!("enabled = {enabled}\n"));
        }
        if let Some(ref p) = config.voice.provider {
            out.push_str(&format!("provider = \"{p}\"\n"));
        }
        if let Some(ref m) = config.voice.stt_model {
            out.push_str(&format!("stt_model = \"{m}\"\n"));
        }
        if let Some(ref m) = config.voice.tts_model {
            out.push_str(&format!("tts_model = \"{m}\"\n"));
        }
        if let Some(ref v) = config.voice.tts_voice {
            out.push_str(&format!("tts_voice = \"{v}\"\n"));
        }
        if let Some(s) = config.voice.tts_speed {
            out.push_str(&format!("tts_speed = {s}\n"));
        }
        out.push('\n');
    }

    // [api_keys]
    let ak = &config.api_keys;
    if ak.groq.is_some() || ak.openai.is_some() || ak.elevenlabs.is_some() || ak.nebius.is_some() {
        out.push_str("[api_keys]\n");
        for (key, val) in [
            ("groq", &ak.groq),
            ("openai", &ak.openai),
            ("elevenlabs", &ak.elevenlabs),
            ("nebius", &ak.nebius),
        ] {
            if let Some(v) = val {
                out.push_str(&format!("{key} = \"{v}\"\n"));
            }
        }
        out.push('\n');
    }

    // [server]
    if let Some(port) = config.server.port {
        out.push_str("[server]\n");
        out.push_str(&format!("port = {port}\n"));
        out.push('\n');
    }

    out
}
