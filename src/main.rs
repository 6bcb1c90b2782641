use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fable_gateway::api::{ApiServer, ApiState};
use fable_gateway::images::ImageProvider;
use fable_gateway::session::{DEFAULT_EXPORT_FILENAME, GameSession};
use fable_gateway::voice::{
    AudioPlayback, Listener, PLAYBACK_SAMPLE_RATE, PREVIEW_SENTENCE, pick_default_voice,
};
use fable_gateway::{Config, chat, images, voice};

/// Fable - Voice-enabled text-adventure gateway for LLM game masters
#[derive(Parser)]
#[command(name = "fable", version, about)]
struct Cli {
    /// Scenario to play (e.g., "temple")
    #[arg(short, long, env = "FABLE_SCENARIO")]
    scenario: Option<String>,

    /// Port for the API server
    #[arg(long, env = "FABLE_PORT", default_value = "18890")]
    port: u16,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable voice features (for machines without audio hardware)
    #[arg(long, env = "FABLE_DISABLE_VOICE")]
    disable_voice: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API server
    Serve,
    /// Export the transcript from a running gateway
    Export {
        /// Output file
        #[arg(short, long, default_value = DEFAULT_EXPORT_FILENAME)]
        output: PathBuf,
        /// Print to stdout instead of writing a file
        #[arg(long)]
        print: bool,
    },
    /// Show status of a running gateway
    Status,
    /// List available narrator voices
    Voices,
    /// Preview a narrator voice
    Preview {
        /// Voice to preview; defaults to the configured one
        voice: Option<String>,
    },
    /// Test speaker output
    TestSpeaker,
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
    /// Capture one utterance and print the transcript
    Listen,
    /// Interactive first-run setup
    Setup,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,fable_gateway=info",
        1 => "info,fable_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let scenario_ref = cli.scenario.as_deref();

    // Handle subcommands
    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Serve => serve(scenario_ref, cli.port, cli.disable_voice).await,
            Command::Export { output, print } => export(cli.port, &output, print).await,
            Command::Status => status(cli.port).await,
            Command::Voices => list_voices(scenario_ref).await,
            Command::Preview { voice } => preview_voice(scenario_ref, voice.as_deref()).await,
            Command::TestSpeaker => test_speaker(),
            Command::TestTts { text } => test_tts(scenario_ref, &text).await,
            Command::Listen => listen_once(scenario_ref).await,
            Command::Setup => fable_gateway::setup::run_setup(),
        };
    }

    play(cli).await
}

/// Run the gateway's HTTP API server
async fn serve(scenario: Option<&str>, port: u16, disable_voice: bool) -> anyhow::Result<()> {
    let config = Config::load_with_options(scenario, disable_voice)?;

    let chat = chat::from_config(&config)?;
    let images = images::from_config(&config)?;
    let speaker = match voice::speaker_from_config(&config) {
        Ok(speaker) => speaker,
        Err(e) => {
            tracing::warn!(error = %e, "voice output unavailable");
            None
        }
    };

    let chat_backend = chat.name();
    let image_backend = images.as_ref().map(|backend| backend.name());
    let session = GameSession::new(config.scenario.clone(), chat);

    let state = ApiState {
        session: tokio::sync::Mutex::new(session),
        images,
        speaker: speaker.map(tokio::sync::Mutex::new),
        chat_backend,
        image_backend,
    };

    tracing::info!(
        scenario = %config.scenario.name,
        chat = chat_backend,
        image = ?image_backend,
        "fable gateway ready"
    );

    // Set up shutdown signal
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::mpsc::channel::<()>(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(()).await;
        }
    });

    let mut api_handle = ApiServer::new(state, port).spawn();

    // Park until ctrl-c; an early server exit (usually a failed bind)
    // surfaces its error instead
    tokio::select! {
        _ = shutdown_rx.recv() => {}
        result = &mut api_handle => result??,
    }

    tracing::info!("fable gateway stopped");
    Ok(())
}

/// Play in the terminal
#[allow(clippy::future_not_send)]
async fn play(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load_with_options(cli.scenario.as_deref(), cli.disable_voice)?;

    let chat = chat::from_config(&config)?;
    let images = images::from_config(&config)?;

    let mut speaker = match voice::speaker_from_config(&config) {
        Ok(speaker) => speaker,
        Err(e) => {
            tracing::warn!(error = %e, "voice output unavailable");
            None
        }
    };

    let listener = if config.voice.enabled {
        voice::stt_from_config(&config).ok().map(Listener::new)
    } else {
        None
    };

    let narrator = config.scenario.labels.narrator.clone();
    let mut session = GameSession::new(config.scenario.clone(), chat);

    println!("{} - {}", config.scenario.name, config.chat.model);
    println!("Commands: /image /restart /export /listen /stop /quit\n");
    println!("{narrator}: {}\n", session.scenario().opening());

    let mut options: Vec<String> = Vec::new();

    loop {
        let input: String = dialoguer::Input::new()
            .with_prompt("you")
            .allow_empty(true)
            .interact_text()?;

        let text = match input.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/restart" => {
                session.restart();
                options.clear();
                println!("\n{narrator}: {}\n", session.scenario().opening());
                continue;
            }
            "/export" => {
                session.export_to(Path::new(DEFAULT_EXPORT_FILENAME))?;
                println!("Transcript written to {DEFAULT_EXPORT_FILENAME}");
                continue;
            }
            "/stop" => {
                if let Some(speaker) = speaker.as_mut() {
                    speaker.stop();
                }
                continue;
            }
            "/image" => {
                generate_scene_image(images.as_deref(), &session).await;
                continue;
            }
            "/listen" => {
                let Some(listener) = &listener else {
                    println!("voice input not configured");
                    continue;
                };
                println!("Listening... speak now.");
                match listener.listen().await {
                    Ok(heard) if !heard.trim().is_empty() => {
                        println!("(heard: {heard})");
                        heard
                    }
                    Ok(_) => {
                        println!("(heard nothing)");
                        continue;
                    }
                    Err(e) => {
                        eprintln!("listen failed: {e}");
                        continue;
                    }
                }
            }
            other => other.to_string(),
        };

        // A bare number picks a numbered option from the last reply
        let text = match text.parse::<usize>() {
            Ok(n) if n >= 1 && n <= options.len() => options[n - 1].clone(),
            _ => text,
        };

        match session.send(&text).await {
            Ok(reply) => {
                println!("\n{narrator}: {}\n", reply.reply);

                if let Some(speaker) = speaker.as_mut() {
                    if let Err(e) = speaker.speak(&reply.reply).await {
                        tracing::warn!(error = %e, "narration failed");
                    }
                }

                options = reply.options;
            }
            Err(e) => eprintln!("error: {e}"),
        }
    }

    Ok(())
}

/// Generate and print a scene image for the latest narration
async fn generate_scene_image(backend: Option<&dyn ImageProvider>, session: &GameSession) {
    let Some(backend) = backend else {
        println!("image generation not configured");
        return;
    };

    let Some(prompt) = session.scene_prompt() else {
        println!("nothing to illustrate yet");
        return;
    };

    println!("Generating scene image...");
    match backend.generate(&prompt).await {
        Ok(image) => println!("Image: {}", image.url),
        Err(e) => eprintln!("image failed: {e}"),
    }
}

/// Export the transcript from a running gateway
async fn export(port: u16, output: &Path, print: bool) -> anyhow::Result<()> {
    let url = format!("http://127.0.0.1:{port}/api/transcript");
    let response = reqwest::get(&url)
        .await
        .map_err(|e| anyhow::anyhow!("no gateway at {url}: {e}; is `fable serve` running?"))?;

    if !response.status().is_success() {
        anyhow::bail!("gateway returned {}", response.status());
    }

    let transcript = response.text().await?;

    if print {
        println!("{transcript}");
    } else {
        std::fs::write(output, &transcript)?;
        println!("Transcript written to {}", output.display());
    }

    Ok(())
}

/// Show status of a running gateway
async fn status(port: u16) -> anyhow::Result<()> {
    let url = format!("http://127.0.0.1:{port}/api/status");
    let response = reqwest::get(&url)
        .await
        .map_err(|e| anyhow::anyhow!("no gateway at {url}: {e}; is `fable serve` running?"))?;

    if !response.status().is_success() {
        anyhow::bail!("gateway returned {}", response.status());
    }

    let status: serde_json::Value = response.json().await?;

    println!("fable gateway v{}", status["version"].as_str().unwrap_or("?"));
    println!("  scenario: {}", status["scenario"].as_str().unwrap_or("?"));
    println!("  chat:     {}", status["chat_backend"].as_str().unwrap_or("?"));
    println!(
        "  images:   {}",
        status["image_backend"].as_str().unwrap_or("(none)")
    );
    println!(
        "  voice:    {}",
        if status["voice_available"].as_bool().unwrap_or(false) {
            "available"
        } else {
            "disabled"
        }
    );
    println!("  turns:    {}", status["turns"].as_u64().unwrap_or(0));

    Ok(())
}

/// List available narrator voices
async fn list_voices(scenario: Option<&str>) -> anyhow::Result<()> {
    let config = Config::load(scenario)?;
    let tts = voice::tts_from_config(&config)?;

    let voices = tts.list_voices().await?;
    let default = pick_default_voice(&voices, Some(&config.voice.tts_voice));

    for voice in &voices {
        let marker = if default.is_some_and(|d| d.id == voice.id) {
            "  (default)"
        } else {
            ""
        };
        println!("{:24} {:8} {}{}", voice.name, voice.locale, voice.id, marker);
    }

    Ok(())
}

/// Preview a narrator voice
async fn preview_voice(scenario: Option<&str>, voice_arg: Option<&str>) -> anyhow::Result<()> {
    let config = Config::load(scenario)?;
    let mut tts = voice::tts_from_config(&config)?;

    if let Some(voice) = voice_arg {
        tts = tts.with_voice(voice);
    } else {
        let voices = tts.list_voices().await?;
        if let Some(default) = pick_default_voice(&voices, Some(&config.voice.tts_voice)) {
            tts = tts.with_voice(default.id.clone());
        }
    }

    println!("Previewing voice \"{}\"", tts.voice());
    println!("\"{PREVIEW_SENTENCE}\"");

    let mp3_data = tts.preview().await?;

    let playback = AudioPlayback::new()?;
    playback.play_mp3(&mp3_data)?;

    Ok(())
}

/// Test speaker output with a sine wave
fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let playback = AudioPlayback::new()?;

    // Generate 2 seconds of 440Hz sine wave
    let frequency = 440.0_f32;
    let duration_secs = 2.0_f32;
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let num_samples = (PLAYBACK_SAMPLE_RATE as f32 * duration_secs) as usize;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / PLAYBACK_SAMPLE_RATE as f32;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3 // 30% volume
        })
        .collect();

    println!(
        "Playing {} samples at {} Hz...",
        samples.len(),
        PLAYBACK_SAMPLE_RATE
    );

    playback.play(samples)?;

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");

    Ok(())
}

/// Test TTS output
async fn test_tts(scenario: Option<&str>, text: &str) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let config = Config::load(scenario)?;
    let tts = voice::tts_from_config(&config)?;

    println!("Synthesizing speech...");
    let mp3_data = tts.synthesize(text).await?;
    println!("Got {} bytes of audio data", mp3_data.len());

    println!("Playing audio...");
    let playback = AudioPlayback::new()?;
    playback.play_mp3(&mp3_data)?;

    println!("\n---");
    println!("If you heard the speech, TTS is working!");

    Ok(())
}

/// Capture one utterance and print the transcript
#[allow(clippy::future_not_send)]
async fn listen_once(scenario: Option<&str>) -> anyhow::Result<()> {
    let config = Config::load(scenario)?;
    let stt = voice::stt_from_config(&config)?;
    let listener = Listener::new(stt);

    println!("Listening... speak now.");
    let transcript = listener.listen().await?;
    println!("{transcript}");

    Ok(())
}
