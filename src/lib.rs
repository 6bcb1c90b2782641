//! Fable Gateway - Voice-enabled text-adventure gateway for LLM game masters
//!
//! This library provides the core functionality for the Fable gateway:
//! - Game sessions (scenario prompts, tagged turn history, numbered options)
//! - Chat backends for the game master model (Groq, Ollama)
//! - Scene image generation (local ComfyUI polling, hosted API)
//! - Voice input and output (Whisper STT, OpenAI/ElevenLabs TTS)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    Interfaces                        │
//! │     Terminal REPL   │   HTTP API   │   Voice        │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                 Fable Gateway                        │
//! │   Session  │  Scenario  │  Options  │  Speaker      │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                   Backends                           │
//! │   Groq/Ollama  │  ComfyUI/Nebius  │  Whisper/TTS    │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod chat;
pub mod config;
pub mod conversation;
pub mod error;
pub mod images;
pub mod options;
pub mod scenario;
pub mod session;
pub mod setup;
pub mod voice;

pub use config::Config;
pub use conversation::{Conversation, SpeakerLabels, Turn};
pub use error::{Error, Result};
pub use images::{GeneratedImage, ImageProvider};
pub use options::extract_options;
pub use scenario::Scenario;
pub use session::{GameSession, SessionReply};
