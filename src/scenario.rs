//! Scenario configuration
//!
//! A scenario.json document describes one adventure: the narrator's
//! system instructions, the opening scene, speaker labels for
//! transcripts, and styling applied to scene image prompts.

use serde::{Deserialize, Serialize};

use crate::conversation::SpeakerLabels;

/// Style prefix applied to scene image prompts when none is configured
pub const DEFAULT_STYLE_PREFIX: &str = "Fantasy game scene: ";

/// Negative prompt used when none is configured
pub const DEFAULT_NEGATIVE_PROMPT: &str = "ugly, bad quality, blurry";

/// A scenario defines one adventure
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    /// Schema URL (optional, for validation)
    #[serde(rename = "$schema")]
    pub schema: Option<String>,

    /// Semantic version of this scenario file
    pub version: String,

    /// Unique identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Short descriptive phrase
    pub tagline: Option<String>,

    /// Narrator instructions and opening scene
    pub prompt: ScenarioPrompt,

    /// Speaker labels for transcript rendering
    #[serde(default)]
    pub labels: SpeakerLabels,

    /// Scene image styling
    pub image: Option<ImageStyle>,
}

/// Narrator prompt configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioPrompt {
    /// System instructions for the game master model
    pub system: String,

    /// Opening narration that seeds every session
    pub opening: String,
}

/// Styling applied to scene image prompts
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageStyle {
    /// Text prepended to the subject when building an image prompt
    #[serde(default = "default_style_prefix")]
    pub style_prefix: String,

    /// Negative prompt for diffusion backends
    #[serde(default = "default_negative_prompt")]
    pub negative_prompt: String,
}

fn default_style_prefix() -> String {
    DEFAULT_STYLE_PREFIX.to_string()
}

fn default_negative_prompt() -> String {
    DEFAULT_NEGATIVE_PROMPT.to_string()
}

impl Default for ImageStyle {
    fn default() -> Self {
        Self {
            style_prefix: default_style_prefix(),
            negative_prompt: default_negative_prompt(),
        }
    }
}

impl Scenario {
    /// System instructions for the game master model
    #[must_use]
    pub fn system_prompt(&self) -> &str {
        &self.prompt.system
    }

    /// Opening narration
    #[must_use]
    pub fn opening(&self) -> &str {
        &self.prompt.opening
    }

    /// Build a scene image prompt for the given subject text
    #[must_use]
    pub fn image_prompt(&self, subject: &str) -> String {
        let prefix = self
            .image
            .as_ref()
            .map_or(DEFAULT_STYLE_PREFIX, |style| style.style_prefix.as_str());
        format!("{prefix}{subject}")
    }

    /// Negative prompt for diffusion backends
    #[must_use]
    pub fn negative_prompt(&self) -> &str {
        self.image
            .as_ref()
            .map_or(DEFAULT_NEGATIVE_PROMPT, |style| style.negative_prompt.as_str())
    }
}
