//! Scene image generation backends
//!
//! A backend turns a styled prompt into a viewable image URL. The
//! ComfyUI backend drives a local diffusion server with a submit/poll
//! job cycle; the hosted backend is a single API call. Image generation
//! is optional: `from_config` returns `None` when disabled.

pub mod comfy;
pub mod hosted;

pub use comfy::{ComfyImages, ImageJob};
pub use hosted::HostedImages;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::{Config, Error, Result};

/// A generated scene image
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedImage {
    /// URL where the image can be viewed
    pub url: String,
}

/// Trait for image generation backends
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Generate an image for the given prompt, waiting for completion
    ///
    /// # Errors
    ///
    /// Returns error if the backend is unreachable, the request fails,
    /// or the job does not finish within the configured poll cap
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

/// Build the configured image backend, if any
///
/// # Errors
///
/// Returns error if the backend name is unknown, its credential is
/// missing, or its URL is invalid
pub fn from_config(config: &Config) -> Result<Option<Arc<dyn ImageProvider>>> {
    match config.image.provider.as_str() {
        "comfy" => {
            let backend = ComfyImages::new(
                config.image.comfy_url.clone(),
                &config.image.size,
                config.scenario.negative_prompt().to_string(),
                config.image.poll_interval_ms,
                config.image.max_polls,
            )?;
            Ok(Some(Arc::new(backend)))
        }
        "hosted" => {
            let backend = HostedImages::new(
                config.api_keys.nebius.clone().unwrap_or_default(),
                config.image.hosted_url.clone(),
                config.image.size.clone(),
            )?;
            Ok(Some(Arc::new(backend)))
        }
        "none" => Ok(None),
        other => Err(Error::Config(format!("unknown image provider: {other}"))),
    }
}

/// Parse a "WxH" size string like "512x512"
///
/// # Errors
///
/// Returns error if the string is not two integers joined by 'x'
pub fn parse_size(size: &str) -> Result<(u32, u32)> {
    let invalid = || Error::Config(format!("invalid image size '{size}', expected WxH"));
    let (w, h) = size.split_once('x').ok_or_else(invalid)?;
    let width = w.trim().parse().map_err(|_| invalid())?;
    let height = h.trim().parse().map_err(|_| invalid())?;
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("512x512").unwrap(), (512, 512));
        assert_eq!(parse_size("1024x768").unwrap(), (1024, 768));
    }

    #[test]
    fn test_parse_size_rejects_garbage() {
        assert!(parse_size("512").is_err());
        assert!(parse_size("512xbig").is_err());
        assert!(parse_size("").is_err());
    }
}
