//! Hosted image generation backend
//!
//! Single-call backend against an OpenAI-style `images/generations`
//! endpoint (Nebius by default).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::images::{GeneratedImage, ImageProvider};
use crate::{Error, Result};

/// Hosted image API backend
pub struct HostedImages {
    client: Client,
    api_key: String,
    base_url: String,
    size: String,
}

impl HostedImages {
    /// Create a new hosted backend
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty or the base URL is
    /// invalid. The key check happens here so a missing credential is
    /// reported before any request is made.
    pub fn new(api_key: String, base_url: String, size: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "NEBIUS_API_KEY required for hosted image generation".to_string(),
            ));
        }
        url::Url::parse(&base_url)
            .map_err(|e| Error::Config(format!("invalid image API URL '{base_url}': {e}")))?;

        Ok(Self {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            size,
        })
    }
}

#[async_trait]
impl ImageProvider for HostedImages {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage> {
        let request = ImageGenerationRequest {
            prompt,
            n: 1,
            size: &self.size,
        };

        tracing::debug!(prompt_len = prompt.len(), "requesting hosted image");

        let response = self
            .client
            .post(format!("{}/images/generations", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Image(format!("image request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Image(format!("image API error: {status} - {body}")));
        }

        let result: ImageGenerationResponse = response
            .json()
            .await
            .map_err(|e| Error::Image(format!("failed to parse image response: {e}")))?;

        result
            .data
            .into_iter()
            .next()
            .map(|image| GeneratedImage { url: image.url })
            .ok_or_else(|| Error::Image("invalid response format from image API".to_string()))
    }

    fn name(&self) -> &'static str {
        "hosted"
    }
}

#[derive(Serialize)]
struct ImageGenerationRequest<'a> {
    prompt: &'a str,
    n: u32,
    size: &'a str,
}

#[derive(Deserialize)]
struct ImageGenerationResponse {
    data: Vec<ImageData>,
}

#[derive(Deserialize)]
struct ImageData {
    url: String,
}
