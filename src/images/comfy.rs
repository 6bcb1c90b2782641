//! ComfyUI image backend
//!
//! Submits a fixed SDXL text-to-image workflow to a local ComfyUI
//! server, then polls job history on a fixed interval until the output
//! image appears. Polling runs as a spawned task wrapped in an
//! [`ImageJob`] handle; dropping the handle aborts the task, so an
//! abandoned request cannot leave a poll loop running.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::task::JoinHandle;

use crate::images::{GeneratedImage, ImageProvider};
use crate::{Error, Result};

/// Checkpoint loaded by the workflow
const CHECKPOINT: &str = "sd_xl_base_1.0.safetensors";

/// ComfyUI image backend
pub struct ComfyImages {
    client: Client,
    base_url: String,
    width: u32,
    height: u32,
    negative_prompt: String,
    poll_interval: Duration,
    max_polls: u32,
}

impl ComfyImages {
    /// Create a new ComfyUI backend
    ///
    /// # Errors
    ///
    /// Returns error if the base URL or size string is invalid
    pub fn new(
        base_url: String,
        size: &str,
        negative_prompt: String,
        poll_interval_ms: u64,
        max_polls: u32,
    ) -> Result<Self> {
        url::Url::parse(&base_url)
            .map_err(|e| Error::Config(format!("invalid ComfyUI URL '{base_url}': {e}")))?;
        let (width, height) = super::parse_size(size)?;

        Ok(Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            width,
            height,
            negative_prompt,
            poll_interval: Duration::from_millis(poll_interval_ms),
            max_polls,
        })
    }

    /// Check that the ComfyUI server is reachable before submitting
    async fn check_alive(&self) -> Result<()> {
        let url = format!("{}/system_stats", self.base_url);
        let reachable = self
            .client
            .get(&url)
            .send()
            .await
            .is_ok_and(|r| r.status().is_success());

        if reachable {
            Ok(())
        } else {
            Err(Error::Image(format!(
                "cannot connect to ComfyUI at {}: make sure it is running and reachable",
                self.base_url
            )))
        }
    }

    /// Build the SDXL text-to-image workflow graph
    fn build_workflow(&self, prompt: &str, seed: u32) -> Value {
        json!({
            "3": {
                "inputs": { "text": prompt, "clip": ["4", 0] },
                "class_type": "CLIPTextEncode"
            },
            "4": {
                "inputs": { "ckpt_name": CHECKPOINT },
                "class_type": "CheckpointLoaderSimple"
            },
            "5": {
                "inputs": {
                    "seed": seed,
                    "steps": 20,
                    "cfg": 8,
                    "sampler_name": "euler",
                    "scheduler": "normal",
                    "denoise": 1,
                    "model": ["4", 0],
                    "positive": ["3", 0],
                    "negative": ["6", 0],
                    "latent_image": ["7", 0]
                },
                "class_type": "KSampler"
            },
            "6": {
                "inputs": { "text": self.negative_prompt, "clip": ["4", 0] },
                "class_type": "CLIPTextEncode"
            },
            "7": {
                "inputs": { "width": self.width, "height": self.height, "batch_size": 1 },
                "class_type": "EmptyLatentImage"
            },
            "8": {
                "inputs": { "samples": ["5", 0], "vae": ["4", 2] },
                "class_type": "VAEDecode"
            }
        })
    }

    /// Submit the workflow, returning the server-assigned job id
    async fn submit(&self, prompt: &str) -> Result<String> {
        let seed: u32 = rand::thread_rng().gen_range(0..1_000_000);
        let workflow = self.build_workflow(prompt, seed);

        let response = self
            .client
            .post(format!("{}/prompt", self.base_url))
            .json(&json!({ "prompt": workflow }))
            .send()
            .await
            .map_err(|e| Error::Image(format!("ComfyUI submit failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Image(format!("ComfyUI API error: {status} - {body}")));
        }

        let result: PromptResponse = response
            .json()
            .await
            .map_err(|e| Error::Image(format!("failed to parse ComfyUI response: {e}")))?;

        Ok(result.prompt_id)
    }

    /// Ask job history whether the output image exists yet
    async fn poll_output(client: &Client, base_url: &str, job_id: &str) -> Result<Option<String>> {
        let url = format!("{base_url}/history/{}", urlencoding::encode(job_id));
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Image(format!("ComfyUI status poll failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Error::Image(format!("ComfyUI history error: {status}")));
        }

        let history: Value = response
            .json()
            .await
            .map_err(|e| Error::Image(format!("failed to parse ComfyUI history: {e}")))?;

        // The output image lands under the VAEDecode node ("8")
        Ok(history
            .get(job_id)
            .and_then(|entry| entry.pointer("/outputs/8/images/0/filename"))
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    /// Submit a job and spawn its polling task
    ///
    /// The returned handle aborts polling when dropped.
    ///
    /// # Errors
    ///
    /// Returns error if the server is unreachable or submission fails
    pub async fn submit_job(&self, prompt: &str) -> Result<ImageJob> {
        self.check_alive().await?;
        let job_id = self.submit(prompt).await?;
        tracing::info!(job_id = %job_id, "image job submitted");

        let client = self.client.clone();
        let base_url = self.base_url.clone();
        let poll_interval = self.poll_interval;
        let max_polls = self.max_polls;
        let id = job_id.clone();

        let handle = tokio::spawn(async move {
            for attempt in 1..=max_polls {
                tokio::time::sleep(poll_interval).await;
                if let Some(filename) = Self::poll_output(&client, &base_url, &id).await? {
                    tracing::debug!(job_id = %id, attempt, "image job ready");
                    return Ok(GeneratedImage {
                        url: format!("{base_url}/view?filename={}", urlencoding::encode(&filename)),
                    });
                }
            }

            Err(Error::Image(format!(
                "image job {id} not ready after {max_polls} polls"
            )))
        });

        Ok(ImageJob {
            job_id,
            handle: Some(handle),
        })
    }
}

#[async_trait]
impl ImageProvider for ComfyImages {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage> {
        self.submit_job(prompt).await?.wait().await
    }

    fn name(&self) -> &'static str {
        "comfy"
    }
}

/// Handle to an in-flight image job
///
/// Polling stops as soon as the handle is dropped.
pub struct ImageJob {
    job_id: String,
    handle: Option<JoinHandle<Result<GeneratedImage>>>,
}

impl ImageJob {
    /// Server-assigned job id
    #[must_use]
    pub fn id(&self) -> &str {
        &self.job_id
    }

    /// Wait for the job to complete
    ///
    /// # Errors
    ///
    /// Returns error if polling failed or hit the attempt cap
    pub async fn wait(mut self) -> Result<GeneratedImage> {
        let Some(handle) = self.handle.take() else {
            return Err(Error::Image("image job already consumed".to_string()));
        };

        handle
            .await
            .map_err(|e| Error::Image(format!("image poll task failed: {e}")))?
    }
}

impl Drop for ImageJob {
    fn drop(&mut self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }
}

#[derive(Deserialize)]
struct PromptResponse {
    prompt_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_backend() -> ComfyImages {
        ComfyImages::new(
            "http://127.0.0.1:8188".to_string(),
            "512x512",
            "ugly, bad quality, blurry".to_string(),
            1000,
            120,
        )
        .unwrap()
    }

    #[test]
    fn test_workflow_topology() {
        let workflow = test_backend().build_workflow("Fantasy game scene: a stone temple", 42);

        assert_eq!(workflow["3"]["class_type"], "CLIPTextEncode");
        assert_eq!(workflow["3"]["inputs"]["text"], "Fantasy game scene: a stone temple");
        assert_eq!(workflow["4"]["class_type"], "CheckpointLoaderSimple");
        assert_eq!(workflow["4"]["inputs"]["ckpt_name"], CHECKPOINT);
        assert_eq!(workflow["5"]["class_type"], "KSampler");
        assert_eq!(workflow["5"]["inputs"]["seed"], 42);
        assert_eq!(workflow["5"]["inputs"]["steps"], 20);
        assert_eq!(workflow["5"]["inputs"]["cfg"], 8);
        assert_eq!(workflow["5"]["inputs"]["sampler_name"], "euler");
        assert_eq!(workflow["6"]["inputs"]["text"], "ugly, bad quality, blurry");
        assert_eq!(workflow["7"]["inputs"]["width"], 512);
        assert_eq!(workflow["7"]["inputs"]["height"], 512);
        assert_eq!(workflow["7"]["inputs"]["batch_size"], 1);
        assert_eq!(workflow["8"]["class_type"], "VAEDecode");
    }

    #[test]
    fn test_sampler_wiring() {
        let workflow = test_backend().build_workflow("p", 1);
        assert_eq!(workflow["5"]["inputs"]["positive"][0], "3");
        assert_eq!(workflow["5"]["inputs"]["negative"][0], "6");
        assert_eq!(workflow["5"]["inputs"]["latent_image"][0], "7");
        assert_eq!(workflow["8"]["inputs"]["samples"][0], "5");
    }

    #[test]
    fn test_invalid_url_rejected() {
        let err = ComfyImages::new(
            "not a url".to_string(),
            "512x512",
            String::new(),
            1000,
            120,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
