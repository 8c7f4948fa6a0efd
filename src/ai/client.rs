use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{AppError, Result};

const MAX_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(1000);
const SMOKE_TEST_PROMPT: &str = r#"Hello, please respond with "OK" if you can read this."#;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

/// Sampling policy sent with every completion request.
#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    num_predict: u32,
    stop: Vec<&'static str>,
    repeat_penalty: f32,
    presence_penalty: f32,
}

impl GenerateOptions {
    fn policy() -> Self {
        Self {
            temperature: 0.5,
            top_k: 50,
            top_p: 0.95,
            num_predict: 2048,
            stop: vec!["</response>"],
            repeat_penalty: 1.1,
            presence_penalty: 0.5,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

/// Client for a local Ollama daemon.
///
/// Calls fail with [`AppError::NotReady`] until [`OllamaClient::initialize`]
/// has confirmed the model is installed and answering.
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    retry_delay: Duration,
    ready: AtomicBool,
}

impl OllamaClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.ollama_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            retry_delay: RETRY_BASE_DELAY,
            ready: AtomicBool::new(false),
        })
    }

    #[cfg(test)]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Checks that the endpoint lists the configured model and that the model
    /// answers a trivial prompt. Marks the client ready on success.
    pub async fn initialize(&self) -> Result<()> {
        tracing::info!("Checking Ollama connection at {}", self.base_url);

        let response = self
            .client
            .get(format!("{}/tags", self.base_url))
            .send()
            .await
            .map_err(|e| AppError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::Unavailable(format!(
                "model listing returned HTTP {}",
                response.status()
            )));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| AppError::Unavailable(e.to_string()))?;

        tracing::debug!(
            "Available models: {}",
            tags.models.iter().map(|m| m.name.as_str()).collect::<Vec<_>>().join(", ")
        );

        if !tags.models.iter().any(|m| m.name == self.model) {
            tracing::warn!("Model {} not found. Please run: ollama pull {}", self.model, self.model);
            return Err(AppError::ModelMissing(self.model.clone()));
        }

        let reply = self.complete_with_retry(SMOKE_TEST_PROMPT).await?;
        if !reply.contains("OK") {
            return Err(AppError::Unavailable(
                "model response validation failed".to_string(),
            ));
        }

        self.ready.store(true, Ordering::Release);
        tracing::info!("Model {} is ready", self.model);
        Ok(())
    }

    /// Returns the completion for `prompt`, retrying transient failures.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        if !self.is_ready() {
            return Err(AppError::NotReady);
        }
        self.complete_with_retry(prompt).await
    }

    async fn complete_with_retry(&self, prompt: &str) -> Result<String> {
        for attempt in 1..=MAX_ATTEMPTS {
            tracing::debug!(
                "Generating completion (attempt {}/{}), prompt length {} chars",
                attempt,
                MAX_ATTEMPTS,
                prompt.len()
            );

            match self.complete_once(prompt).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    tracing::warn!(
                        "Completion failed (attempt {}/{}): {}",
                        attempt,
                        MAX_ATTEMPTS,
                        e
                    );
                    if attempt < MAX_ATTEMPTS {
                        tokio::time::sleep(retry_delay(self.retry_delay, attempt)).await;
                    }
                }
            }
        }

        Err(AppError::CompletionExhausted {
            attempts: MAX_ATTEMPTS,
        })
    }

    async fn complete_once(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions::policy(),
        };

        let started = Instant::now();
        let response = self
            .client
            .post(format!("{}/generate", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("HTTP {}: {}", status, error_text).into());
        }

        let result: GenerateResponse = response.json().await?;
        tracing::debug!(
            "Completion generated in {:.2}s, {} chars",
            started.elapsed().as_secs_f64(),
            result.response.len()
        );

        Ok(result.response)
    }
}

/// Delay before the retry that follows `attempt`; grows linearly.
fn retry_delay(base: Duration, attempt: u32) -> Duration {
    base * attempt
}
