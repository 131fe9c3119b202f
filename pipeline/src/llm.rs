//! Local model client.
//!
//! Sends a prompt to a locally hosted inference server and returns the
//! generated text.

use std::time::Duration;

use async_trait::async_trait;
use common::config::LlmConfig;
use common::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Text generation backend.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generates a completion for `prompt` with the given model.
    async fn generate(&self, prompt: &str, model: &str) -> AppResult<String>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

/// Client for an Ollama-compatible `/api/generate` endpoint.
pub struct OllamaClient {
    client: reqwest::Client,
    endpoint: String,
}

impl OllamaClient {
    pub fn new(config: &LlmConfig) -> AppResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| AppError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn generate(&self, prompt: &str, model: &str) -> AppResult<String> {
        tracing::debug!(model, prompt_len = prompt.len(), "调用模型生成");

        let body = GenerateRequest {
            model,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ModelUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            let detail = detail.trim();
            return Err(AppError::ModelUnavailable(if detail.is_empty() {
                format!("HTTP {}", status)
            } else {
                format!("HTTP {}: {}", status, detail)
            }));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AppError::ModelResponse(e.to_string()))?;

        parsed
            .response
            .ok_or_else(|| AppError::ModelResponse("no `response` field in body".into()))
    }
}
