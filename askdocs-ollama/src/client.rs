//! Generation over Ollama's `/api/generate` endpoint.

use askdocs_rag::{GenerationError, Generator};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::OllamaConfig;
use crate::error::Result;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Non-streaming Ollama text generation client.
///
/// Every call is independent; nothing is shared between calls except the
/// pooled HTTP connection, so concurrent calls are safe.
pub struct OllamaClient {
    http: reqwest::Client,
    config: OllamaConfig,
}

impl OllamaClient {
    /// Create a client.
    ///
    /// # Errors
    ///
    /// Returns [`OllamaError::Client`](crate::OllamaError::Client) if the
    /// HTTP client cannot be constructed.
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    /// Generate a completion, reporting failures as a [`GenerationError`].
    ///
    /// The returned text is trimmed. A response without a `response` field
    /// yields an empty string.
    pub async fn try_generate(&self, prompt: &str) -> std::result::Result<String, GenerationError> {
        let body = GenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.config.temperature,
                num_predict: self.config.max_tokens,
            },
        };

        info!(model = %self.config.model, prompt_chars = prompt.chars().count(), "calling Ollama");

        let response = self
            .http
            .post(self.config.endpoint("/api/generate"))
            .timeout(self.config.generate_timeout)
            .json(&body)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GenerationError::Backend { status: status.as_u16(), message });
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                GenerationError::Timeout
            } else {
                GenerationError::InvalidResponse(e.to_string())
            }
        })?;

        debug!(answer_chars = parsed.response.chars().count(), "Ollama generation finished");
        Ok(parsed.response.trim().to_string())
    }
}

/// Timeouts are checked first: a connect timeout is both.
fn classify(e: reqwest::Error) -> GenerationError {
    if e.is_timeout() {
        GenerationError::Timeout
    } else if e.is_connect() {
        GenerationError::Unreachable(e.to_string())
    } else {
        GenerationError::InvalidResponse(e.to_string())
    }
}

#[async_trait]
impl Generator for OllamaClient {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn health_check(&self) -> bool {
        let result = self
            .http
            .get(self.config.endpoint("/api/tags"))
            .timeout(self.config.health_timeout)
            .send()
            .await;
        match result {
            Ok(response) => response.status() == reqwest::StatusCode::OK,
            Err(e) => {
                debug!(error = %e, "Ollama health check failed");
                false
            }
        }
    }

    async fn generate(&self, prompt: &str) -> String {
        match self.try_generate(prompt).await {
            Ok(text) => {
                info!("generated response from Ollama");
                text
            }
            Err(e) => {
                error!(model = %self.config.model, error = %e, "Ollama generation failed");
                e.fallback_message()
            }
        }
    }
}
