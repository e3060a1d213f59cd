//! Connection and sampling settings for an Ollama server.

use std::time::Duration;

use crate::error::{OllamaError, Result};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3.2:1b";
pub const DEFAULT_EMBED_MODEL: &str = "nomic-embed-text";
/// Output width of [`DEFAULT_EMBED_MODEL`].
pub const DEFAULT_EMBED_DIMENSIONS: usize = 768;

/// Settings shared by [`OllamaClient`](crate::OllamaClient) and
/// [`OllamaEmbeddingProvider`](crate::OllamaEmbeddingProvider).
#[derive(Debug, Clone, PartialEq)]
pub struct OllamaConfig {
    /// Server root, without a trailing slash.
    pub base_url: String,
    /// Generation model tag.
    pub model: String,
    pub temperature: f32,
    /// Upper bound on generated tokens (`num_predict`).
    pub max_tokens: u32,
    /// Timeout for the `/api/tags` health probe.
    pub health_timeout: Duration,
    /// Timeout for a whole `/api/generate` call.
    pub generate_timeout: Duration,
    pub embed_model: String,
    pub embed_dimensions: usize,
    /// Timeout for a single `/api/embeddings` call.
    pub embed_timeout: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.3,
            max_tokens: 512,
            health_timeout: Duration::from_secs(5),
            generate_timeout: Duration::from_secs(120),
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
            embed_dimensions: DEFAULT_EMBED_DIMENSIONS,
            embed_timeout: Duration::from_secs(30),
        }
    }
}

impl OllamaConfig {
    pub fn builder() -> OllamaConfigBuilder {
        OllamaConfigBuilder::default()
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Builder for a validated [`OllamaConfig`].
#[derive(Debug, Clone, Default)]
pub struct OllamaConfigBuilder {
    config: OllamaConfig,
}

impl OllamaConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.config.max_tokens = max_tokens;
        self
    }

    pub fn health_timeout(mut self, timeout: Duration) -> Self {
        self.config.health_timeout = timeout;
        self
    }

    pub fn generate_timeout(mut self, timeout: Duration) -> Self {
        self.config.generate_timeout = timeout;
        self
    }

    pub fn embed_model(mut self, model: impl Into<String>, dimensions: usize) -> Self {
        self.config.embed_model = model.into();
        self.config.embed_dimensions = dimensions;
        self
    }

    pub fn embed_timeout(mut self, timeout: Duration) -> Self {
        self.config.embed_timeout = timeout;
        self
    }

    /// Build the [`OllamaConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`OllamaError::ConfigError`] if the base URL is not http(s),
    /// a model name is blank, the temperature is negative or not finite,
    /// `max_tokens` or `embed_dimensions` is zero, or a timeout is zero.
    pub fn build(self) -> Result<OllamaConfig> {
        let mut config = self.config;
        config.base_url = config.base_url.trim().trim_end_matches('/').to_string();

        if !(config.base_url.starts_with("http://") || config.base_url.starts_with("https://")) {
            return Err(OllamaError::ConfigError(format!(
                "base_url must start with http:// or https://, got '{}'",
                config.base_url
            )));
        }
        if config.model.trim().is_empty() || config.embed_model.trim().is_empty() {
            return Err(OllamaError::ConfigError("model names must not be empty".to_string()));
        }
        if !config.temperature.is_finite() || config.temperature < 0.0 {
            return Err(OllamaError::ConfigError(format!(
                "temperature must be a non-negative number, got {}",
                config.temperature
            )));
        }
        if config.max_tokens == 0 {
            return Err(OllamaError::ConfigError("max_tokens must be greater than zero".to_string()));
        }
        if config.embed_dimensions == 0 {
            return Err(OllamaError::ConfigError(
                "embed_dimensions must be greater than zero".to_string(),
            ));
        }
        if [config.health_timeout, config.generate_timeout, config.embed_timeout]
            .iter()
            .any(Duration::is_zero)
        {
            return Err(OllamaError::ConfigError("timeouts must be non-zero".to_string()));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_local_ollama() {
        let config = OllamaConfig::builder().build().unwrap();
        assert_eq!(config.base_url, "http://localhost:11434");
        assert_eq!(config.model, "llama3.2:1b");
        assert_eq!(config.max_tokens, 512);
        assert_eq!(config.health_timeout, Duration::from_secs(5));
        assert_eq!(config.generate_timeout, Duration::from_secs(120));
        assert_eq!(config.endpoint("/api/tags"), "http://localhost:11434/api/tags");
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let config = OllamaConfig::builder().base_url("http://gpu-box:11434/").build().unwrap();
        assert_eq!(config.endpoint("/api/generate"), "http://gpu-box:11434/api/generate");
    }

    #[test]
    fn rejects_invalid_settings() {
        assert!(OllamaConfig::builder().base_url("localhost:11434").build().is_err());
        assert!(OllamaConfig::builder().model(" ").build().is_err());
        assert!(OllamaConfig::builder().temperature(-0.1).build().is_err());
        assert!(OllamaConfig::builder().max_tokens(0).build().is_err());
        assert!(OllamaConfig::builder().generate_timeout(Duration::ZERO).build().is_err());
        assert!(OllamaConfig::builder().embed_model("nomic-embed-text", 0).build().is_err());
    }
}
