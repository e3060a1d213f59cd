//! Text-generation backend abstraction.

use async_trait::async_trait;
use thiserror::Error;

/// Answer text returned when the backend does not respond in time.
pub const TIMEOUT_FALLBACK: &str = "Error: Request timed out. Please try again.";

/// Answer text returned when the backend cannot be reached.
pub const UNREACHABLE_FALLBACK: &str = "Error: Could not connect to the generation backend. \
     Please ensure Ollama is running with 'ollama serve'.";

/// Why a generation call failed.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GenerationError {
    #[error("generation request timed out")]
    Timeout,

    #[error("generation backend unreachable: {0}")]
    Unreachable(String),

    #[error("generation backend returned {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("invalid generation response: {0}")]
    InvalidResponse(String),
}

impl GenerationError {
    /// The deterministic, user-facing text that replaces the answer.
    pub fn fallback_message(&self) -> String {
        match self {
            Self::Timeout => TIMEOUT_FALLBACK.to_string(),
            Self::Unreachable(_) => UNREACHABLE_FALLBACK.to_string(),
            other => format!("Error generating response: {other}"),
        }
    }
}

/// A networked text-generation backend.
///
/// `generate` never fails: implementations convert timeouts, connection
/// failures and backend errors into [`GenerationError::fallback_message`] so
/// the pipeline can surface a readable answer instead of an error.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Human-readable backend/model name for logs and health output.
    fn name(&self) -> &str;

    /// Lightweight reachability probe. Returns `false` on any failure.
    async fn health_check(&self) -> bool;

    /// Generate a completion for the full prompt.
    async fn generate(&self, prompt: &str) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_and_unreachable_have_distinct_fixed_messages() {
        assert_eq!(GenerationError::Timeout.fallback_message(), TIMEOUT_FALLBACK);
        assert_eq!(
            GenerationError::Unreachable("refused".into()).fallback_message(),
            UNREACHABLE_FALLBACK
        );
        assert_ne!(TIMEOUT_FALLBACK, UNREACHABLE_FALLBACK);
    }

    #[test]
    fn backend_errors_include_detail() {
        let err = GenerationError::Backend { status: 404, message: "model not found".into() };
        assert_eq!(
            err.fallback_message(),
            "Error generating response: generation backend returned 404: model not found"
        );
    }
}
