//! Request and response types for a single question/answer turn.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};
use crate::retriever::Source;

/// Longest accepted question, in characters.
pub const MAX_QUESTION_CHARS: usize = 500;

/// A question, optionally tagged with a caller-chosen conversation id.
///
/// The id is echoed back and has no server-side effect; every turn is
/// answered independently.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

impl ChatRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self { question: question.into(), conversation_id: None }
    }

    pub fn with_conversation_id(mut self, id: impl Into<String>) -> Self {
        self.conversation_id = Some(id.into());
        self
    }

    /// Check that the question is non-blank and at most
    /// [`MAX_QUESTION_CHARS`] characters long.
    pub fn validate(&self) -> Result<()> {
        if self.question.trim().is_empty() {
            return Err(RagError::InvalidRequest("question must not be empty".to_string()));
        }
        let len = self.question.chars().count();
        if len > MAX_QUESTION_CHARS {
            return Err(RagError::InvalidRequest(format!(
                "question is {len} characters, the limit is {MAX_QUESTION_CHARS}"
            )));
        }
        Ok(())
    }
}

/// The generated answer with the sources it was grounded on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub answer: String,
    pub sources: Vec<Source>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}
