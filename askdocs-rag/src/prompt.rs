//! Prompt construction.

use std::path::Path;

use tracing::{debug, warn};

/// Grounding rules used when no system prompt file is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful document assistant. Your role is to answer questions based ONLY on the provided context documents.

CRITICAL RULES:
1. Answer ONLY using information from the provided context
2. If the context doesn't contain the answer, say \"I don't have information about that in the provided documents\"
3. Do NOT mention source files or citations in your answer
4. Be precise, helpful, and friendly
5. Do not make up or assume information not present in the context
6. If multiple sources provide relevant info, synthesize them coherently
7. Provide clean, natural answers without any references to where the information came from";

/// Builds generation prompts from fixed system instructions.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptBuilder {
    system_prompt: String,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self { system_prompt: DEFAULT_SYSTEM_PROMPT.to_string() }
    }
}

impl PromptBuilder {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self { system_prompt: system_prompt.into() }
    }

    /// Load the system prompt from `path`, falling back to
    /// [`DEFAULT_SYSTEM_PROMPT`] if the file is missing, unreadable or blank.
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) if !text.trim().is_empty() => {
                debug!(path = %path.display(), "loaded system prompt");
                Self::new(text.trim())
            }
            Ok(_) => {
                warn!(path = %path.display(), "system prompt file is empty, using default");
                Self::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "system prompt not loaded, using default");
                Self::default()
            }
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// System instructions, then context, then the literal question.
    pub fn build(&self, question: &str, context: &str) -> String {
        format!(
            "{}\n\nCONTEXT DOCUMENTS:\n{context}\n\nUSER QUESTION: {question}\n\nANSWER:",
            self.system_prompt
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_appear_in_fixed_order() {
        let prompt = PromptBuilder::default().build("What are the fees?", "[Source 1: a]\nfees\n");
        let system = prompt.find("CRITICAL RULES").unwrap();
        let context = prompt.find("CONTEXT DOCUMENTS:\n[Source 1: a]").unwrap();
        let question = prompt.find("USER QUESTION: What are the fees?").unwrap();
        assert!(system < context && context < question);
        assert!(prompt.ends_with("ANSWER:"));
    }

    #[test]
    fn loads_prompt_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("system_prompt.txt");
        std::fs::write(&path, "  Only answer from context.\n").unwrap();
        assert_eq!(PromptBuilder::from_file(&path).system_prompt(), "Only answer from context.");
    }

    #[test]
    fn missing_or_blank_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(PromptBuilder::from_file(dir.path().join("missing.txt")), PromptBuilder::default());

        let blank = dir.path().join("blank.txt");
        std::fs::write(&blank, "\n\n").unwrap();
        assert_eq!(PromptBuilder::from_file(&blank), PromptBuilder::default());
    }
}
