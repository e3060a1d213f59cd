//! Document chunking.
//!
//! This module provides the [`Chunker`] trait, the [`RecursiveChunker`]
//! implementation, and [`chunk_documents`], which applies a chunker to a batch
//! while isolating per-document failures.

use std::collections::VecDeque;

use tracing::{info, warn};

use crate::config::RagConfig;
use crate::document::{Chunk, Document};
use crate::error::{RagError, Result};

/// Separators tried in order: paragraph, line, sentence, word, character.
pub const DEFAULT_SEPARATORS: [&str; 5] = ["\n\n", "\n", ". ", " ", ""];

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s with text and metadata but no embeddings.
/// Embeddings are attached later by the [`EmbeddingIndex`](crate::EmbeddingIndex).
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document has no text.
    fn chunk(&self, document: &Document) -> Result<Vec<Chunk>>;
}

/// Chunk every document in `documents`.
///
/// A document that fails to chunk is logged and skipped; the rest of the batch
/// is still processed. Empty input produces empty output.
pub fn chunk_documents(chunker: &dyn Chunker, documents: &[Document]) -> Vec<Chunk> {
    if documents.is_empty() {
        warn!("no documents to chunk");
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut failed = 0usize;
    for document in documents {
        match chunker.chunk(document) {
            Ok(doc_chunks) => chunks.extend(doc_chunks),
            Err(e) => {
                failed += 1;
                warn!(source = %document.metadata.source, error = %e, "skipping document");
            }
        }
    }

    info!(
        document_count = documents.len(),
        chunk_count = chunks.len(),
        failed,
        "chunked documents"
    );
    chunks
}

/// Splits text recursively using an ordered list of separators.
///
/// The coarsest separator present in the text is used first; pieces that are
/// still too long are split again with the next separator, down to single
/// characters. Small pieces are then merged back into chunks of at most
/// `chunk_size` characters, and each chunk starts with up to `chunk_overlap`
/// characters carried over from the end of the previous one. Separators stay
/// attached to the start of the piece that follows them.
///
/// # Example
///
/// ```rust,ignore
/// use askdocs_rag::RecursiveChunker;
///
/// let chunker = RecursiveChunker::new(1000, 200)?;
/// let chunks = chunker.chunk(&document)?;
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker` with the default separators.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `chunk_size` is zero or
    /// `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RagError::ConfigError("chunk_size must be greater than zero".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Create a chunker from the sizes in a [`RagConfig`].
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Replace the separator list. An empty string separator splits into
    /// single characters and should be last.
    pub fn with_separators<S: Into<String>>(mut self, separators: impl IntoIterator<Item = S>) -> Self {
        self.separators = separators.into_iter().map(Into::into).collect();
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split raw text into chunk strings.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut remaining: &[String] = &[];
        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = "";
                break;
            }
            if text.contains(candidate.as_str()) {
                separator = candidate;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let mut chunks = Vec::new();
        let mut small: Vec<&str> = Vec::new();
        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) < self.chunk_size {
                small.push(piece);
                continue;
            }
            if !small.is_empty() {
                chunks.extend(self.merge_pieces(&small));
                small.clear();
            }
            if remaining.is_empty() {
                let trimmed = piece.trim();
                if !trimmed.is_empty() {
                    chunks.push(trimmed.to_string());
                }
            } else {
                chunks.extend(self.split_recursive(piece, remaining));
            }
        }
        if !small.is_empty() {
            chunks.extend(self.merge_pieces(&small));
        }
        chunks
    }

    /// Greedily pack pieces into chunks, carrying overlap between them.
    fn merge_pieces(&self, pieces: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);
            if total + len > self.chunk_size && !window.is_empty() {
                push_joined(&mut chunks, &window);
                while total > self.chunk_overlap || (total + len > self.chunk_size && total > 0) {
                    let Some(front) = window.pop_front() else { break };
                    total -= char_len(front);
                }
            }
            window.push_back(piece);
            total += len;
        }
        push_joined(&mut chunks, &window);
        chunks
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &Document) -> Result<Vec<Chunk>> {
        if document.metadata.source.trim().is_empty() {
            return Err(RagError::ChunkingError("document has an empty source label".to_string()));
        }
        if document.text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let pieces = if char_len(&document.text) <= self.chunk_size {
            vec![document.text.clone()]
        } else {
            self.split_text(&document.text)
        };

        Ok(pieces
            .into_iter()
            .enumerate()
            .map(|(i, text)| Chunk::new(text, document.metadata.clone(), i))
            .collect())
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn push_joined(chunks: &mut Vec<String>, window: &VecDeque<&str>) {
    let joined: String = window.iter().copied().collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

/// Split at every occurrence of `separator`, keeping the separator at the
/// start of the following piece. An empty separator yields single characters.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text.char_indices().map(|(i, c)| &text[i..i + c.len_utf8()]).collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (pos, _) in text.match_indices(separator) {
        if pos > start {
            pieces.push(&text[start..pos]);
            start = pos;
        }
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentMetadata;

    fn doc(text: &str) -> Document {
        Document::new(text, "data/test.txt")
    }

    #[test]
    fn short_document_yields_single_identical_chunk() {
        let chunker = RecursiveChunker::new(100, 20).unwrap();
        let text = "Admission requires 75% in 12th grade.";
        let chunks = chunker.chunk(&doc(text)).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, text);
        assert_eq!(chunks[0].metadata, DocumentMetadata::new("data/test.txt"));
        assert_eq!(chunks[0].chunk_index, 0);
    }

    #[test]
    fn blank_document_yields_no_chunks() {
        let chunker = RecursiveChunker::new(100, 20).unwrap();
        assert!(chunker.chunk(&doc("")).unwrap().is_empty());
        assert!(chunker.chunk(&doc("  \n\n ")).unwrap().is_empty());
    }

    #[test]
    fn unbroken_text_chunk_count_matches_stride() {
        let chunker = RecursiveChunker::new(100, 20).unwrap();
        let text = "x".repeat(1000);
        let chunks = chunker.chunk(&doc(&text)).unwrap();
        // ceil((1000 - 20) / (100 - 20)) = 13
        assert_eq!(chunks.len(), 13);
        assert!(chunks.iter().all(|c| c.text.chars().count() <= 100));
    }

    #[test]
    fn consecutive_chunks_share_overlap() {
        let chunker = RecursiveChunker::new(100, 20).unwrap();
        let text: String = (0..1000).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let chunks = chunker.split_text(&text);
        for pair in chunks.windows(2) {
            let skip = pair[0].chars().count() - 20;
            let tail: String = pair[0].chars().skip(skip).collect();
            assert!(pair[1].starts_with(&tail), "missing overlap between {:?} and {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn word_text_chunk_count_within_one_of_formula() {
        let chunker = RecursiveChunker::new(100, 20).unwrap();
        let text = vec!["word"; 200].join(" ");
        let length = text.chars().count();
        let expected = (length - 20).div_ceil(100 - 20);
        let chunks = chunker.chunk(&doc(&text)).unwrap();
        assert!(
            chunks.len().abs_diff(expected) <= 1,
            "expected about {expected} chunks, got {}",
            chunks.len()
        );
    }

    #[test]
    fn prefers_paragraph_boundaries() {
        let chunker = RecursiveChunker::new(60, 0).unwrap();
        let text = "First paragraph is about admissions.\n\nSecond paragraph is about fees.";
        let chunks = chunker.split_text(text);
        assert_eq!(
            chunks,
            vec![
                "First paragraph is about admissions.".to_string(),
                "Second paragraph is about fees.".to_string()
            ]
        );
    }

    #[test]
    fn multibyte_text_is_split_on_char_boundaries() {
        let chunker = RecursiveChunker::new(10, 2).unwrap();
        let text = "é".repeat(35);
        let chunks = chunker.split_text(&text);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        assert!(chunks.concat().chars().count() >= 35);
    }

    #[test]
    fn separator_is_kept_at_start_of_following_piece() {
        assert_eq!(split_keeping_separator("a. b. c", ". "), vec!["a", ". b", ". c"]);
        assert_eq!(split_keeping_separator("\n\nx", "\n\n"), vec!["\n\nx"]);
        assert_eq!(split_keeping_separator("ab", ""), vec!["a", "b"]);
    }

    #[test]
    fn rejects_invalid_sizes() {
        assert!(RecursiveChunker::new(0, 0).is_err());
        assert!(RecursiveChunker::new(10, 10).is_err());
    }

    #[test]
    fn batch_skips_failing_documents() {
        let chunker = RecursiveChunker::new(100, 10).unwrap();
        let documents = vec![
            Document::new("good text", "a.txt"),
            Document::new("orphan text", "  "),
            Document::new("more good text", "b.txt"),
        ];
        let chunks = chunk_documents(&chunker, &documents);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].source(), "a.txt");
        assert_eq!(chunks[1].source(), "b.txt");
    }

    #[test]
    fn batch_of_nothing_is_empty() {
        let chunker = RecursiveChunker::new(100, 10).unwrap();
        assert!(chunk_documents(&chunker, &[]).is_empty());
    }
}
