//! Loading documents from a directory tree.
//!
//! [`DirectoryLoader`] walks a data directory recursively and turns every
//! supported file into a [`Document`]. Plain text and markdown are always
//! supported; PDF text extraction is available behind the `pdf` feature.
//! Unsupported or unreadable files are skipped with a warning so one bad
//! file never aborts indexing.

use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::document::Document;
use crate::error::{RagError, Result};

/// Document formats the loader knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Text,
    Markdown,
    Pdf,
}

impl FileKind {
    /// Classify a path by its (case-insensitive) extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "txt" => Some(Self::Text),
            "md" | "markdown" => Some(Self::Markdown),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

/// Reads every supported file under a data directory.
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    root: PathBuf,
}

impl DirectoryLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load all supported documents, in path order.
    ///
    /// Source labels are paths relative to the data directory's parent, so
    /// `data/handbook/fees.md` is labelled `data/handbook/fees.md`.
    ///
    /// A missing data directory is logged and yields no documents, as do
    /// per-file failures for the files concerned.
    pub fn load(&self) -> Vec<Document> {
        if !self.root.is_dir() {
            error!(root = %self.root.display(), "data directory does not exist or is not a directory");
            return Vec::new();
        }

        let mut files = WalkDir::new(&self.root)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "skipping unreadable directory entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .collect::<Vec<_>>();
        files.sort();

        let mut documents = Vec::with_capacity(files.len());
        for path in files {
            match self.load_file(&path) {
                Ok(Some(document)) => documents.push(document),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "skipping file"),
            }
        }

        if documents.is_empty() {
            error!(root = %self.root.display(), "no supported documents found");
        } else {
            info!(root = %self.root.display(), document_count = documents.len(), "loaded documents");
        }
        documents
    }

    /// Load a single file.
    ///
    /// Returns `Ok(None)` for unsupported formats and for files whose text is
    /// blank.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::LoaderError`] if a supported file cannot be read
    /// or decoded.
    pub fn load_file(&self, path: &Path) -> Result<Option<Document>> {
        let Some(kind) = FileKind::from_path(path) else {
            warn!(path = %path.display(), "unsupported file type, skipping");
            return Ok(None);
        };

        let text = match kind {
            FileKind::Text | FileKind::Markdown => std::fs::read_to_string(path)
                .map_err(|e| RagError::LoaderError { path: path.to_path_buf(), message: e.to_string() })?,
            FileKind::Pdf => extract_pdf(path)?,
        };

        if text.trim().is_empty() {
            debug!(path = %path.display(), "file has no text, skipping");
            return Ok(None);
        }

        let source = self.source_label(path);
        debug!(source = %source, chars = text.chars().count(), "loaded document");
        Ok(Some(Document::new(text, source)))
    }

    /// Path of `path` relative to the data directory's parent, with `/`
    /// separators.
    pub fn source_label(&self, path: &Path) -> String {
        let base = self.root.parent().unwrap_or(&self.root);
        let relative = path.strip_prefix(base).unwrap_or(path);
        relative.components().map(|c| c.as_os_str().to_string_lossy()).collect::<Vec<_>>().join("/")
    }
}

#[cfg(feature = "pdf")]
fn extract_pdf(path: &Path) -> Result<String> {
    pdf_extract::extract_text(path)
        .map_err(|e| RagError::LoaderError { path: path.to_path_buf(), message: e.to_string() })
}

#[cfg(not(feature = "pdf"))]
fn extract_pdf(path: &Path) -> Result<String> {
    Err(RagError::LoaderError {
        path: path.to_path_buf(),
        message: "PDF support requires the `pdf` feature".to_string(),
    })
}
