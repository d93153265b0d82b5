//! Loading documents from plain-text files and directories.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::document::{Document, META_FILE_NAME, META_FILE_TYPE, META_SOURCE};
use crate::error::{RagError, Result};

/// File extensions the loader accepts.
const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md"];

/// Loads `.txt` and `.md` files into [`Document`]s, attaching `source`,
/// `file_name`, and `file_type` metadata.
///
/// Unsupported or unreadable files are [`RagError::Load`]; directory
/// loading recovers per file and reports failures alongside the loaded
/// documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextLoader;

impl TextLoader {
    /// Create a new loader.
    pub fn new() -> Self {
        Self
    }

    /// Wrap already-held text as a document with the given source label.
    pub fn from_text(&self, text: impl Into<String>, source: impl Into<String>) -> Document {
        let source = source.into();
        let mut metadata = HashMap::new();
        metadata.insert(META_SOURCE.to_string(), source.clone());
        metadata.insert(META_FILE_NAME.to_string(), source);
        Document::new(text, metadata)
    }

    /// Load a single file.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Load`] when the extension is unsupported or the
    /// file cannot be read as UTF-8 text.
    pub fn load_file(&self, path: &Path) -> Result<Document> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(RagError::Load {
                path: path.display().to_string(),
                message: format!("unsupported file type '{extension}'"),
            });
        }

        let text = std::fs::read_to_string(path).map_err(|e| RagError::Load {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        let mut metadata = HashMap::new();
        metadata.insert(META_SOURCE.to_string(), path.display().to_string());
        metadata.insert(META_FILE_NAME.to_string(), file_name);
        metadata.insert(META_FILE_TYPE.to_string(), extension);

        debug!(path = %path.display(), "loaded document");
        Ok(Document::new(text, metadata))
    }

    /// Load every supported file under a directory, recursively.
    ///
    /// Files that fail to load are skipped with a warning and returned as
    /// `(path, error)` pairs; one bad file never aborts the walk.
    pub fn load_dir(&self, dir: &Path) -> (Vec<Document>, Vec<(String, RagError)>) {
        let mut documents = Vec::new();
        let mut failures = Vec::new();

        for entry in WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            let extension = path
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_ascii_lowercase)
                .unwrap_or_default();
            if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
                continue;
            }

            match self.load_file(path) {
                Ok(document) => documents.push(document),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable file");
                    failures.push((path.display().to_string(), e));
                }
            }
        }

        (documents, failures)
    }
}
