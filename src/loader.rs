//! Reads a directory of JSON documents into a [`DocumentTree`].
use std::path::Path;

use walkdir::WalkDir;

use crate::ast::{Block, Document, DocumentTree};
use crate::config::{CONFIG_FILE, Config};
use crate::error::Error;
use crate::path::DocPath;

/// On-disk shape of one document file.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct DocumentFile {
    /// Top-level blocks.
    content: Vec<Block>,
}

/// Load every `*.json` document under `root` that passes the config's
/// include/exclude filters.
///
/// Files are visited sorted by name so document order is stable. Each file
/// becomes a document at the virtual path `/` + its path relative to `root`.
///
/// # Errors
///
/// Returns `Error::DocumentNotFound` if `root` is not a directory,
/// `Error::Io` if a file cannot be read,
/// or `Error::InvalidDocument` if a file is not a valid document.
pub fn load_tree(root: &Path, config: &Config) -> Result<DocumentTree, Error> {
    if !root.is_dir() {
        return Err(Error::DocumentNotFound {
            path: root.to_path_buf(),
        });
    }

    let mut documents = Vec::new();
    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| return e.file_type().is_file())
        .filter(|e| return e.path().extension().is_some_and(|ext| return ext == "json"))
    {
        let file = entry.path();
        let relative = file.strip_prefix(root).unwrap_or(file);
        let relative_str = relative.to_string_lossy().replace('\\', "/");

        if relative_str == CONFIG_FILE || !config.should_load(&relative_str) {
            tracing::trace!(file = %relative_str, "skipped");
            continue;
        }

        documents.push(load_document(file, &relative_str)?);
    }

    tracing::debug!(root = %root.display(), documents = documents.len(), "loaded document tree");
    return Ok(DocumentTree::new(documents));
}

/// Read one document file and place it at `/relative`.
///
/// # Errors
///
/// Returns `Error::Io` if the file cannot be read, or
/// `Error::InvalidDocument` if it is not a valid document or its path is
/// not representable.
fn load_document(file: &Path, relative: &str) -> Result<Document, Error> {
    let raw = std::fs::read_to_string(file)?;
    let parsed: DocumentFile = serde_json::from_str(&raw).map_err(|e| {
        return Error::InvalidDocument {
            file: file.to_path_buf(),
            reason: e.to_string(),
        };
    })?;

    let path = DocPath::parse(&format!("/{relative}")).map_err(|e| {
        return Error::InvalidDocument {
            file: file.to_path_buf(),
            reason: e.to_string(),
        };
    })?;
    return Ok(Document::new(path, parsed.content));
}
