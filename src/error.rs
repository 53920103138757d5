/// Crate-level error types for loading, configuration, and output.
///
/// Link resolution itself never fails: broken references become invalid
/// nodes in the tree. These errors cover everything around it.
use std::path::PathBuf;

/// Every variant names the file, path, or reason for failure so the CLI can
/// render a useful diagnostic without a debugger.
#[allow(clippy::error_impl_error, reason = "crate-level error type")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A document or root directory does not exist on disk.
    #[error("document not found: {}", path.display())]
    DocumentNotFound {
        /// Path to the missing file or directory.
        path: PathBuf,
    },

    /// A document file exists but is not a valid document tree.
    #[error("invalid document: {}: {reason}", file.display())]
    InvalidDocument {
        /// File that failed to deserialize.
        file: PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// A virtual path could not be parsed.
    #[error("invalid path `{path}`: {reason}")]
    InvalidPath {
        /// The raw path.
        path: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON serialization of a resolved tree failed.
    #[error("json: {0}")]
    Json(
        /// The wrapped JSON error.
        #[from]
        serde_json::Error,
    ),

    /// TOML deserialization of `.docxref.toml` failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),
}
