//! Error types for relay-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from manifest, filesystem and config operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A caller-supplied argument was unusable (empty path, bad setting).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A required file or directory does not exist.
    #[error("not found: {path}")]
    NotFound { path: PathBuf },

    /// Underlying I/O failure, annotated with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Manifest JSON could not be serialized or parsed.
    #[error("manifest JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Manifest parse error on load, with the offending file.
    #[error("failed to parse manifest at {path}: {source}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A manifest entry path would resolve outside the build root.
    #[error("invalid manifest entry {path:?}: {reason}")]
    InvalidEntry { path: String, reason: &'static str },

    /// Two manifest entries share the same relative path.
    #[error("duplicate manifest entry: {path}")]
    DuplicateEntry { path: String },

    /// Config YAML parse error, with the offending file.
    #[error("failed to parse config at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Convenience constructor for [`CoreError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> CoreError {
    CoreError::Io {
        path: path.into(),
        source,
    }
}
