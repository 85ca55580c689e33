//! Error types for relay-sync.

use std::path::PathBuf;

use thiserror::Error;

use relay_core::{CoreError, ManifestEntry};
use relay_transport::TransportError;

/// All errors that can arise from building, publishing or updating.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A caller-supplied path or setting was unusable.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The source directory does not exist.
    #[error("source directory not found: {path}")]
    NotFound { path: PathBuf },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Hashing, manifest or filesystem helper error from relay-core.
    #[error("{0}")]
    Core(#[from] CoreError),

    /// The writer could not start a publish at all.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Directory walk or include-glob error.
    #[error("scan error: {0}")]
    Scan(#[from] ignore::Error),

    /// The published manifest could not be loaded; nothing was changed.
    #[error("remote manifest unavailable: {source}")]
    ManifestUnavailable {
        #[source]
        source: TransportError,
    },

    /// Files stayed invalid after every download attempt; the local tree was
    /// left untouched.
    #[error(
        "{} file(s) still invalid after {attempts} download attempt(s)",
        remaining.len()
    )]
    RetryExhausted {
        attempts: u32,
        remaining: Vec<ManifestEntry>,
    },

    /// The commit stamp could not be read from version control.
    #[error("commit stamp failed: {0}")]
    Commit(String),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
