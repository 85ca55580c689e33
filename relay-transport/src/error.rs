//! Error types for relay-transport.

use std::path::PathBuf;

use thiserror::Error;

use relay_core::CoreError;

/// Errors that stop a transport call as a whole.
///
/// Per-file failures never surface here; they are collected in
/// [`crate::TransferSummary`] and reported as status events.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Manifest, path or config error from relay-core.
    #[error("manifest error: {0}")]
    Core(#[from] CoreError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The published manifest does not exist at the expected location.
    #[error("manifest not found at {location}")]
    ManifestNotFound { location: String },

    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    #[error("FTP error: {0}")]
    Ftp(#[from] suppaftp::FtpError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Convenience constructor for [`TransportError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> TransportError {
    TransportError::Io {
        path: path.into(),
        source,
    }
}
