//! Writer / Loader capability traits.

use std::path::Path;

use relay_core::Manifest;

use crate::error::TransportError;
use crate::events::Reporter;

/// A file that could not be moved during a best-effort transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedTransfer {
    pub relative_path: String,
    pub reason: String,
}

/// What a transfer call attempted and what it had to skip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferSummary {
    pub attempted: usize,
    pub failed: Vec<FailedTransfer>,
}

impl TransferSummary {
    pub fn succeeded(&self) -> usize {
        self.attempted - self.failed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    pub(crate) fn record_failure(&mut self, relative_path: &str, reason: impl Into<String>) {
        self.failed.push(FailedTransfer {
            relative_path: relative_path.to_string(),
            reason: reason.into(),
        });
    }
}

/// Push side: publishes a built tree.
pub trait Writer: Send + Sync {
    /// Transfer the manifest file and every entry of `manifest` from
    /// `source_root` to `destination`, keeping relative paths and creating
    /// intermediate directories.
    ///
    /// Emits one progress event per entry. A file that fails is reported via
    /// status and recorded in the summary; only setup failures (unreachable
    /// destination, bad credentials) return `Err`.
    fn write_files(
        &self,
        manifest: &Manifest,
        source_root: &Path,
        destination: &str,
        manifest_name: &str,
        reporter: &Reporter,
    ) -> Result<TransferSummary, TransportError>;
}

/// Pull side: serves a published build.
pub trait Loader: Send + Sync {
    /// Fetch and parse the published manifest.
    fn load_manifest(
        &self,
        manifest_name: &str,
        reporter: &Reporter,
    ) -> Result<Manifest, TransportError>;

    /// Fetch every entry of `manifest` into `destination`.
    ///
    /// Every entry is attempted exactly once per call, whatever the
    /// concurrency. Per-file failures are reported, not returned.
    fn load_files(
        &self,
        manifest: &Manifest,
        destination: &Path,
        reporter: &Reporter,
    ) -> Result<TransferSummary, TransportError>;
}

impl<T: Writer + ?Sized> Writer for Box<T> {
    fn write_files(
        &self,
        manifest: &Manifest,
        source_root: &Path,
        destination: &str,
        manifest_name: &str,
        reporter: &Reporter,
    ) -> Result<TransferSummary, TransportError> {
        (**self).write_files(manifest, source_root, destination, manifest_name, reporter)
    }
}

impl<T: Loader + ?Sized> Loader for Box<T> {
    fn load_manifest(
        &self,
        manifest_name: &str,
        reporter: &Reporter,
    ) -> Result<Manifest, TransportError> {
        (**self).load_manifest(manifest_name, reporter)
    }

    fn load_files(
        &self,
        manifest: &Manifest,
        destination: &Path,
        reporter: &Reporter,
    ) -> Result<TransferSummary, TransportError> {
        (**self).load_files(manifest, destination, reporter)
    }
}
