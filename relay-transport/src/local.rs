//! Local filesystem transport.
//!
//! [`LocalWriter`] publishes a build into a directory (a network share, a
//! mounted volume, a staging folder). [`LocalLoader`] serves a build that was
//! published that way.

use std::fs;
use std::path::{Path, PathBuf};

use relay_core::{fsutil, CoreError, Manifest};

use crate::batch::run_batched;
use crate::contract::{Loader, TransferSummary, Writer};
use crate::error::{io_err, TransportError};
use crate::events::Reporter;

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Copies a build into a local destination directory.
///
/// By default the destination is cleared first so a publish replaces the
/// previous build instead of layering on top of it.
#[derive(Debug, Clone)]
pub struct LocalWriter {
    clean_destination: bool,
}

impl Default for LocalWriter {
    fn default() -> Self {
        Self {
            clean_destination: true,
        }
    }
}

impl LocalWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy on top of whatever the destination already holds.
    pub fn keep_destination(mut self) -> Self {
        self.clean_destination = false;
        self
    }

    fn prepare_destination(
        &self,
        source_root: &Path,
        destination: &Path,
    ) -> Result<(), TransportError> {
        if self.clean_destination && destination.exists() {
            let source = fs::canonicalize(source_root).map_err(|e| io_err(source_root, e))?;
            let target = fs::canonicalize(destination).map_err(|e| io_err(destination, e))?;
            if source.starts_with(&target) {
                return Err(TransportError::InvalidArgument(format!(
                    "destination {} contains the source tree; refusing to clear it",
                    destination.display()
                )));
            }
            fsutil::remove_dir_if_exists(destination)?;
        }
        fs::create_dir_all(destination).map_err(|e| io_err(destination, e))
    }
}

impl Writer for LocalWriter {
    fn write_files(
        &self,
        manifest: &Manifest,
        source_root: &Path,
        destination: &str,
        manifest_name: &str,
        reporter: &Reporter,
    ) -> Result<TransferSummary, TransportError> {
        let destination = PathBuf::from(destination);
        self.prepare_destination(source_root, &destination)?;

        let mut summary = run_batched(&manifest.entries, 1, reporter, |entry| {
            reporter.status(format!("Copying file: {}", entry.relative_path));
            entry.check_path().map_err(|e| e.to_string())?;
            let from = source_root.join(&entry.relative_path);
            let to = destination.join(&entry.relative_path);
            fsutil::copy_file(&from, &to)
                .map(|_| ())
                .map_err(|e| e.to_string())
        });

        summary.attempted += 1;
        let manifest_source = source_root.join(manifest_name);
        reporter.status(format!("Copying manifest: {}", manifest_source.display()));
        if let Err(err) = fsutil::copy_file(&manifest_source, &destination.join(manifest_name)) {
            tracing::warn!("manifest copy failed: {err}");
            reporter.status(format!("Failed to copy manifest: {err}"));
            summary.record_failure(manifest_name, err.to_string());
        }

        Ok(summary)
    }
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

/// Reads a build published to a local directory.
#[derive(Debug, Clone)]
pub struct LocalLoader {
    root: PathBuf,
    concurrency: usize,
}

impl LocalLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            concurrency: 1,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Loader for LocalLoader {
    fn load_manifest(
        &self,
        manifest_name: &str,
        reporter: &Reporter,
    ) -> Result<Manifest, TransportError> {
        let path = self.root.join(manifest_name);
        reporter.status(format!("Loading manifest: {}", path.display()));
        match Manifest::load(&path) {
            Ok(manifest) => Ok(manifest),
            Err(CoreError::NotFound { path }) => Err(TransportError::ManifestNotFound {
                location: path.display().to_string(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    fn load_files(
        &self,
        manifest: &Manifest,
        destination: &Path,
        reporter: &Reporter,
    ) -> Result<TransferSummary, TransportError> {
        fs::create_dir_all(destination).map_err(|e| io_err(destination, e))?;

        let summary = run_batched(&manifest.entries, self.concurrency, reporter, |entry| {
            reporter.status(format!("Copying file: {}", entry.relative_path));
            entry.check_path().map_err(|e| e.to_string())?;
            let from = self.root.join(&entry.relative_path);
            let to = destination.join(&entry.relative_path);
            fsutil::copy_file(&from, &to)
                .map(|_| ())
                .map_err(|e| e.to_string())
        });

        reporter.status(format!(
            "Finished copying all files to: {}",
            destination.display()
        ));
        Ok(summary)
    }
}
