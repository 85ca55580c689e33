//! Reconcile a local install against a published build.
//!
//! The remote manifest is compared with the live tree. Invalid files are
//! downloaded into a scratch directory, re-validated and retried until they
//! are all good or the attempt budget runs out. Only a fully valid scratch
//! directory is merged into the live tree.

use std::fs;
use std::path::{Path, PathBuf};

use relay_core::config::DEFAULT_RETRIES;
use relay_core::{fsutil, Manifest, ManifestEntry, RelayConfig};
use relay_transport::{Loader, Reporter, TransportError};

use crate::error::{io_err, SyncError};
use crate::validator;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOptions {
    pub manifest_name: String,
    /// Number of `load_files` rounds before giving up.
    pub max_attempts: u32,
    /// Defaults to a hidden sibling of the local root.
    pub scratch_dir: Option<PathBuf>,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            manifest_name: relay_core::config::DEFAULT_MANIFEST_NAME.to_string(),
            max_attempts: DEFAULT_RETRIES,
            scratch_dir: None,
        }
    }
}

impl UpdateOptions {
    pub fn from_config(config: &RelayConfig) -> Self {
        Self {
            manifest_name: config.manifest_name.clone(),
            max_attempts: config.retries,
            scratch_dir: config.scratch_dir.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Nothing needed downloading.
    UpToDate,
    /// `updated` were downloaded and merged after `attempts` rounds.
    Synced {
        updated: Vec<ManifestEntry>,
        attempts: u32,
    },
}

/// Drives one loader against one local install.
#[derive(Debug)]
pub struct Updater<L> {
    loader: L,
    options: UpdateOptions,
}

impl<L: Loader> Updater<L> {
    pub fn new(loader: L, options: UpdateOptions) -> Self {
        Self { loader, options }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn update(&self, local_root: &Path, reporter: &Reporter) -> Result<UpdateOutcome, SyncError> {
        if self.options.max_attempts == 0 {
            return Err(SyncError::InvalidArgument(
                "max_attempts must be at least 1".to_string(),
            ));
        }

        let manifest = self
            .loader
            .load_manifest(&self.options.manifest_name, reporter)
            .map_err(|source| SyncError::ManifestUnavailable { source })?;
        manifest
            .check_paths()
            .map_err(|e| SyncError::ManifestUnavailable {
                source: TransportError::Core(e),
            })?;

        reporter.status("Validating local files");
        let invalid = validator::validate_with(&manifest, local_root, reporter);
        if invalid.is_empty() {
            reporter.status("All files are up to date");
            return Ok(UpdateOutcome::UpToDate);
        }
        reporter.status(format!("{} file(s) need updating", invalid.len()));

        let scratch = ScratchDir::acquire(self.scratch_path(local_root)?)?;
        let pending = manifest.subset(invalid.clone());

        match self.download(pending, scratch.path(), reporter) {
            Rounds::Complete { attempts } => {
                reporter.status("Moving temp files into application");
                fsutil::copy_tree(scratch.path(), local_root)?;
                reporter.status("Clearing up temp files");
                scratch.release()?;
                tracing::info!(
                    "updated {} file(s) in {}",
                    invalid.len(),
                    local_root.display()
                );
                Ok(UpdateOutcome::Synced {
                    updated: invalid,
                    attempts,
                })
            }
            Rounds::Exhausted { attempts, remaining } => {
                reporter.status(format!(
                    "Failed to download files after {attempts} attempts. Aborting..."
                ));
                reporter.status("Clearing up temp files");
                scratch.release()?;
                Err(SyncError::RetryExhausted {
                    attempts,
                    remaining,
                })
            }
        }
    }

    fn download(&self, mut pending: Manifest, scratch: &Path, reporter: &Reporter) -> Rounds {
        let max = self.options.max_attempts;
        for attempt in 1..=max {
            reporter.status(format!(
                "Downloading {} file(s), attempt {attempt} of {max}",
                pending.len()
            ));
            match self.loader.load_files(&pending, scratch, reporter) {
                Ok(summary) if !summary.is_clean() => {
                    tracing::debug!("{} transfer(s) failed this round", summary.failed.len());
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("download round {attempt} failed: {e}");
                    reporter.status(format!("Download failed: {e}"));
                }
            }

            let still_invalid = validator::validate_with(&pending, scratch, reporter);
            if still_invalid.is_empty() {
                return Rounds::Complete { attempts: attempt };
            }
            pending = pending.subset(still_invalid);
            if attempt < max {
                reporter.status("Invalid files detected. Redownloading...");
            }
        }
        Rounds::Exhausted {
            attempts: max,
            remaining: pending.entries,
        }
    }

    /// The scratch directory to use, resolved to an absolute path.
    ///
    /// It must neither sit inside the local root nor contain it, since it is
    /// wiped on acquire and merged into the local root on success.
    fn scratch_path(&self, local_root: &Path) -> Result<PathBuf, SyncError> {
        let requested = match &self.options.scratch_dir {
            Some(dir) => dir.clone(),
            None => default_scratch_dir(local_root),
        };
        let scratch = fsutil::resolve_path(&requested)?;
        let local = fsutil::resolve_path(local_root)?;
        if scratch.starts_with(&local) || local.starts_with(&scratch) {
            return Err(SyncError::InvalidArgument(format!(
                "scratch directory {} overlaps local root {}",
                requested.display(),
                local_root.display()
            )));
        }
        Ok(scratch)
    }
}

enum Rounds {
    Complete { attempts: u32 },
    Exhausted { attempts: u32, remaining: Vec<ManifestEntry> },
}

/// `<parent>/.<name>.relay-staging` next to the local root.
pub fn default_scratch_dir(local_root: &Path) -> PathBuf {
    match (local_root.parent(), local_root.file_name()) {
        (Some(parent), Some(name)) => {
            parent.join(format!(".{}.relay-staging", name.to_string_lossy()))
        }
        _ => std::env::temp_dir().join("relay-staging"),
    }
}

// ---------------------------------------------------------------------------
// Scratch directory
// ---------------------------------------------------------------------------

/// A scratch directory that is emptied on creation and removed on drop.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
    released: bool,
}

impl ScratchDir {
    pub fn acquire(path: PathBuf) -> Result<Self, SyncError> {
        fsutil::remove_dir_if_exists(&path)?;
        fs::create_dir_all(&path).map_err(|e| io_err(&path, e))?;
        tracing::debug!("scratch directory at {}", path.display());
        Ok(Self {
            path,
            released: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the directory now, surfacing any error.
    pub fn release(mut self) -> Result<(), SyncError> {
        self.released = true;
        fsutil::remove_dir_if_exists(&self.path)?;
        Ok(())
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = fsutil::remove_dir_if_exists(&self.path) {
            tracing::warn!("could not remove {}: {e}", self.path.display());
        }
    }
}
