//! Build, stamp and publish a manifest together with its files.

use std::path::{Path, PathBuf};

use relay_core::{paths, Manifest};
use relay_transport::{Reporter, TransferSummary, Writer};

use crate::error::SyncError;
use crate::manifest_builder::{build_manifest_with, FileFilter};
use crate::vcs::CommitSource;

/// Inputs for one publish.
#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub source_root: PathBuf,
    /// Writer-specific destination (directory path or remote folder).
    pub destination: String,
    pub manifest_name: String,
    pub filter: FileFilter,
    pub version: Option<String>,
}

impl PublishRequest {
    pub fn new(
        source_root: impl Into<PathBuf>,
        destination: impl Into<String>,
        manifest_name: impl Into<String>,
    ) -> Self {
        Self {
            source_root: source_root.into(),
            destination: destination.into(),
            manifest_name: manifest_name.into(),
            filter: FileFilter::default(),
            version: None,
        }
    }

    pub fn with_filter(mut self, filter: FileFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    pub manifest: Manifest,
    pub transfer: TransferSummary,
}

/// Build the manifest for `request.source_root`, stamp it, save it next to
/// the files and hand everything to `writer`.
///
/// A commit source failure aborts before anything is written. Writer
/// failures are returned as-is; there is no retry at this level.
pub fn build_and_publish<W: Writer + ?Sized>(
    request: &PublishRequest,
    writer: &W,
    commit_source: &dyn CommitSource,
    reporter: &Reporter,
) -> Result<PublishOutcome, SyncError> {
    let source_root = normalized_root(&request.source_root);
    let destination = paths::unify_separators(&request.destination);

    reporter.status("Creating manifest");
    let mut manifest = build_manifest_with(
        &source_root,
        &request.manifest_name,
        &request.filter,
        reporter,
    )?;

    manifest.commit = Some(commit_source.commit_for(&source_root)?);
    if let Some(version) = &request.version {
        manifest.version = Some(version.clone());
    }

    manifest.save(&source_root.join(&request.manifest_name))?;
    tracing::info!(
        "publishing {} file(s) from {} to {destination}",
        manifest.len(),
        source_root.display()
    );

    let transfer = writer.write_files(
        &manifest,
        &source_root,
        &destination,
        &request.manifest_name,
        reporter,
    )?;
    if !transfer.is_clean() {
        tracing::warn!("{} file(s) failed to publish", transfer.failed.len());
    }

    Ok(PublishOutcome { manifest, transfer })
}

fn normalized_root(root: &Path) -> PathBuf {
    if cfg!(windows) {
        root.to_path_buf()
    } else {
        PathBuf::from(paths::unify_separators(&root.to_string_lossy()))
    }
}
