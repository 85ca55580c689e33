//! Manifest construction: walk a source tree, filter, hash.
//!
//! Files are visited depth-first with directory entries sorted by name, so
//! two builds of the same tree produce entries in the same order.

use std::path::{Path, PathBuf};

use ignore::overrides::{Override, OverrideBuilder};
use ignore::WalkBuilder;

use relay_core::{checksum, fsutil, paths, Manifest, ManifestEntry, RelayConfig};
use relay_transport::Reporter;

use crate::error::SyncError;

/// Which files of the source tree enter the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFilter {
    /// Glob matched against file names (`*`, `*.dll`, `app-*`).
    pub include: String,
    /// File-name suffix to leave out (`.pdb`, `.log`).
    pub exclude: Option<String>,
}

impl Default for FileFilter {
    fn default() -> Self {
        Self {
            include: "*".to_string(),
            exclude: None,
        }
    }
}

impl FileFilter {
    pub fn new(include: impl Into<String>, exclude: Option<String>) -> Self {
        Self {
            include: include.into(),
            exclude,
        }
    }

    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(config.include.clone(), config.exclude.clone())
    }

    fn excludes(&self, file_name: &str) -> bool {
        match self.exclude.as_deref() {
            Some(suffix) if !suffix.is_empty() => file_name.ends_with(suffix),
            _ => false,
        }
    }
}

/// Build a manifest of every file under `source_root` accepted by `filter`.
///
/// A stale `manifest_name` file directly under `source_root` is deleted
/// first so it never hashes itself into the new manifest. Version and commit
/// are left unset.
pub fn build_manifest(
    source_root: &Path,
    manifest_name: &str,
    filter: &FileFilter,
) -> Result<Manifest, SyncError> {
    build_manifest_with(source_root, manifest_name, filter, &Reporter::silent())
}

/// [`build_manifest`], emitting one progress event per hashed file.
pub fn build_manifest_with(
    source_root: &Path,
    manifest_name: &str,
    filter: &FileFilter,
    reporter: &Reporter,
) -> Result<Manifest, SyncError> {
    if source_root.as_os_str().is_empty() {
        return Err(SyncError::InvalidArgument(
            "source directory path is empty".to_string(),
        ));
    }
    if !source_root.is_dir() {
        return Err(SyncError::NotFound {
            path: source_root.to_path_buf(),
        });
    }

    fsutil::remove_file_if_exists(&source_root.join(manifest_name))?;

    let files = collect_files(source_root, filter)?;
    let total = files.len();
    let mut entries = Vec::with_capacity(total);
    for (index, (absolute, relative)) in files.into_iter().enumerate() {
        let hash = checksum::hash_file(&absolute)?;
        tracing::debug!("hashed {relative}: {hash}");
        entries.push(ManifestEntry::new(relative, hash));
        reporter.progress(index + 1, total);
    }

    tracing::info!(
        "manifest for {} has {} entries",
        source_root.display(),
        entries.len()
    );
    Ok(Manifest::new(entries))
}

/// Matching files as `(absolute path, normalized relative path)`.
fn collect_files(
    source_root: &Path,
    filter: &FileFilter,
) -> Result<Vec<(PathBuf, String)>, SyncError> {
    let include = include_matcher(source_root, &filter.include)?;

    let mut walker = WalkBuilder::new(source_root);
    walker
        .standard_filters(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b));

    let mut files = Vec::new();
    for result in walker.build() {
        let entry = result?;
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let relative_path = entry.path().strip_prefix(source_root).map_err(|_| {
            SyncError::InvalidArgument(format!(
                "{} is outside {}",
                entry.path().display(),
                source_root.display()
            ))
        })?;
        if !include.matched(relative_path, false).is_whitelist() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy();
        if filter.excludes(&file_name) {
            continue;
        }
        let relative = paths::normalize(&relative_path.to_string_lossy());
        files.push((entry.path().to_path_buf(), relative));
    }
    Ok(files)
}

fn include_matcher(source_root: &Path, include: &str) -> Result<Override, SyncError> {
    let pattern = if include.trim().is_empty() {
        "*"
    } else {
        include.trim()
    };
    let mut builder = OverrideBuilder::new(source_root);
    builder.add(pattern)?;
    Ok(builder.build()?)
}
