//! Compare a local tree against a manifest.

use std::path::Path;

use relay_core::{checksum, paths, Manifest, ManifestEntry};
use relay_transport::Reporter;

/// Why an entry failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Problem {
    Missing,
    HashMismatch { actual: String },
    Unreadable { reason: String },
    /// The manifest path would resolve outside the local root.
    OutsideRoot { reason: String },
}

impl std::fmt::Display for Problem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Problem::Missing => f.write_str("missing"),
            Problem::HashMismatch { actual } => write!(f, "hash mismatch ({actual})"),
            Problem::Unreadable { reason } => write!(f, "unreadable: {reason}"),
            Problem::OutsideRoot { reason } => write!(f, "rejected: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidEntry {
    pub entry: ManifestEntry,
    pub problem: Problem,
}

/// Entries of `manifest` whose file under `local_root` is missing or whose
/// hash differs, in manifest order.
pub fn validate(manifest: &Manifest, local_root: &Path) -> Vec<ManifestEntry> {
    validate_with(manifest, local_root, &Reporter::silent())
}

/// [`validate`], emitting one progress event per entry.
pub fn validate_with(
    manifest: &Manifest,
    local_root: &Path,
    reporter: &Reporter,
) -> Vec<ManifestEntry> {
    inspect(manifest, local_root, reporter)
        .into_iter()
        .map(|invalid| invalid.entry)
        .collect()
}

/// Like [`validate_with`] but keeps the reason each entry failed.
pub fn inspect(manifest: &Manifest, local_root: &Path, reporter: &Reporter) -> Vec<InvalidEntry> {
    let total = manifest.len();
    let mut invalid = Vec::new();
    for (index, entry) in manifest.iter().enumerate() {
        if let Some(problem) = check_entry(local_root, entry) {
            tracing::debug!("{} is invalid: {problem}", entry.relative_path);
            invalid.push(InvalidEntry {
                entry: entry.clone(),
                problem,
            });
        }
        reporter.progress(index + 1, total);
    }
    invalid
}

/// `None` when the file exists and matches its recorded hash.
pub fn check_entry(local_root: &Path, entry: &ManifestEntry) -> Option<Problem> {
    if let Err(reason) = paths::check_relative(&entry.relative_path) {
        return Some(Problem::OutsideRoot {
            reason: reason.to_string(),
        });
    }
    let joined = paths::join([
        local_root.to_string_lossy().as_ref(),
        entry.relative_path.as_str(),
    ]);
    let path = Path::new(&joined);
    if !path.is_file() {
        return Some(Problem::Missing);
    }
    match checksum::hash_file(path) {
        Ok(actual) if actual == entry.content_hash => None,
        Ok(actual) => Some(Problem::HashMismatch { actual }),
        Err(e) => Some(Problem::Unreadable {
            reason: e.to_string(),
        }),
    }
}
