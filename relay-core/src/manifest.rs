//! The build manifest: an ordered list of (relative path, content hash)
//! entries plus optional version and commit stamps.
//!
//! On disk the manifest is pretty-printed JSON:
//!
//! ```text
//! {
//!   "entries": [ { "relativePath": "bin/app", "contentHash": "…" } ],
//!   "version": "1.4.0",
//!   "commit": "main:3f2a9c1"
//! }
//! ```
//!
//! Manifests written by the earlier tool (`items` / `fileName` / `hash`,
//! paths with a leading `/`) are accepted on read.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{io_err, CoreError};
use crate::fsutil;
use crate::paths;

/// One file of a build.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    /// `/`-separated path relative to the build root, no leading `/`.
    #[serde(alias = "fileName")]
    pub relative_path: String,
    /// Lowercase hex MD5 of the file bytes.
    #[serde(alias = "hash")]
    pub content_hash: String,
}

impl ManifestEntry {
    pub fn new(relative_path: impl AsRef<str>, content_hash: impl Into<String>) -> Self {
        Self {
            relative_path: paths::normalize(relative_path.as_ref()),
            content_hash: content_hash.into(),
        }
    }

    /// [`ManifestEntry::new`], refusing paths that leave the build root.
    pub fn try_new(
        relative_path: impl AsRef<str>,
        content_hash: impl Into<String>,
    ) -> Result<Self, CoreError> {
        let entry = Self::new(relative_path, content_hash);
        entry.check_path()?;
        Ok(entry)
    }

    /// Whether `relative_path` stays inside whatever root it is joined onto.
    pub fn check_path(&self) -> Result<(), CoreError> {
        paths::check_relative(&self.relative_path).map_err(|reason| CoreError::InvalidEntry {
            path: self.relative_path.clone(),
            reason,
        })
    }
}

/// Description of a build.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Manifest {
    /// Entries in discovery order.
    #[serde(default, alias = "items")]
    pub entries: Vec<ManifestEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// `<branch>:<shortHash>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
}

impl Manifest {
    pub fn new(entries: Vec<ManifestEntry>) -> Self {
        Self {
            entries,
            version: None,
            commit: None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ManifestEntry> {
        self.entries.iter()
    }

    pub fn get(&self, relative_path: &str) -> Option<&ManifestEntry> {
        let wanted = paths::normalize(relative_path);
        self.entries.iter().find(|e| e.relative_path == wanted)
    }

    /// A transient manifest carrying only `entries`, with this manifest's
    /// version and commit stamps.
    pub fn subset(&self, entries: Vec<ManifestEntry>) -> Manifest {
        Manifest {
            entries,
            version: self.version.clone(),
            commit: self.commit.clone(),
        }
    }

    /// Parse manifest JSON, normalizing entry paths and rejecting duplicates
    /// and paths that leave the build root.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let mut manifest: Manifest = serde_json::from_str(json)?;
        manifest.normalize_paths();
        manifest.check_paths()?;
        manifest.ensure_unique()?;
        Ok(manifest)
    }

    /// Fail on the first entry whose path is empty, absolute, drive-prefixed
    /// or contains `.`/`..` components.
    pub fn check_paths(&self) -> Result<(), CoreError> {
        self.entries.iter().try_for_each(ManifestEntry::check_path)
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a manifest file.
    ///
    /// A missing file is [`CoreError::NotFound`]; malformed JSON is
    /// [`CoreError::ManifestParse`] naming the file.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(CoreError::NotFound {
                    path: path.to_path_buf(),
                })
            }
            Err(err) => return Err(io_err(path, err)),
        };
        match Self::from_json(&contents) {
            Err(CoreError::Json(source)) => Err(CoreError::ManifestParse {
                path: path.to_path_buf(),
                source,
            }),
            other => other,
        }
    }

    /// Save the manifest atomically (`.tmp` + rename).
    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        let json = self.to_json()?;
        fsutil::write_atomic(path, json.as_bytes())
    }

    fn normalize_paths(&mut self) {
        for entry in &mut self.entries {
            entry.relative_path = paths::normalize(&entry.relative_path);
        }
    }

    fn ensure_unique(&self) -> Result<(), CoreError> {
        let mut seen = HashSet::with_capacity(self.entries.len());
        for entry in &self.entries {
            if !seen.insert(entry.relative_path.as_str()) {
                return Err(CoreError::DuplicateEntry {
                    path: entry.relative_path.clone(),
                });
            }
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a ManifestEntry;
    type IntoIter = std::slice::Iter<'a, ManifestEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> Manifest {
        let mut manifest = Manifest::new(vec![
            ManifestEntry::new("z.txt", "aa"),
            ManifestEntry::new("a/b.txt", "bb"),
            ManifestEntry::new("m.bin", "cc"),
        ]);
        manifest.commit = Some("main:abc1234".to_string());
        manifest
    }

    #[test]
    fn json_uses_camel_case_fields() {
        let json = sample().to_json().unwrap();
        assert!(json.contains("\"entries\""));
        assert!(json.contains("\"relativePath\": \"a/b.txt\""));
        assert!(json.contains("\"contentHash\": \"bb\""));
        assert!(json.contains("\"commit\": \"main:abc1234\""));
        assert!(!json.contains("\"version\""), "unset version is omitted");
    }

    #[test]
    fn json_keeps_entry_order() {
        let manifest = sample();
        let parsed = Manifest::from_json(&manifest.to_json().unwrap()).unwrap();
        assert_eq!(parsed, manifest);
        let order: Vec<_> = parsed.iter().map(|e| e.relative_path.as_str()).collect();
        assert_eq!(order, ["z.txt", "a/b.txt", "m.bin"]);
    }

    #[test]
    fn reads_legacy_field_names_and_leading_slashes() {
        let legacy = r#"{
            "items": [ { "fileName": "/bin/app.exe", "hash": "0123" } ],
            "version": null,
            "commit": "develop:beef001"
        }"#;
        let manifest = Manifest::from_json(legacy).unwrap();
        assert_eq!(manifest.entries, vec![ManifestEntry::new("bin/app.exe", "0123")]);
        assert_eq!(manifest.entries[0].relative_path, "bin/app.exe");
        assert_eq!(manifest.version, None);
        assert_eq!(manifest.commit.as_deref(), Some("develop:beef001"));
    }

    #[test]
    fn duplicate_paths_are_rejected() {
        let json = r#"{ "entries": [
            { "relativePath": "a.txt", "contentHash": "1" },
            { "relativePath": "/a.txt", "contentHash": "2" }
        ] }"#;
        let err = Manifest::from_json(json).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateEntry { ref path } if path == "a.txt"));
    }

    #[test]
    fn entries_leaving_the_root_are_rejected() {
        for path in ["../escape.txt", "//etc/passwd", "a/../../b", "C:\\\\x.dll"] {
            let json = serde_json::json!({
                "entries": [ { "relativePath": path, "contentHash": "1" } ]
            })
            .to_string();
            let err = Manifest::from_json(&json).unwrap_err();
            assert!(matches!(err, CoreError::InvalidEntry { .. }), "{path}: {err}");
        }
    }

    #[test]
    fn try_new_checks_path() {
        assert!(ManifestEntry::try_new("bin/app", "1").is_ok());
        assert!(matches!(
            ManifestEntry::try_new("../app", "1"),
            Err(CoreError::InvalidEntry { .. })
        ));
    }

    #[test]
    fn subset_keeps_stamps() {
        let manifest = sample();
        let sub = manifest.subset(vec![manifest.entries[1].clone()]);
        assert_eq!(sub.len(), 1);
        assert_eq!(sub.commit, manifest.commit);
    }

    #[test]
    fn get_normalizes_lookup_path() {
        let manifest = sample();
        assert_eq!(manifest.get("\\a\\b.txt").map(|e| e.content_hash.as_str()), Some("bb"));
        assert!(manifest.get("nope").is_none());
    }

    #[test]
    fn save_then_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("manifest.json");
        sample().save(&path).unwrap();
        assert_eq!(Manifest::load(&path).unwrap(), sample());
    }

    #[test]
    fn load_missing_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = Manifest::load(&tmp.path().join("manifest.json")).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }), "got: {err}");
    }

    #[test]
    fn load_corrupt_names_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("manifest.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = Manifest::load(&path).unwrap_err();
        assert!(matches!(err, CoreError::ManifestParse { .. }), "got: {err}");
        assert!(err.to_string().contains("manifest.json"));
    }
}
