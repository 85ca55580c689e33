//! Manifests naming paths outside the install are refused before any
//! download starts.

use std::fs;
use std::path::Path;

use relay_core::checksum::hash_bytes;
use relay_core::{CoreError, Manifest, ManifestEntry};
use relay_sync::{SyncError, UpdateOptions, UpdateOutcome, Updater};
use relay_transport::{LocalLoader, Loader, Reporter, TransferSummary, TransportError};
use tempfile::TempDir;

fn options(work: &Path) -> UpdateOptions {
    UpdateOptions {
        scratch_dir: Some(work.join("scratch")),
        ..UpdateOptions::default()
    }
}

fn publish_raw(share: &Path, relative_path: &str, body: &str) {
    fs::create_dir_all(share).expect("share");
    let json = serde_json::json!({
        "entries": [
            { "relativePath": "a.txt", "contentHash": hash_bytes(b"hello") },
            { "relativePath": relative_path, "contentHash": hash_bytes(body.as_bytes()) }
        ]
    });
    fs::write(share.join("manifest.json"), json.to_string()).expect("manifest");
    fs::write(share.join("a.txt"), "hello").expect("a.txt");
}

#[test]
fn parent_directory_entry_is_refused_and_nothing_escapes() {
    let work = TempDir::new().expect("work");
    let share = work.path().join("share");
    let local = work.path().join("install");
    publish_raw(&share, "../escape.txt", "payload");
    fs::write(work.path().join("escape.txt"), "payload").expect("bait");

    let updater = Updater::new(LocalLoader::new(&share), options(work.path()));
    let err = updater
        .update(&local, &Reporter::silent())
        .expect_err("must refuse");

    match err {
        SyncError::ManifestUnavailable {
            source: TransportError::Core(CoreError::InvalidEntry { path, .. }),
        } => assert_eq!(path, "../escape.txt"),
        other => panic!("expected InvalidEntry, got {other}"),
    }
    assert!(!local.exists());
    assert!(!work.path().join("scratch").exists());

    // A second run must not mistake the file outside the install for a valid one.
    let again = updater.update(&local, &Reporter::silent());
    assert!(!matches!(again, Ok(UpdateOutcome::UpToDate)));
}

#[test]
fn absolute_entry_is_refused() {
    let work = TempDir::new().expect("work");
    let share = work.path().join("share");
    let target = work.path().join("elsewhere/owned.txt");
    publish_raw(&share, &format!("/{}", target.display()), "owned");

    let updater = Updater::new(LocalLoader::new(&share), options(work.path()));
    let err = updater
        .update(&work.path().join("install"), &Reporter::silent())
        .expect_err("must refuse");

    assert!(matches!(err, SyncError::ManifestUnavailable { .. }), "got: {err}");
    assert!(!target.exists());
}

/// Hands out a manifest built in code, bypassing JSON parsing.
struct HandBuiltLoader;

impl Loader for HandBuiltLoader {
    fn load_manifest(&self, _: &str, _: &Reporter) -> Result<Manifest, TransportError> {
        Ok(Manifest::new(vec![ManifestEntry::new(
            "bin/../../escape.txt",
            hash_bytes(b"x"),
        )]))
    }

    fn load_files(
        &self,
        _: &Manifest,
        _: &Path,
        _: &Reporter,
    ) -> Result<TransferSummary, TransportError> {
        panic!("no file may be fetched for an unsafe manifest");
    }
}

#[test]
fn unsafe_manifest_from_any_loader_is_refused() {
    let work = TempDir::new().expect("work");
    let updater = Updater::new(HandBuiltLoader, options(work.path()));

    let err = updater
        .update(&work.path().join("install"), &Reporter::silent())
        .expect_err("must refuse");

    assert!(matches!(err, SyncError::ManifestUnavailable { .. }), "got: {err}");
}
