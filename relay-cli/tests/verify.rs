use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::str::contains;

use relay_core::checksum::hash_bytes;
use relay_core::{Manifest, ManifestEntry};
use tempfile::TempDir;

fn relay_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("relay"));
    cmd.current_dir(home)
        .env("HOME", home)
        .env("USERPROFILE", home)
        .env("XDG_CONFIG_HOME", home.join(".config"));
    cmd
}

fn fixture(home: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let local = home.join("install");
    fs::create_dir_all(local.join("sub")).expect("install dir");
    fs::write(local.join("a.txt"), "hello").expect("a.txt");
    fs::write(local.join("sub/b.txt"), "world").expect("b.txt");

    let manifest_path = home.join("manifest.json");
    Manifest::new(vec![
        ManifestEntry::new("a.txt", hash_bytes(b"hello")),
        ManifestEntry::new("sub/b.txt", hash_bytes(b"world")),
    ])
    .save(&manifest_path)
    .expect("save manifest");
    (manifest_path, local)
}

#[test]
fn matching_tree_passes() {
    let home = TempDir::new().expect("home");
    let (manifest, local) = fixture(home.path());

    relay_cmd(home.path())
        .arg("verify")
        .arg(&manifest)
        .arg(&local)
        .assert()
        .success()
        .stdout(contains("all 2 file(s) match"));
}

#[test]
fn corrupt_and_missing_files_are_listed() {
    let home = TempDir::new().expect("home");
    let (manifest, local) = fixture(home.path());
    fs::write(local.join("a.txt"), "jello").expect("corrupt");
    fs::remove_file(local.join("sub/b.txt")).expect("remove");

    relay_cmd(home.path())
        .arg("verify")
        .arg(&manifest)
        .arg(&local)
        .assert()
        .failure()
        .stdout(contains("a.txt"))
        .stdout(contains("sub/b.txt"))
        .stdout(contains("missing"))
        .stderr(contains("2 of 2 file(s) are invalid"));
}

#[test]
fn json_output_is_machine_readable() {
    let home = TempDir::new().expect("home");
    let (manifest, local) = fixture(home.path());
    fs::remove_file(local.join("sub/b.txt")).expect("remove");

    let output = relay_cmd(home.path())
        .arg("verify")
        .arg(&manifest)
        .arg(&local)
        .arg("--json")
        .output()
        .expect("run relay");

    assert!(!output.status.success());
    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is json");
    assert_eq!(report["checked"], 2);
    assert_eq!(report["invalid"][0]["path"], "sub/b.txt");
    assert_eq!(report["invalid"][0]["problem"], "missing");
}

#[test]
fn missing_manifest_file_fails_with_context() {
    let home = TempDir::new().expect("home");

    relay_cmd(home.path())
        .args(["verify", "nope.json", "."])
        .assert()
        .failure()
        .stderr(contains("failed to read manifest"));
}

#[test]
fn verbose_flag_logs_the_command_and_its_failure() {
    let home = TempDir::new().expect("home");
    let (manifest, local) = fixture(home.path());
    fs::remove_file(local.join("a.txt")).expect("remove");

    relay_cmd(home.path())
        .env_remove("RUST_LOG")
        .arg("--verbose")
        .arg("verify")
        .arg(&manifest)
        .arg(&local)
        .assert()
        .failure()
        .stderr(contains("running Verify"))
        .stderr(contains("command failed: 1 of 2 file(s) are invalid"));
}
