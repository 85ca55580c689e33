//! FTP upload transport (push side only).
//!
//! One control connection per publish. Directories are created up front with
//! MKD for every ancestor of every entry; a refusal there usually means the
//! directory already exists and is only logged.

use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use suppaftp::types::FileType;
use suppaftp::FtpStream;

use relay_core::{paths, ExtensionPolicy, FtpConfig, Manifest};

use crate::contract::{TransferSummary, Writer};
use crate::error::TransportError;
use crate::events::Reporter;

const DEFAULT_FTP_PORT: u16 = 21;

/// Uploads a build to an FTP server under a working directory.
#[derive(Debug, Clone)]
pub struct FtpWriter {
    config: FtpConfig,
}

impl FtpWriter {
    pub fn new(config: FtpConfig) -> Result<Self, TransportError> {
        config.validate()?;
        Ok(Self { config })
    }

    fn connect(&self) -> Result<FtpStream, TransportError> {
        let address = host_and_port(&self.config.url);
        tracing::debug!("connecting to ftp server {address}");
        let mut ftp = FtpStream::connect(address.as_str())?;
        ftp.login(self.config.username.as_str(), self.config.password.as_str())?;
        ftp.transfer_type(FileType::Binary)?;
        Ok(ftp)
    }

    fn upload(
        ftp: &mut FtpStream,
        local: &Path,
        remote: &str,
        reporter: &Reporter,
    ) -> Result<(), String> {
        let mut file = File::open(local).map_err(|e| format!("{}: {e}", local.display()))?;
        reporter.status(format!("Uploading file: {remote}"));
        ftp.put_file(remote, &mut file)
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

impl Writer for FtpWriter {
    fn write_files(
        &self,
        manifest: &Manifest,
        source_root: &Path,
        destination: &str,
        manifest_name: &str,
        reporter: &Reporter,
    ) -> Result<TransferSummary, TransportError> {
        let mut ftp = self.connect()?;
        let policy = &self.config.extensions;

        for directory in directory_plan(manifest, destination, policy) {
            match ftp.mkdir(directory.as_str()) {
                Ok(()) => tracing::debug!("created remote directory {directory}"),
                Err(err) => tracing::debug!("MKD {directory} refused: {err}"),
            }
        }

        let total = manifest.len();
        let mut summary = TransferSummary {
            attempted: total + 1,
            failed: Vec::new(),
        };
        for (index, entry) in manifest.iter().enumerate() {
            let local = source_root.join(&entry.relative_path);
            let remote = remote_path(destination, &entry.relative_path, policy);
            let uploaded = entry
                .check_path()
                .map_err(|e| e.to_string())
                .and_then(|()| Self::upload(&mut ftp, &local, &remote, reporter));
            if let Err(reason) = uploaded {
                tracing::warn!("upload failed for {}: {reason}", entry.relative_path);
                reporter.status(format!(
                    "Uploading failed for local file: {}, remote file: {remote}, error: {reason}",
                    local.display()
                ));
                summary.record_failure(&entry.relative_path, reason);
            }
            reporter.progress(index + 1, total);
        }

        // The manifest goes last so readers never see it ahead of its files.
        let remote_manifest = paths::join([destination, manifest_name]);
        if let Err(reason) = Self::upload(
            &mut ftp,
            &source_root.join(manifest_name),
            &remote_manifest,
            reporter,
        ) {
            reporter.status(format!("Uploading manifest failed: {reason}"));
            summary.record_failure(manifest_name, reason);
        }

        if let Err(err) = ftp.quit() {
            tracing::debug!("ftp quit failed: {err}");
        }
        Ok(summary)
    }
}

/// `ftp://host[:port]/…` or `host[:port]` → `host:port`.
fn host_and_port(url: &str) -> String {
    let trimmed = url.trim();
    let without_scheme = trimmed.strip_prefix("ftp://").unwrap_or(trimmed);
    let authority = without_scheme.split('/').next().unwrap_or_default();
    if authority.contains(':') {
        authority.to_string()
    } else {
        format!("{authority}:{DEFAULT_FTP_PORT}")
    }
}

/// Remote location of an entry under the working directory, relative to the
/// login directory.
fn remote_path(working_dir: &str, relative_path: &str, policy: &ExtensionPolicy) -> String {
    paths::normalize(&paths::join([
        working_dir,
        policy.remote_name(relative_path).as_str(),
    ]))
}

/// Every directory that must exist before uploading, parents first, once.
fn directory_plan(
    manifest: &Manifest,
    working_dir: &str,
    policy: &ExtensionPolicy,
) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut plan = Vec::new();
    for entry in manifest.iter().filter(|e| e.check_path().is_ok()) {
        let remote = remote_path(working_dir, &entry.relative_path, policy);
        for directory in paths::incremental_prefixes(&remote) {
            if seen.insert(directory.clone()) {
                plan.push(directory);
            }
        }
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::ManifestEntry;
    use rstest::rstest;

    #[rstest]
    #[case("ftp.example.com", "ftp.example.com:21")]
    #[case("ftp://ftp.example.com/builds", "ftp.example.com:21")]
    #[case("ftp://10.0.0.5:2121", "10.0.0.5:2121")]
    #[case(" host:990 ", "host:990")]
    fn host_and_port_cases(#[case] url: &str, #[case] expected: &str) {
        assert_eq!(host_and_port(url), expected);
    }

    #[test]
    fn directory_plan_is_ordered_and_deduplicated() {
        let manifest = Manifest::new(vec![
            ManifestEntry::new("bin/app.exe", "1"),
            ManifestEntry::new("bin/plugins/a.dll", "2"),
            ManifestEntry::new("bin/plugins/b.dll", "3"),
            ManifestEntry::new("readme.txt", "4"),
        ]);
        let plan = directory_plan(&manifest, "/releases/v2", &ExtensionPolicy::default());
        assert_eq!(
            plan,
            vec![
                "releases",
                "releases/v2",
                "releases/v2/bin",
                "releases/v2/bin/plugins",
            ]
        );
    }

    #[test]
    fn remote_path_applies_extension_policy() {
        let policy = ExtensionPolicy {
            allow_files_without_extensions: false,
            temporal_file_extension: Some("tmp".to_string()),
        };
        assert_eq!(remote_path("/site", "bin/tool", &policy), "site/bin/tool.tmp");
        assert_eq!(remote_path("", "a.txt", &policy), "a.txt");
    }

    #[test]
    fn writer_requires_valid_config() {
        let mut config = FtpConfig::new("ftp.example.com", "user", "pass");
        config.extensions.allow_files_without_extensions = false;
        assert!(FtpWriter::new(config).is_err());
    }
}
