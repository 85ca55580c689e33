//! HTTP download transport (pull side only).
//!
//! The published build is expected under a base URL, one GET per file:
//! `<url>/<manifest_name>`, `<url>/<relative_path>`.

use std::fmt;
use std::fs::{self, File};
use std::path::Path;
use std::time::Duration;

use relay_core::{paths, HttpConfig, Manifest};

use crate::batch::run_batched;
use crate::contract::{Loader, TransferSummary};
use crate::error::{io_err, TransportError};
use crate::events::Reporter;

/// Downloads a published build over HTTP(S).
#[derive(Clone)]
pub struct HttpLoader {
    config: HttpConfig,
    agent: ureq::Agent,
}

impl fmt::Debug for HttpLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpLoader")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HttpLoader {
    pub fn new(config: HttpConfig) -> Result<Self, TransportError> {
        config.validate()?;
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();
        Ok(Self { config, agent })
    }

    /// Absolute URL of a path under the configured base.
    pub fn url_for(&self, relative_path: &str) -> String {
        let base = self.config.url.trim();
        let base = if base.starts_with("http://") || base.starts_with("https://") {
            base.to_string()
        } else {
            format!("http://{base}")
        };
        paths::join([base.as_str(), relative_path])
    }

    fn get(&self, url: &str) -> Result<ureq::Response, TransportError> {
        self.agent.get(url).call().map_err(|source| match source {
            ureq::Error::Status(404, _) => TransportError::ManifestNotFound {
                location: url.to_string(),
            },
            source => TransportError::Http {
                url: url.to_string(),
                source: Box::new(source),
            },
        })
    }

    fn download(&self, url: &str, destination: &Path) -> Result<(), String> {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|e| io_err(parent, e).to_string())?;
        }
        let response = self.agent.get(url).call().map_err(|e| e.to_string())?;
        let mut body = response.into_reader();
        let mut file =
            File::create(destination).map_err(|e| io_err(destination, e).to_string())?;
        if let Err(err) = std::io::copy(&mut body, &mut file) {
            drop(file);
            let _ = fs::remove_file(destination);
            return Err(io_err(destination, err).to_string());
        }
        Ok(())
    }
}

impl Loader for HttpLoader {
    fn load_manifest(
        &self,
        manifest_name: &str,
        reporter: &Reporter,
    ) -> Result<Manifest, TransportError> {
        let url = self.url_for(manifest_name);
        reporter.status(format!("Downloading {url}"));
        let body = self
            .get(&url)?
            .into_string()
            .map_err(|e| io_err(manifest_name, e))?;
        Ok(Manifest::from_json(&body)?)
    }

    fn load_files(
        &self,
        manifest: &Manifest,
        destination: &Path,
        reporter: &Reporter,
    ) -> Result<TransferSummary, TransportError> {
        fs::create_dir_all(destination).map_err(|e| io_err(destination, e))?;

        let summary = run_batched(
            &manifest.entries,
            self.config.concurrent_downloads,
            reporter,
            |entry| {
                reporter.status(format!("Downloading {}", entry.relative_path));
                entry.check_path().map_err(|e| e.to_string())?;
                let remote = self.config.extensions.remote_name(&entry.relative_path);
                let url = self.url_for(&remote);
                // Stored under the manifest name, without any temporal extension.
                self.download(&url, &destination.join(&entry.relative_path))
            },
        );

        reporter.status("Finished downloading all files");
        Ok(summary)
    }
}
