//! Relay configuration (YAML).
//!
//! # Lookup order
//!
//! 1. an explicit `--config <path>`
//! 2. `./relay.yaml`
//! 3. `<config dir>/relay/config.yaml` (`dirs::config_dir()`)
//! 4. built-in defaults
//!
//! ```yaml
//! manifest_name: manifest.json
//! include: "*"
//! exclude: ".pdb"
//! retries: 3
//! concurrency: 4
//! http:
//!   url: downloads.example.com/builds/latest
//!   concurrent_downloads: 4
//! ftp:
//!   url: ftp.example.com
//!   username: deploy
//!   password: secret
//!   allow_files_without_extensions: false
//!   temporal_file_extension: bin
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{io_err, CoreError};
use crate::paths;

pub const DEFAULT_MANIFEST_NAME: &str = "manifest.json";
pub const DEFAULT_RETRIES: u32 = 3;
pub const DEFAULT_CONCURRENCY: usize = 1;
pub const CONFIG_FILE_NAME: &str = "relay.yaml";

// ---------------------------------------------------------------------------
// Transport kinds
// ---------------------------------------------------------------------------

/// The concrete transport a command talks to.
///
/// Resolved to a Writer/Loader implementation by the CLI, never inside the
/// sync logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Local,
    Ftp,
    Http,
}

impl TransportKind {
    pub fn all() -> &'static [TransportKind] {
        &[TransportKind::Local, TransportKind::Ftp, TransportKind::Http]
    }

    /// Can publish builds.
    pub fn can_write(self) -> bool {
        matches!(self, TransportKind::Local | TransportKind::Ftp)
    }

    /// Can serve builds to the updater.
    pub fn can_load(self) -> bool {
        matches!(self, TransportKind::Local | TransportKind::Http)
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Local => write!(f, "local"),
            TransportKind::Ftp => write!(f, "ftp"),
            TransportKind::Http => write!(f, "http"),
        }
    }
}

impl FromStr for TransportKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" | "0" => Ok(TransportKind::Local),
            "ftp" | "1" => Ok(TransportKind::Ftp),
            "http" | "2" => Ok(TransportKind::Http),
            other => Err(CoreError::InvalidArgument(format!(
                "unknown transport '{other}'; expected: local, ftp, http"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Transport settings
// ---------------------------------------------------------------------------

/// Some servers refuse file names without an extension. When
/// `allow_files_without_extensions` is false, such files travel under
/// `<name>.<temporal_file_extension>` and are restored to `<name>` locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionPolicy {
    #[serde(default = "default_true")]
    pub allow_files_without_extensions: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporal_file_extension: Option<String>,
}

impl Default for ExtensionPolicy {
    fn default() -> Self {
        Self {
            allow_files_without_extensions: true,
            temporal_file_extension: None,
        }
    }
}

impl ExtensionPolicy {
    pub fn validate(&self) -> Result<(), CoreError> {
        let has_ext = self
            .temporal_file_extension
            .as_deref()
            .is_some_and(|ext| !ext.trim_start_matches('.').is_empty());
        if !self.allow_files_without_extensions && !has_ext {
            return Err(CoreError::InvalidArgument(
                "temporal_file_extension is required when files without extensions are not allowed"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// The name a file travels under on the remote side.
    pub fn remote_name(&self, relative_path: &str) -> String {
        if self.allow_files_without_extensions || paths::has_extension(relative_path) {
            return relative_path.to_string();
        }
        match self.temporal_file_extension.as_deref() {
            Some(ext) => format!("{relative_path}.{}", ext.trim_start_matches('.')),
            None => relative_path.to_string(),
        }
    }
}

/// HTTP download endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Base URL of the published build; `http://` is assumed without a scheme.
    pub url: String,
    #[serde(flatten)]
    pub extensions: ExtensionPolicy,
    #[serde(default = "default_concurrency")]
    pub concurrent_downloads: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl HttpConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            extensions: ExtensionPolicy::default(),
            concurrent_downloads: DEFAULT_CONCURRENCY,
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.url.trim().is_empty() {
            return Err(CoreError::InvalidArgument("http.url is empty".to_string()));
        }
        if self.concurrent_downloads == 0 {
            return Err(CoreError::InvalidArgument(
                "http.concurrent_downloads must be at least 1".to_string(),
            ));
        }
        self.extensions.validate()
    }
}

/// FTP upload endpoint. Credentials are passed through as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FtpConfig {
    /// `host`, `host:port` or `ftp://host[:port]`.
    pub url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(flatten)]
    pub extensions: ExtensionPolicy,
}

impl FtpConfig {
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            username: username.into(),
            password: password.into(),
            extensions: ExtensionPolicy::default(),
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.url.trim().is_empty() {
            return Err(CoreError::InvalidArgument("ftp.url is empty".to_string()));
        }
        self.extensions.validate()
    }
}

// ---------------------------------------------------------------------------
// Root config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub manifest_name: String,
    /// File-name glob a file must match to enter the manifest.
    pub include: String,
    /// File-name suffix that keeps a file out of the manifest.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<String>,
    /// Download attempts per update before giving up.
    pub retries: u32,
    /// Maximum in-flight transfers for loaders.
    pub concurrency: usize,
    /// Staging directory for updates; defaults next to the local tree.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scratch_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ftp: Option<FtpConfig>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            manifest_name: DEFAULT_MANIFEST_NAME.to_string(),
            include: "*".to_string(),
            exclude: None,
            retries: DEFAULT_RETRIES,
            concurrency: DEFAULT_CONCURRENCY,
            scratch_dir: None,
            http: None,
            ftp: None,
        }
    }
}

impl RelayConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.manifest_name.trim().is_empty() {
            return Err(CoreError::InvalidArgument(
                "manifest_name is empty".to_string(),
            ));
        }
        if self.retries == 0 {
            return Err(CoreError::InvalidArgument(
                "retries must be at least 1".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(CoreError::InvalidArgument(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if let Some(http) = &self.http {
            http.validate()?;
        }
        if let Some(ftp) = &self.ftp {
            ftp.validate()?;
        }
        Ok(())
    }
}

/// Load and validate a config file.
pub fn load_at(path: &Path) -> Result<RelayConfig, CoreError> {
    if !path.exists() {
        return Err(CoreError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let config: RelayConfig =
        serde_yaml::from_str(&contents).map_err(|source| CoreError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
    config.validate()?;
    Ok(config)
}

/// Resolve the config following the lookup order in the module docs.
///
/// An explicit path must exist; implicit locations are skipped when absent.
pub fn discover(explicit: Option<&Path>, cwd: &Path) -> Result<RelayConfig, CoreError> {
    if let Some(path) = explicit {
        return load_at(path);
    }
    for candidate in default_locations(cwd) {
        if candidate.is_file() {
            tracing::debug!("using config {}", candidate.display());
            return load_at(&candidate);
        }
    }
    Ok(RelayConfig::default())
}

fn default_locations(cwd: &Path) -> Vec<PathBuf> {
    let mut locations = vec![cwd.join(CONFIG_FILE_NAME)];
    if let Some(dir) = dirs::config_dir() {
        locations.push(dir.join("relay").join("config.yaml"));
    }
    locations
}

fn default_true() -> bool {
    true
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_timeout_secs() -> u64 {
    30
}
