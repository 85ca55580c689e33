//! Relay core library: manifest model, path/hash utilities, configuration.
//!
//! Public API surface:
//! - [`manifest`]: [`Manifest`] and [`ManifestEntry`], JSON load / save
//! - [`paths`]: separator normalization, joining, directory prefixes
//! - [`checksum`]: MD5 content digests
//! - [`fsutil`]: copy / remove helpers shared by transports and the updater
//! - [`config`]: [`RelayConfig`] and transport settings
//! - [`error`]: [`CoreError`]

pub mod checksum;
pub mod config;
pub mod error;
pub mod fsutil;
pub mod manifest;
pub mod paths;

pub use config::{ExtensionPolicy, FtpConfig, HttpConfig, RelayConfig, TransportKind};
pub use error::CoreError;
pub use manifest::{Manifest, ManifestEntry};
