//! relay-sync: manifest building, validation, publishing and updating.
//!
//! The operations here are synchronous and blocking. Progress and status go
//! through the [`relay_transport::Reporter`] passed into each call.

pub mod error;
pub mod manifest_builder;
pub mod publisher;
pub mod updater;
pub mod validator;
pub mod vcs;

pub use error::SyncError;
pub use manifest_builder::{build_manifest, build_manifest_with, FileFilter};
pub use publisher::{build_and_publish, PublishOutcome, PublishRequest};
pub use updater::{ScratchDir, UpdateOptions, UpdateOutcome, Updater};
pub use validator::{validate, validate_with, InvalidEntry, Problem};
pub use vcs::{CommitSource, FixedCommit, GitCommit};
