//! # relay-transport
//!
//! The contract every transport backend satisfies, plus the backends
//! themselves.
//!
//! - [`Writer`] pushes a built tree and its manifest to a destination.
//! - [`Loader`] pulls a published manifest and the files it names.
//! - [`Reporter`] carries progress and status [`Event`]s back to whoever is
//!   listening.
//!
//! Transfers are best-effort per file: a file that fails to move is reported
//! and skipped, never fatal to the batch. Whether a transfer actually
//! succeeded is decided afterwards by hashing what arrived.

pub mod batch;
pub mod contract;
pub mod error;
pub mod events;
pub mod ftp;
pub mod http;
pub mod local;

pub use contract::{FailedTransfer, Loader, TransferSummary, Writer};
pub use error::TransportError;
pub use events::{Event, Reporter};
pub use ftp::FtpWriter;
pub use http::HttpLoader;
pub use local::{LocalLoader, LocalWriter};
