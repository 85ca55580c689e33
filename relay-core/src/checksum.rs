//! MD5 content digests.
//!
//! The digest only guards against accidental change between build and
//! validate; it is not a security boundary.

use std::fs::File;
use std::path::Path;

use md5::{Digest, Md5};

use crate::error::{io_err, CoreError};

/// Lowercase hex MD5 of a file's bytes.
///
/// The file is streamed, never loaded whole. Metadata (mtime, permissions)
/// does not take part in the digest.
pub fn hash_file(path: &Path) -> Result<String, CoreError> {
    let mut file = File::open(path).map_err(|e| io_err(path, e))?;
    let mut hasher = Md5::new();
    std::io::copy(&mut file, &mut hasher).map_err(|e| io_err(path, e))?;
    Ok(hex::encode(hasher.finalize()))
}

/// Lowercase hex MD5 of an in-memory buffer.
pub fn hash_bytes(bytes: &[u8]) -> String {
    hex::encode(Md5::digest(bytes))
}
