//! Release identification for installed mod binaries.
//!
//! The version tables shipped with each mod are MD5 digests of the release DLLs, so the
//! fingerprint is an MD5 over the whole file. It only identifies releases; it is not a
//! security check.

use super::ModDescriptor;
use anyhow::{Context, Result};
use camino::Utf8Path;
use md5::{Digest, Md5};
use std::fs::File;
use std::io::Read;

pub const UNKNOWN_VERSION: &str = "Unknown Version";

/// Lowercase hex MD5 of the file at `path`.
pub fn file_hash(path: &Utf8Path) -> Result<String> {
    let mut file = File::open(path).with_context(|| format!("Failed to open {}", path))?;
    let mut hasher = Md5::new();
    let mut buffer = [0u8; 8192];
    loop {
        let read = file
            .read(&mut buffer)
            .with_context(|| format!("Failed to read {}", path))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Identify the release installed at `binary`.
///
/// Returns `Ok(None)` when the file does not exist, and [`UNKNOWN_VERSION`] when its hash is
/// not in the descriptor's table.
pub fn fingerprint(binary: &Utf8Path, descriptor: &ModDescriptor) -> Result<Option<String>> {
    if !binary.exists() {
        return Ok(None);
    }

    let hash = file_hash(binary)?;
    let version = descriptor
        .version_for_hash(&hash)
        .unwrap_or(UNKNOWN_VERSION);

    tracing::debug!("Fingerprinted {} as {} ({})", binary, version, hash);
    Ok(Some(version.to_string()))
}
