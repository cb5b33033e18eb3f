//! Cartridge file loading.
//!
//! This module reads cartridge images from disk. It performs:
//! 1. **Binary loading:** Reads the whole file into a byte buffer.
//! 2. **Naming:** Derives the display name used for snapshot tags and exported saves.

use crate::common::error::Result;
use crate::core::CartridgeMeta;
use std::fs;
use std::path::Path;

/// Loads a binary file from disk into a byte vector.
///
/// # Arguments
///
/// * `path` - Path to the binary file.
///
/// # Returns
///
/// The raw bytes of the file.
pub fn load_binary(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    tracing::debug!(path = %path.display(), size = bytes.len(), "binary read");
    Ok(bytes)
}

/// Builds cartridge metadata named after the file name of `path`.
pub fn cartridge_meta(path: impl AsRef<Path>) -> CartridgeMeta {
    let name = path
        .as_ref()
        .file_name()
        .map_or_else(|| "rom".to_string(), |n| n.to_string_lossy().into_owned());
    CartridgeMeta::named(name)
}
