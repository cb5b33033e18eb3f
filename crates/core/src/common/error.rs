//! Error definitions.
//!
//! This module defines the failure taxonomy of the core. It provides:
//! 1. **Region Errors:** Cartridge capacity and memory map validation failures.
//! 2. **Snapshot Errors:** Decode and layout failures; a failed decode never touches live state.
//! 3. **Engine Errors:** Plugin failures and attach/detach while running.
//! 4. **Store Errors:** Persistent store failures, which callers log rather than propagate.
//!
//! Unmapped accesses are not errors (they read the unmapped value and drop writes), and an
//! empty rewind history is `None`, not an error.

use thiserror::Error;

/// Crate result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the emulator core.
#[derive(Debug, Error)]
pub enum Error {
    /// The cartridge image exceeds the reserved slot capacity.
    #[error("cartridge of {size} bytes exceeds the {max}-byte slot")]
    RegionTooLarge {
        /// Size of the rejected image.
        size: usize,
        /// Capacity of the cartridge window.
        max: usize,
    },

    /// Two configured regions claim the same address.
    #[error("region {first} overlaps region {second}")]
    RegionOverlap {
        /// Name of the lower region.
        first: String,
        /// Name of the overlapping region.
        second: String,
    },

    /// A configured region extends past the 32-bit address space or is empty.
    #[error("region {name} at {base:#010x} with size {size:#x} does not fit the address space")]
    RegionOutOfRange {
        /// Region name.
        name: String,
        /// Region base address.
        base: u32,
        /// Region size in bytes.
        size: u32,
    },

    /// The snapshot buffer is smaller than the configured layout requires.
    #[error("snapshot too short: expected {expected} bytes, found {actual}")]
    SnapshotTooShort {
        /// Required length.
        expected: usize,
        /// Supplied length.
        actual: usize,
    },

    /// The snapshot buffer is longer than the configured layout allows.
    #[error("snapshot has {extra} trailing bytes")]
    SnapshotTrailingBytes {
        /// Number of unexpected bytes after the last region.
        extra: usize,
    },

    /// The snapshot header names an unsupported schema version.
    #[error("snapshot schema version {found} is not supported (expected {expected})")]
    SchemaVersionMismatch {
        /// Version the codec writes and reads.
        expected: u32,
        /// Version found in the header.
        found: u32,
    },

    /// Region payloads do not match the codec layout.
    #[error("snapshot region {index} does not match the layout: {reason}")]
    SnapshotLayoutMismatch {
        /// Position of the offending payload.
        index: usize,
        /// What disagreed.
        reason: String,
    },

    /// The external engine reported a failure.
    #[error("engine failure: {0}")]
    EngineFailure(String),

    /// Engines can only be swapped while the scheduler is stopped.
    #[error("cannot swap engines while the scheduler is running")]
    EngineBusy,

    /// Speed multipliers are restricted to 1, 2, 4 and 8.
    #[error("invalid speed multiplier x{0} (expected 1, 2, 4 or 8)")]
    InvalidSpeed(u32),

    /// The requested cartridge is not in the ROM library.
    #[error("cartridge {0} not found in the library")]
    RomNotFound(String),

    /// Configuration could not be read or parsed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Reading a file from disk failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A persistent store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failures of the persistent store collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend I/O failed.
    #[error("store i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be encoded or decoded.
    #[error("store encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// Keys and collection names are restricted to `[A-Za-z0-9_.-]`.
    #[error("invalid store key {0:?}")]
    InvalidKey(String),

    /// Any other backend-reported failure.
    #[error("store backend error: {0}")]
    Backend(String),
}
