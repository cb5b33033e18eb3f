//! Persistent store contract.
//!
//! This module defines how the core talks to durable storage. It provides:
//! 1. **Records:** Keyed byte payloads with a timestamp and string metadata.
//! 2. **Contract:** `put`/`get`/`delete`/`enumerate` per named collection, all fallible.
//! 3. **Backends:** An in-memory store and a directory-backed store.
//! 4. **ROM library:** Cartridge records and the last-loaded pointer.
//!
//! The core never assumes a write is durable when `put` returns to a background writer; see
//! [`crate::rewind`] for how savestates are written through.

/// Directory-backed store.
pub mod dir;
/// Cartridge library over the `roms` collection.
pub mod library;
/// In-memory store.
pub mod memory;

pub use dir::DirStore;
pub use library::{LastRom, RomLibrary};
pub use memory::MemoryStore;

use crate::common::error::StoreError;
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// String metadata attached to records and rewind entries.
pub type Metadata = BTreeMap<String, String>;

/// One stored item.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    /// Key, unique within its collection.
    pub key: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// Payload bytes.
    pub data: Vec<u8>,
    /// Descriptive metadata.
    pub meta: Metadata,
}

impl Record {
    /// Creates a record with an empty payload.
    pub fn pointer(key: &str, meta: Metadata) -> Self {
        Self {
            key: key.to_string(),
            timestamp: now_millis(),
            data: Vec::new(),
            meta,
        }
    }
}

/// Keyed record store with named collections.
pub trait PersistentStore: Send + Sync {
    /// Inserts or replaces `record` in `collection`.
    fn put(&self, collection: &str, record: Record) -> Result<(), StoreError>;

    /// Fetches a record; `Ok(None)` when absent.
    fn get(&self, collection: &str, key: &str) -> Result<Option<Record>, StoreError>;

    /// Removes a record; removing an absent key succeeds.
    fn delete(&self, collection: &str, key: &str) -> Result<(), StoreError>;

    /// Returns every record of `collection`, ordered by key.
    fn enumerate(&self, collection: &str) -> Result<Vec<Record>, StoreError>;
}

/// Checks that a key or collection name is safe to use as a file name.
pub fn validate_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

/// Milliseconds since the Unix epoch; 0 if the clock is before the epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}
