//! Cartridge library.
//!
//! Stores cartridge images in the `roms` collection and remembers the most recently loaded one
//! through the `lastROM` pointer in the `meta` collection.

use super::{Metadata, PersistentStore, Record, now_millis};
use crate::common::constants::{LAST_ROM_KEY, META_COLLECTION, ROMS_COLLECTION};
use crate::common::error::{Error, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Pointer to the most recently loaded cartridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastRom {
    /// Library record id.
    pub id: String,
    /// Display name.
    pub name: String,
}

/// Cartridge records over a [`PersistentStore`].
pub struct RomLibrary {
    store: Arc<dyn PersistentStore>,
    seq: AtomicU64,
}

impl RomLibrary {
    /// Creates a library over `store`.
    pub fn new(store: Arc<dyn PersistentStore>) -> Self {
        Self {
            store,
            seq: AtomicU64::new(0),
        }
    }

    /// Stores a cartridge image and returns its id (`rom_<ms>_<seq>`).
    ///
    /// # Arguments
    ///
    /// * `name` - Display name, usually the file name.
    /// * `bytes` - Raw cartridge image.
    pub fn add(&self, name: &str, bytes: &[u8]) -> Result<String> {
        let timestamp = now_millis();
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let id = format!("rom_{timestamp}_{seq}");

        let mut meta = Metadata::new();
        let _ = meta.insert("name".into(), name.to_string());
        let _ = meta.insert("size".into(), bytes.len().to_string());
        let _ = meta.insert("addedAt".into(), timestamp.to_string());

        self.store.put(
            ROMS_COLLECTION,
            Record {
                key: id.clone(),
                timestamp,
                data: bytes.to_vec(),
                meta,
            },
        )?;
        tracing::info!(%id, name, size = bytes.len(), "cartridge added to library");
        Ok(id)
    }

    /// Returns the id of a stored cartridge with this name and image, adding one if none exists.
    pub fn find_or_add(&self, name: &str, bytes: &[u8]) -> Result<String> {
        let existing = self
            .list()?
            .into_iter()
            .find(|r| r.meta.get("name").is_some_and(|n| n == name) && r.data == bytes);
        match existing {
            Some(record) => {
                tracing::debug!(id = %record.key, name, "cartridge already in library");
                Ok(record.key)
            }
            None => self.add(name, bytes),
        }
    }

    /// Returns every stored cartridge, newest first.
    pub fn list(&self) -> Result<Vec<Record>> {
        let mut records = self.store.enumerate(ROMS_COLLECTION)?;
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| b.key.cmp(&a.key)));
        Ok(records)
    }

    /// Fetches a cartridge record.
    ///
    /// # Errors
    ///
    /// `RomNotFound` if no record has this id.
    pub fn get(&self, id: &str) -> Result<Record> {
        self.store
            .get(ROMS_COLLECTION, id)?
            .ok_or_else(|| Error::RomNotFound(id.to_string()))
    }

    /// Removes a cartridge; clears the `lastROM` pointer if it referred to it.
    pub fn remove(&self, id: &str) -> Result<()> {
        self.store.delete(ROMS_COLLECTION, id)?;
        if self.last()?.is_some_and(|last| last.id == id) {
            self.clear_last()?;
        }
        Ok(())
    }

    /// Records `id` as the most recently loaded cartridge.
    pub fn set_last(&self, id: &str, name: &str) -> Result<()> {
        let mut meta = Metadata::new();
        let _ = meta.insert("id".into(), id.to_string());
        let _ = meta.insert("name".into(), name.to_string());
        self.store
            .put(META_COLLECTION, Record::pointer(LAST_ROM_KEY, meta))?;
        Ok(())
    }

    /// Returns the `lastROM` pointer, if set.
    pub fn last(&self) -> Result<Option<LastRom>> {
        let Some(record) = self.store.get(META_COLLECTION, LAST_ROM_KEY)? else {
            return Ok(None);
        };
        Ok(record.meta.get("id").map(|id| LastRom {
            id: id.clone(),
            name: record.meta.get("name").cloned().unwrap_or_default(),
        }))
    }

    /// Removes the `lastROM` pointer.
    pub fn clear_last(&self) -> Result<()> {
        self.store.delete(META_COLLECTION, LAST_ROM_KEY)?;
        Ok(())
    }
}

impl std::fmt::Debug for RomLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RomLibrary")
            .field("seq", &self.seq.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
