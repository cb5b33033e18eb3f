//! In-memory persistent store.
//!
//! Holds every collection in a map behind a mutex. Used for tests and for sessions that do not
//! need to survive the process.

use super::{PersistentStore, Record};
use crate::common::error::StoreError;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

type Collections = HashMap<String, BTreeMap<String, Record>>;

/// Volatile store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<Collections>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of records in `collection`.
    pub fn len(&self, collection: &str) -> usize {
        self.lock().get(collection).map_or(0, BTreeMap::len)
    }

    /// Returns whether `collection` holds no records.
    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    fn lock(&self) -> MutexGuard<'_, Collections> {
        self.collections.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PersistentStore for MemoryStore {
    fn put(&self, collection: &str, record: Record) -> Result<(), StoreError> {
        let _ = self
            .lock()
            .entry(collection.to_string())
            .or_default()
            .insert(record.key.clone(), record);
        Ok(())
    }

    fn get(&self, collection: &str, key: &str) -> Result<Option<Record>, StoreError> {
        Ok(self
            .lock()
            .get(collection)
            .and_then(|records| records.get(key))
            .cloned())
    }

    fn delete(&self, collection: &str, key: &str) -> Result<(), StoreError> {
        if let Some(records) = self.lock().get_mut(collection) {
            let _ = records.remove(key);
        }
        Ok(())
    }

    fn enumerate(&self, collection: &str) -> Result<Vec<Record>, StoreError> {
        Ok(self
            .lock()
            .get(collection)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default())
    }
}
