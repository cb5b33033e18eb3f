//! Bounded rewind ring with write-through persistence.

use super::entry::{EntryIds, RewindEntry, entry_seq};
use super::writer::PersistWriter;
use crate::common::constants::{LAST_SAVE_KEY, META_COLLECTION, SAVES_COLLECTION};
use crate::common::error::Result;
use crate::storage::{Metadata, PersistentStore, Record};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Ring {
    entries: VecDeque<RewindEntry>,
    ids: EntryIds,
    current: Option<String>,
}

impl Ring {
    /// Keeps the newest `capacity` persisted saves and queues deletes for the rest.
    fn rehydrate(&mut self, records: Vec<Record>, capacity: usize, writer: &PersistWriter) {
        let mut entries: Vec<_> = records.into_iter().map(RewindEntry::from_record).collect();
        entries.sort_by_key(|e| (e.timestamp, entry_seq(&e.id)));
        self.ids.resume_after(&entries);

        let stale = entries.len().saturating_sub(capacity);
        for entry in entries.drain(..stale) {
            tracing::debug!(id = %entry.id, "stale save dropped");
            writer.delete(SAVES_COLLECTION, entry.id);
        }
        self.entries = entries.into();
        self.current = self.entries.back().map(|e| e.id.clone());
        if !self.entries.is_empty() {
            tracing::info!(restored = self.entries.len(), dropped = stale, "rewind history restored");
        }
    }
}

/// Holds the most recent snapshots in memory and mirrors them to a [`PersistentStore`].
///
/// All ring mutations happen under one mutex, and durable jobs are enqueued while it is held,
/// so the writer sees them in ring order.
pub struct RewindStore {
    ring: Mutex<Ring>,
    capacity: usize,
    store: Arc<dyn PersistentStore>,
    writer: PersistWriter,
}

impl RewindStore {
    /// Creates a ring of `max_slots` entries (at least 1) backed by `store`.
    ///
    /// Saves left by earlier sessions are loaded back, newest last; those beyond the capacity
    /// are deleted in the background. If they cannot be listed the ring starts empty.
    ///
    /// # Arguments
    ///
    /// * `max_slots` - Ring capacity.
    /// * `store` - Durable collaborator; written to from a background thread.
    pub fn new(max_slots: usize, store: Arc<dyn PersistentStore>) -> Result<Self> {
        let capacity = max_slots.max(1);
        let writer = PersistWriter::spawn(Arc::clone(&store))?;
        let mut ring = Ring::default();
        match store.enumerate(SAVES_COLLECTION) {
            Ok(records) => ring.rehydrate(records, capacity, &writer),
            Err(error) => tracing::warn!(%error, "could not list persisted saves"),
        }
        Ok(Self {
            ring: Mutex::new(ring),
            capacity,
            store,
            writer,
        })
    }

    /// Returns the ring capacity.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of entries held in memory.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Returns whether the ring is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the id of the entry the ring currently points at.
    pub fn current_id(&self) -> Option<String> {
        self.lock().current.clone()
    }

    /// Returns the ids in the ring, oldest first.
    pub fn ids(&self) -> Vec<String> {
        self.lock().entries.iter().map(|e| e.id.clone()).collect()
    }

    /// Returns the number of durable jobs that failed so far.
    pub fn persist_failures(&self) -> u64 {
        self.writer.failures()
    }

    /// Appends a snapshot, evicting the oldest entry when full.
    ///
    /// The new record, the eviction and the `lastSave` pointer are written through in the
    /// background; this call never waits for the store.
    pub fn push(&self, bytes: Vec<u8>, metadata: Metadata) -> RewindEntry {
        let mut ring = self.lock();
        let (id, timestamp) = ring.ids.next();
        let entry = RewindEntry {
            id,
            timestamp,
            payload: bytes.into(),
            metadata,
        };

        ring.entries.push_back(entry.clone());
        while ring.entries.len() > self.capacity {
            if let Some(evicted) = ring.entries.pop_front() {
                tracing::debug!(id = %evicted.id, "rewind entry evicted");
                self.writer.delete(SAVES_COLLECTION, evicted.id);
            }
        }
        ring.current = Some(entry.id.clone());

        self.writer.put(SAVES_COLLECTION, entry.to_record());
        self.writer
            .put(META_COLLECTION, last_save_pointer(&entry.id, entry.timestamp));
        entry
    }

    /// Stores an externally supplied snapshot; same path as [`RewindStore::push`].
    pub fn import_and_push(&self, bytes: Vec<u8>, metadata: Metadata) -> RewindEntry {
        self.push(bytes, metadata)
    }

    /// Returns the newest entry, falling back to the persisted `lastSave` pointer.
    ///
    /// Store failures are logged and reported as `None`.
    pub fn latest(&self) -> Option<RewindEntry> {
        if let Some(entry) = self.lock().entries.back() {
            return Some(entry.clone());
        }
        match self.load_last_save() {
            Ok(entry) => entry,
            Err(error) => {
                tracing::warn!(%error, "could not read last save");
                None
            }
        }
    }

    /// Discards the newest entry and returns the one before it.
    ///
    /// With fewer than two entries nothing is discarded and `None` is returned. The discarded
    /// record is deleted and the `lastSave` pointer moves to the returned entry.
    pub fn previous(&self) -> Option<RewindEntry> {
        let mut ring = self.lock();
        if ring.entries.len() < 2 {
            return None;
        }
        if let Some(discarded) = ring.entries.pop_back() {
            self.writer.delete(SAVES_COLLECTION, discarded.id);
        }
        let entry = ring.entries.back().cloned();
        if let Some(entry) = &entry {
            self.writer
                .put(META_COLLECTION, last_save_pointer(&entry.id, entry.timestamp));
        }
        ring.current = entry.as_ref().map(|e| e.id.clone());
        entry
    }

    /// Waits for every enqueued durable job to be attempted.
    pub fn flush(&self) {
        self.writer.flush();
    }

    /// Deletes every persisted save, resets the `lastSave` pointer and empties the ring.
    ///
    /// Returns the number of records deleted. Individual delete failures are logged and skipped.
    pub fn clear_all(&self) -> Result<usize> {
        let mut ring = self.lock();
        self.writer.flush();

        let mut deleted = 0;
        for record in self.store.enumerate(SAVES_COLLECTION)? {
            match self.store.delete(SAVES_COLLECTION, &record.key) {
                Ok(()) => deleted += 1,
                Err(error) => tracing::warn!(key = %record.key, %error, "could not delete save"),
            }
        }
        if let Err(error) = self.store.delete(META_COLLECTION, LAST_SAVE_KEY) {
            tracing::warn!(%error, "could not reset last save pointer");
        }

        ring.entries.clear();
        ring.current = None;
        tracing::info!(deleted, "rewind history cleared");
        Ok(deleted)
    }

    fn load_last_save(&self) -> Result<Option<RewindEntry>> {
        let Some(pointer) = self.store.get(META_COLLECTION, LAST_SAVE_KEY)? else {
            return Ok(None);
        };
        let Some(id) = pointer.meta.get("id") else {
            return Ok(None);
        };
        Ok(self
            .store
            .get(SAVES_COLLECTION, id)?
            .map(RewindEntry::from_record))
    }

    fn lock(&self) -> MutexGuard<'_, Ring> {
        self.ring.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn last_save_pointer(id: &str, timestamp: u64) -> Record {
    let mut meta = Metadata::new();
    let _ = meta.insert("id".into(), id.to_string());
    let _ = meta.insert("ts".into(), timestamp.to_string());
    Record {
        key: LAST_SAVE_KEY.to_string(),
        timestamp,
        data: Vec::new(),
        meta,
    }
}

impl std::fmt::Debug for RewindStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewindStore")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .field("writer", &self.writer)
            .finish_non_exhaustive()
    }
}
