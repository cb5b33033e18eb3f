//! Rewind entries and their identifiers.

use crate::storage::{Metadata, Record, now_millis};
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SEQ: AtomicU64 = AtomicU64::new(0);

/// One snapshot held by the rewind ring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewindEntry {
    /// Unique id (`s_<ms>_<pid>_<seq>`), also the key in the `saves` collection.
    pub id: String,
    /// Milliseconds since the Unix epoch; non-decreasing across pushes.
    pub timestamp: u64,
    /// Encoded snapshot.
    pub payload: Arc<[u8]>,
    /// Tags such as `rom`, `autosave` or `imported`.
    pub metadata: Metadata,
}

impl RewindEntry {
    /// Converts the entry into a `saves` record.
    pub fn to_record(&self) -> Record {
        Record {
            key: self.id.clone(),
            timestamp: self.timestamp,
            data: self.payload.to_vec(),
            meta: self.metadata.clone(),
        }
    }

    /// Rebuilds an entry from a `saves` record.
    pub fn from_record(record: Record) -> Self {
        Self {
            id: record.key,
            timestamp: record.timestamp,
            payload: record.data.into(),
            metadata: record.meta,
        }
    }
}

/// Generates unique, time-ordered entry ids.
///
/// The timestamp never goes backwards even if the wall clock does. The sequence number is
/// shared by every ring in the process and the process id separates concurrent writers, so
/// rings over one store never mint the same id.
#[derive(Debug, Default)]
pub(crate) struct EntryIds {
    last_ms: u64,
}

impl EntryIds {
    /// Continues after already persisted entries: later timestamps, higher sequence numbers.
    pub(crate) fn resume_after(&mut self, entries: &[RewindEntry]) {
        for entry in entries {
            self.last_ms = self.last_ms.max(entry.timestamp);
            if let Some(seq) = entry_seq(&entry.id) {
                let _ = NEXT_SEQ.fetch_max(seq.saturating_add(1), Ordering::Relaxed);
            }
        }
    }

    /// Returns the next `(id, timestamp)` pair.
    pub(crate) fn next(&mut self) -> (String, u64) {
        let ts = now_millis().max(self.last_ms);
        self.last_ms = ts;
        let seq = NEXT_SEQ.fetch_add(1, Ordering::Relaxed);
        (format!("s_{ts}_{}_{seq}", process::id()), ts)
    }
}

/// Parses the trailing sequence number of an entry id.
pub fn entry_seq(id: &str) -> Option<u64> {
    id.rsplit_once('_').and_then(|(_, seq)| seq.parse().ok())
}
