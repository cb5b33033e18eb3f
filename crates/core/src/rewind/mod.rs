//! Rewind history.
//!
//! This module keeps recent machine snapshots for stepping backwards in time. It provides:
//! 1. **Entries:** Snapshot bytes with a unique, time-ordered id and string tags.
//! 2. **Ring:** A bounded, mutex-guarded queue that evicts the oldest entry when full.
//! 3. **Write-through:** A background writer that mirrors pushes, evictions and the
//!    `lastSave` pointer to the persistent store without blocking the caller.
//! 4. **Resume:** A new ring reloads the newest persisted saves up to its capacity and drops
//!    the rest; `latest` still falls back to the persisted pointer when the ring is empty.

/// Entry type and id generation.
pub mod entry;
/// The ring itself.
pub mod store;
/// Background persistence thread.
pub mod writer;

pub use entry::RewindEntry;
pub use store::RewindStore;
pub use writer::PersistWriter;
