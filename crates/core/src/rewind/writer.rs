//! Background write-through to the persistent store.
//!
//! Jobs are executed on a single named thread in the order they were enqueued. A failed job is
//! logged and counted; it never stops the writer and never reaches the caller that enqueued it.

use crate::common::error::Result;
use crate::storage::{PersistentStore, Record};
use crossbeam::channel::{self, Receiver, Sender};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};

enum Job {
    Put {
        collection: &'static str,
        record: Record,
    },
    Delete {
        collection: &'static str,
        key: String,
    },
    Flush(Sender<()>),
}

/// Handle to the writer thread. Dropping it drains the queue and joins the thread.
pub struct PersistWriter {
    tx: Option<Sender<Job>>,
    handle: Option<JoinHandle<()>>,
    failures: Arc<AtomicU64>,
}

impl PersistWriter {
    /// Starts the writer thread over `store`.
    pub fn spawn(store: Arc<dyn PersistentStore>) -> Result<Self> {
        let (tx, rx) = channel::unbounded::<Job>();
        let failures = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&failures);
        let handle = thread::Builder::new()
            .name("rewind-persist".to_string())
            .spawn(move || run(store.as_ref(), &rx, &counter))?;
        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
            failures,
        })
    }

    /// Enqueues an insert or replace.
    pub fn put(&self, collection: &'static str, record: Record) {
        self.send(Job::Put { collection, record });
    }

    /// Enqueues a delete.
    pub fn delete(&self, collection: &'static str, key: String) {
        self.send(Job::Delete { collection, key });
    }

    /// Blocks until every job enqueued before this call has been attempted.
    pub fn flush(&self) {
        let (done_tx, done_rx) = channel::bounded(1);
        self.send(Job::Flush(done_tx));
        let _ = done_rx.recv();
    }

    /// Returns the number of jobs that failed so far.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    fn send(&self, job: Job) {
        let sent = self.tx.as_ref().is_some_and(|tx| tx.send(job).is_ok());
        if !sent {
            tracing::warn!("rewind writer is gone; durable write dropped");
            let _ = self.failures.fetch_add(1, Ordering::Relaxed);
        }
    }
}

fn run(store: &dyn PersistentStore, rx: &Receiver<Job>, failures: &AtomicU64) {
    while let Ok(job) = rx.recv() {
        let outcome = match job {
            Job::Put { collection, record } => {
                let key = record.key.clone();
                store.put(collection, record).map_err(|e| (collection, key, e))
            }
            Job::Delete { collection, key } => store
                .delete(collection, &key)
                .map_err(|e| (collection, key, e)),
            Job::Flush(done) => {
                let _ = done.send(());
                Ok(())
            }
        };
        if let Err((collection, key, error)) = outcome {
            let _ = failures.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(collection, %key, %error, "persistent store write failed");
        }
    }
}

impl Drop for PersistWriter {
    fn drop(&mut self) {
        drop(self.tx.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("rewind writer thread panicked");
            }
        }
    }
}

impl std::fmt::Debug for PersistWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistWriter")
            .field("running", &self.handle.is_some())
            .field("failures", &self.failures())
            .finish()
    }
}
