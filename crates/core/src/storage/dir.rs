//! Directory-backed persistent store.
//!
//! Each collection is a subdirectory of the root. A record is stored as two files:
//! `<key>.bin` with the payload and `<key>.json` with the key, timestamp and metadata.
//! The JSON file is written last, so a record without it is treated as absent.

use super::{Metadata, PersistentStore, Record, validate_key};
use crate::common::error::StoreError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
struct RecordHeader {
    key: String,
    timestamp: u64,
    #[serde(default)]
    meta: Metadata,
}

/// Store rooted at a directory on disk.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Opens (creating if needed) a store rooted at `root`.
    ///
    /// # Arguments
    ///
    /// * `root` - Directory holding one subdirectory per collection.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_dir(&self, collection: &str) -> Result<PathBuf, StoreError> {
        validate_key(collection)?;
        Ok(self.root.join(collection))
    }

    fn paths(&self, collection: &str, key: &str) -> Result<(PathBuf, PathBuf), StoreError> {
        validate_key(key)?;
        let dir = self.collection_dir(collection)?;
        Ok((dir.join(format!("{key}.json")), dir.join(format!("{key}.bin"))))
    }
}

fn remove_if_present(path: &Path) -> Result<(), StoreError> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}

impl PersistentStore for DirStore {
    fn put(&self, collection: &str, record: Record) -> Result<(), StoreError> {
        let (header_path, data_path) = self.paths(collection, &record.key)?;
        fs::create_dir_all(self.collection_dir(collection)?)?;

        // Drop the header first so a crash between the two writes leaves no stale record.
        remove_if_present(&header_path)?;
        fs::write(&data_path, &record.data)?;
        let header = RecordHeader {
            key: record.key,
            timestamp: record.timestamp,
            meta: record.meta,
        };
        fs::write(&header_path, serde_json::to_vec_pretty(&header)?)?;
        Ok(())
    }

    fn get(&self, collection: &str, key: &str) -> Result<Option<Record>, StoreError> {
        let (header_path, data_path) = self.paths(collection, key)?;
        let header_bytes = match fs::read(&header_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let header: RecordHeader = serde_json::from_slice(&header_bytes)?;
        let data = match fs::read(&data_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(Record {
            key: header.key,
            timestamp: header.timestamp,
            data,
            meta: header.meta,
        }))
    }

    fn delete(&self, collection: &str, key: &str) -> Result<(), StoreError> {
        let (header_path, data_path) = self.paths(collection, key)?;
        remove_if_present(&header_path)?;
        remove_if_present(&data_path)
    }

    fn enumerate(&self, collection: &str) -> Result<Vec<Record>, StoreError> {
        let dir = self.collection_dir(collection)?;
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();

        let mut records = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(record) = self.get(collection, &key)? {
                records.push(record);
            }
        }
        Ok(records)
    }
}
