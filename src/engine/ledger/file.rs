use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::memory::MemoryLedger;
use super::{Entries, Ledger, StoreError};

/// A ledger persisted as a JSON snapshot (`{"key": "value", ...}`).
///
/// The snapshot is loaded on [`FileLedger::open`] and written back by
/// [`FileLedger::save`]. Writes in between only touch memory, so a process
/// that fails before `save` leaves the file untouched.
#[derive(Debug)]
pub struct FileLedger {
    path: PathBuf,
    inner: MemoryLedger,
}

impl FileLedger {
    /// Open the snapshot at `path`. A missing file is an empty ledger.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let inner = if path.exists() {
            let raw = std::fs::read(&path).map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
            let entries: BTreeMap<String, String> =
                serde_json::from_slice(&raw).map_err(|source| StoreError::Snapshot {
                    path: path.clone(),
                    source,
                })?;
            log::debug!("Loaded {} keys from {}", entries.len(), path.display());
            MemoryLedger::from_map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, v.into_bytes()))
                    .collect(),
            )
        } else {
            log::debug!("No ledger at {}, starting empty", path.display());
            MemoryLedger::new()
        };
        Ok(Self { path, inner })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the number of stored keys
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Write the snapshot next to the target and rename it into place.
    pub fn save(&self) -> Result<(), StoreError> {
        let mut entries = BTreeMap::new();
        for (key, value) in self.inner.snapshot() {
            let value = String::from_utf8(value).map_err(|_| StoreError::Encoding(key.clone()))?;
            entries.insert(key, value);
        }
        let raw = serde_json::to_vec_pretty(&entries).map_err(|source| StoreError::Snapshot {
            path: self.path.clone(),
            source,
        })?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, raw).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;

        log::debug!("Saved {} keys to {}", entries.len(), self.path.display());
        Ok(())
    }
}

impl Ledger for FileLedger {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.inner.get(key)
    }

    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.inner.put(key, value)
    }

    fn range_query(&self, start: &str, end: &str) -> Result<Entries<'_>, StoreError> {
        self.inner.range_query(start, end)
    }

    fn put_all(&self, entries: Vec<(String, Vec<u8>)>) -> Result<(), StoreError> {
        self.inner.put_all(entries)
    }
}
