//! The key-value store contract the engine runs on.
//!
//! A [`Ledger`] offers point reads, writes and an ordered, inclusive range
//! scan. Atomicity across the writes of one operation is provided by
//! [`WriteBatch`], which stages writes and hands them to the store in one
//! [`Ledger::put_all`] call.

mod batch;
mod file;
mod memory;

use std::path::PathBuf;

use serde::{de::DeserializeOwned, Serialize};

use crate::engine::error::{Entity, Error};
use crate::engine::logger::Logger;

pub use batch::WriteBatch;
pub use file::FileLedger;
pub use memory::MemoryLedger;

/// Ordered `(key, value)` pairs produced by a range scan.
pub type Entries<'a> = Box<dyn Iterator<Item = (String, Vec<u8>)> + 'a>;

/// Failures of the underlying store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt ledger snapshot {path}: {source}")]
    Snapshot {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Value under key {0} is not valid UTF-8")]
    Encoding(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Get/Put/RangeQuery over a lexicographically ordered key space.
///
/// Writes take `&self`: a store is a handle, and the components of one
/// operation share the same handle.
pub trait Ledger {
    /// Value stored under `key`, or `None` if absent.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    /// Entries with `start <= key <= end`, ascending by key.
    /// An inverted range yields nothing.
    ///
    /// The entries reflect the store at the time of the call. The in-process
    /// stores copy the matching entries out before returning, because their
    /// `RefCell` borrow cannot be held across later writes. Callers that only
    /// need part of a large range should narrow the bounds.
    fn range_query(&self, start: &str, end: &str) -> Result<Entries<'_>, StoreError>;

    /// Apply several writes. Stores that can apply them all-or-nothing should override this.
    fn put_all(&self, entries: Vec<(String, Vec<u8>)>) -> Result<(), StoreError> {
        for (key, value) in entries {
            self.put(&key, value)?;
        }
        Ok(())
    }
}

impl<L: Ledger + ?Sized> Ledger for &L {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        (**self).put(key, value)
    }

    fn range_query(&self, start: &str, end: &str) -> Result<Entries<'_>, StoreError> {
        (**self).range_query(start, end)
    }

    fn put_all(&self, entries: Vec<(String, Vec<u8>)>) -> Result<(), StoreError> {
        (**self).put_all(entries)
    }
}

/// Read and decode a JSON record. `Ok(None)` if the key is absent.
pub(crate) fn read_record<T, L>(
    ledger: &L,
    log: &Logger,
    key: &str,
    entity: Entity,
) -> Result<Option<T>, Error>
where
    T: DeserializeOwned,
    L: Ledger + ?Sized,
{
    let Some(bytes) = ledger.get(key)? else {
        log::debug!(target: log.target(), "[read] key={key} -> absent");
        return Ok(None);
    };
    log::debug!(
        target: log.target(),
        "[read] key={key} -> {}",
        String::from_utf8_lossy(&bytes)
    );
    decode_record(key, &bytes, entity).map(Some)
}

pub(crate) fn decode_record<T: DeserializeOwned>(
    key: &str,
    bytes: &[u8],
    entity: Entity,
) -> Result<T, Error> {
    serde_json::from_slice(bytes).map_err(|source| Error::Format {
        entity,
        key: key.to_string(),
        source,
    })
}

/// Encode a record as JSON and write it under `key`.
pub(crate) fn write_record<T, L>(
    ledger: &L,
    log: &Logger,
    key: &str,
    entity: Entity,
    record: &T,
) -> Result<(), Error>
where
    T: Serialize,
    L: Ledger + ?Sized,
{
    let bytes = serde_json::to_vec(record).map_err(|source| Error::Format {
        entity,
        key: key.to_string(),
        source,
    })?;
    log::debug!(
        target: log.target(),
        "[write] key={key} value={}",
        String::from_utf8_lossy(&bytes)
    );
    ledger.put(key, bytes)?;
    Ok(())
}
