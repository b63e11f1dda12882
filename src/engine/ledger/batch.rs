use std::cell::RefCell;
use std::collections::BTreeMap;

use super::memory::inclusive_range;
use super::{Entries, Ledger, StoreError};

/// Staged writes over a store.
///
/// Reads see the staged writes first, then the store. Nothing reaches the
/// store until [`WriteBatch::commit`]; dropping the batch discards every
/// staged write.
#[derive(Debug)]
pub struct WriteBatch<'a, L: Ledger + ?Sized> {
    store: &'a L,
    pending: RefCell<BTreeMap<String, Vec<u8>>>,
}

impl<'a, L: Ledger + ?Sized> WriteBatch<'a, L> {
    pub fn new(store: &'a L) -> Self {
        Self {
            store,
            pending: RefCell::new(BTreeMap::new()),
        }
    }

    /// Returns the number of staged keys
    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }

    /// Hand every staged write to the store in one `put_all` call.
    /// Returns the number of keys written.
    pub fn commit(self) -> Result<usize, StoreError> {
        let pending = self.pending.into_inner();
        let written = pending.len();
        if written > 0 {
            self.store.put_all(pending.into_iter().collect())?;
        }
        Ok(written)
    }
}

impl<L: Ledger + ?Sized> Ledger for WriteBatch<'_, L> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        if let Some(value) = self.pending.borrow().get(key) {
            return Ok(Some(value.clone()));
        }
        self.store.get(key)
    }

    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.pending.borrow_mut().insert(key.to_string(), value);
        Ok(())
    }

    /// Staged writes shadow the store. The merged view is collected up front.
    fn range_query(&self, start: &str, end: &str) -> Result<Entries<'_>, StoreError> {
        let mut merged: BTreeMap<String, Vec<u8>> = self.store.range_query(start, end)?.collect();
        let pending = self.pending.borrow();
        for (key, value) in inclusive_range(&*pending, start, end) {
            merged.insert(key.clone(), value.clone());
        }
        Ok(Box::new(merged.into_iter()))
    }
}
