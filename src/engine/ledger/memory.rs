use std::cell::RefCell;
use std::collections::BTreeMap;
use std::ops::Bound;

use super::{Entries, Ledger, StoreError};

/// A `BTreeMap`-backed ledger. Keys iterate in byte order, matching the
/// ordering the transaction key layout relies on.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    entries: RefCell<BTreeMap<String, Vec<u8>>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_map(entries: BTreeMap<String, Vec<u8>>) -> Self {
        Self {
            entries: RefCell::new(entries),
        }
    }

    /// Returns the number of stored keys
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Copy of every stored entry, in key order
    pub fn snapshot(&self) -> BTreeMap<String, Vec<u8>> {
        self.entries.borrow().clone()
    }
}

/// Entries of `map` within `[start, end]`. Empty when `start > end`
/// (`BTreeMap::range` panics on inverted bounds).
pub(crate) fn inclusive_range<'m, V>(
    map: &'m BTreeMap<String, V>,
    start: &str,
    end: &str,
) -> impl Iterator<Item = (&'m String, &'m V)> {
    let bounds = (start <= end).then(|| {
        (
            Bound::Included(start.to_string()),
            Bound::Included(end.to_string()),
        )
    });
    bounds.into_iter().flat_map(move |bounds| map.range(bounds))
}

impl Ledger for MemoryLedger {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.entries.borrow_mut().insert(key.to_string(), value);
        Ok(())
    }

    /// Copies the matching entries, so a later `put` never invalidates the scan.
    fn range_query(&self, start: &str, end: &str) -> Result<Entries<'_>, StoreError> {
        let entries = self.entries.borrow();
        let matched: Vec<(String, Vec<u8>)> = inclusive_range(&*entries, start, end)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(Box::new(matched.into_iter()))
    }

    fn put_all(&self, batch: Vec<(String, Vec<u8>)>) -> Result<(), StoreError> {
        self.entries.borrow_mut().extend(batch);
        Ok(())
    }
}
