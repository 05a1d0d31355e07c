//! Shared node table for use across concurrent lookups
//!
// https://github.com/ryankurte/rust-kad
// Copyright 2018-2023 ryan kurte

use std::marker::PhantomData;
use std::ops::Range;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::common::{DatabaseId, Entry};

use super::nodetable::{BucketInfo, NodeTable};

/// Cloneable handle to a [NodeTable] guarded by a mutex.
///
/// Every call takes the lock for the duration of that call only,
/// so no lock is ever held across an await point.
pub struct SharedTable<Id, Info, Table> {
    inner: Arc<Mutex<Table>>,
    _id: PhantomData<fn() -> (Id, Info)>,
}

impl<Id, Info, Table> Clone for SharedTable<Id, Info, Table> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _id: PhantomData,
        }
    }
}

impl<Id, Info, Table> SharedTable<Id, Info, Table>
where
    Id: DatabaseId + Clone + 'static,
    Info: Clone + 'static,
    Table: NodeTable<Id, Info>,
{
    pub fn new(table: Table) -> Self {
        Self {
            inner: Arc::new(Mutex::new(table)),
            _id: PhantomData,
        }
    }

    /// Run a closure with exclusive access to the underlying table
    pub fn with<R>(&self, f: impl FnOnce(&mut Table) -> R) -> R {
        f(&mut self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, Table> {
        // A panic while holding the lock leaves the table structurally intact
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<Id, Info, Table> NodeTable<Id, Info> for SharedTable<Id, Info, Table>
where
    Id: DatabaseId + Clone + 'static,
    Info: Clone + 'static,
    Table: NodeTable<Id, Info>,
{
    fn create_or_update(&mut self, node: &Entry<Id, Info>) -> bool {
        self.lock().create_or_update(node)
    }

    fn nearest(&self, id: &Id, range: Range<usize>) -> Vec<Entry<Id, Info>> {
        self.lock().nearest(id, range)
    }

    fn contains(&self, id: &Id) -> Option<Entry<Id, Info>> {
        self.lock().contains(id)
    }

    fn remove_entry(&mut self, id: &Id) {
        self.lock().remove_entry(id)
    }

    fn len(&self) -> usize {
        self.lock().len()
    }

    fn capacity(&self) -> usize {
        self.lock().capacity()
    }

    fn buckets(&self) -> usize {
        self.lock().buckets()
    }

    fn bucket_info(&self, index: usize) -> Option<BucketInfo> {
        self.lock().bucket_info(index)
    }

    fn entries(&self) -> Vec<Entry<Id, Info>> {
        self.lock().entries()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::table::{EvictionPolicy, KNodeTable};

    #[test]
    fn test_shared_table_concurrent_updates() {
        let table = KNodeTable::<[u8; 2], u64>::new([0, 0], 4, EvictionPolicy::default());
        let shared = SharedTable::new(table);

        let handles: Vec<_> = (0..4u8)
            .map(|t| {
                let mut s = shared.clone();
                thread::spawn(move || {
                    for i in 1..=64u8 {
                        let e = Entry::new([t, i], i as u64);
                        s.create_or_update(&e);
                        let _ = s.nearest(&[i, t], 0..4);
                        if i % 3 == 0 {
                            s.remove_entry(e.id());
                        }
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert!(shared.len() <= shared.capacity());
        assert!(shared.len() > 0);

        // Every entry is unique by id
        let mut ids: Vec<_> = shared.entries().iter().map(|e| *e.id()).collect();
        let n = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), n);
    }

    #[test]
    fn test_shared_table_with() {
        let table = KNodeTable::<[u8; 1], u64>::new([0], 4, EvictionPolicy::default());
        let shared = SharedTable::new(table);

        shared.with(|t| t.create_or_update(&Entry::new([1], 1)));
        assert_eq!(shared.with(|t| t.id().clone()), [0]);
        assert!(shared.contains(&[1]).is_some());
    }
}
