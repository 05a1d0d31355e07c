/**
 * rust-kad
 * Generic NodeTable definition
 *
 * https://github.com/ryankurte/rust-kad
 * Copyright 2018 Ryan Kurte
 */
use std::ops::Range;
use std::time::Instant;

use crate::common::{DatabaseId, Entry};

/// Summary information for a single bucket
#[derive(Clone, Debug, PartialEq)]
pub struct BucketInfo {
    pub index: usize,
    pub nodes: usize,
    pub updated: Option<Instant>,
}

// Generic Node Table implementation
// This keeps track of known nodes
pub trait NodeTable<Id: DatabaseId + Clone + 'static, Info: Clone + 'static> {
    /// Create or update a node in the table
    /// Returns true if node has been stored or updated, false if the node was not stored
    fn create_or_update(&mut self, node: &Entry<Id, Info>) -> bool;

    /// Find nearest nodes
    /// Returns the nearest nodes to the provided id, ordered by distance and limited to `range`
    fn nearest(&self, id: &Id, range: Range<usize>) -> Vec<Entry<Id, Info>>;

    /// Find an exact node
    /// This is used to fetch a node from the node table
    fn contains(&self, id: &Id) -> Option<Entry<Id, Info>>;

    /// Remove an entry in the table by ID, no-op if the entry is unknown
    fn remove_entry(&mut self, id: &Id);

    /// Number of entries currently held
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries the table can hold
    fn capacity(&self) -> usize;

    /// Number of buckets in the table
    fn buckets(&self) -> usize;

    /// Fetch information for the bucket at `index`
    fn bucket_info(&self, index: usize) -> Option<BucketInfo>;

    /// Clone out all entries in the table
    fn entries(&self) -> Vec<Entry<Id, Info>>;
}
