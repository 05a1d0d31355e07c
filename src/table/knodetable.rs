/**
 * rust-kad
 * Kademlia Node Table Implementation
 *
 * https://github.com/ryankurte/rust-kad
 * Copyright 2018 Ryan Kurte
 */
use std::fmt::Debug;
use std::ops::Range;
use std::time::Instant;

use tracing::trace;

use crate::common::{DatabaseId, Entry};

use super::kbucket::KBucket;
use super::nodetable::{BucketInfo, NodeTable};
use super::EvictionPolicy;

/// KNodeTable Implementation
/// Buckets are pre-allocated and indexed by the length of the prefix shared between
/// the local Id and a peer Id, so bucket 0 holds the furthest half of the key space
/// and bucket `max_bits - 1` the single closest sibling.
pub struct KNodeTable<Id, Info> {
    id: Id,
    bucket_size: usize,
    buckets: Vec<KBucket<Id, Info>>,
}

impl<Id, Info> KNodeTable<Id, Info>
where
    Id: DatabaseId + Clone + 'static,
    Info: Clone + Debug + 'static,
{
    /// Create a new KNodeTable with the provided bucket size and eviction policy.
    /// One bucket is allocated for each bit of the local Id.
    pub fn new(id: Id, bucket_size: usize, policy: EvictionPolicy) -> KNodeTable<Id, Info> {
        let buckets = (0..id.max_bits())
            .map(|_| KBucket::new(bucket_size, policy))
            .collect();

        KNodeTable {
            id,
            bucket_size,
            buckets,
        }
    }

    /// Fetch the local Id the table is organised around
    pub fn id(&self) -> &Id {
        &self.id
    }

    /// Fetch the bucket index for a given Id, None for the local Id
    fn bucket_index(&self, id: &Id) -> Option<usize> {
        let index = Id::prefix_len(&self.id, id);

        if index >= self.buckets.len() {
            return None;
        }

        Some(index)
    }

    fn bucket_mut(&mut self, id: &Id) -> Option<&mut KBucket<Id, Info>> {
        let index = self.bucket_index(id)?;
        Some(&mut self.buckets[index])
    }
}

impl<Id, Info> NodeTable<Id, Info> for KNodeTable<Id, Info>
where
    Id: DatabaseId + Clone + 'static,
    Info: Clone + Debug + 'static,
{
    /// Create or update a node in the NodeTable, stamping it as seen now
    fn create_or_update(&mut self, node: &Entry<Id, Info>) -> bool {
        let bucket = match self.bucket_mut(node.id()) {
            Some(b) => b,
            None => {
                trace!("[KNodeTable] Ignoring own id");
                return false;
            }
        };

        let mut node = node.clone();
        node.set_seen(Instant::now());
        bucket.create_or_update(&node)
    }

    /// Find the nearest nodes to the provided Id in the given range
    fn nearest(&self, id: &Id, range: Range<usize>) -> Vec<Entry<Id, Info>> {
        let mut all: Vec<_> = self.buckets.iter().flat_map(|b| b.iter()).collect();

        // Ids are unique within the table so distances never tie
        all.sort_by_key(|n| n.distance(id));

        all.into_iter()
            .skip(range.start)
            .take(range.end.saturating_sub(range.start))
            .cloned()
            .collect()
    }

    /// Check if the node NodeTable contains a given node by Id
    /// This returns the node object if found
    fn contains(&self, id: &Id) -> Option<Entry<Id, Info>> {
        let index = self.bucket_index(id)?;
        self.buckets[index].find(id)
    }

    /// Remove an entry by ID
    fn remove_entry(&mut self, id: &Id) {
        if let Some(bucket) = self.bucket_mut(id) {
            bucket.remove_entry(id);
        }
    }

    fn len(&self) -> usize {
        self.buckets.iter().map(|b| b.node_count()).sum()
    }

    fn capacity(&self) -> usize {
        self.buckets.len() * self.bucket_size
    }

    fn buckets(&self) -> usize {
        self.buckets.len()
    }

    /// Fetch information from each bucket
    fn bucket_info(&self, index: usize) -> Option<BucketInfo> {
        let b = self.buckets.get(index)?;

        Some(BucketInfo {
            index,
            nodes: b.node_count(),
            updated: b.updated(),
        })
    }

    fn entries(&self) -> Vec<Entry<Id, Info>> {
        self.buckets.iter().flat_map(|b| b.nodes()).collect()
    }
}
