/**
 * rust-kad
 * Kademlia KBucket implementation
 *
 * https://github.com/ryankurte/rust-kad
 * Copyright 2018 Ryan Kurte
 */
use crate::common::{DatabaseId, Entry};

use std::collections::VecDeque;
use std::fmt::Debug;
use std::time::Instant;

use tracing::trace;

use super::EvictionPolicy;

/// KBucket implementation
/// This implements a single bucket for use in the KNodeTable implementation.
/// Nodes are kept in recency order, most recently seen at the front.
pub struct KBucket<Id, Info> {
    bucket_size: usize,
    policy: EvictionPolicy,
    nodes: VecDeque<Entry<Id, Info>>,
    pending: Option<Entry<Id, Info>>,
    updated: Option<Instant>,
}

impl<Id, Info> KBucket<Id, Info>
where
    Id: DatabaseId + 'static,
    Info: Clone + Debug + 'static,
{
    /// Create a new KBucket with the given size and eviction policy
    pub fn new(bucket_size: usize, policy: EvictionPolicy) -> KBucket<Id, Info> {
        KBucket {
            bucket_size,
            policy,
            nodes: VecDeque::with_capacity(bucket_size),
            pending: None,
            updated: None,
        }
    }

    /// Create or refresh a node in the bucket.
    /// Returns false if the node was not stored (full bucket under [EvictionPolicy::KeepOldest],
    /// or a bucket with no capacity).
    pub fn create_or_update(&mut self, node: &Entry<Id, Info>) -> bool {
        let res = if let Some(i) = self.position(node.id()) {
            // Existing node, replace and move to the front
            trace!("[KBucket] Updating node {:?}", node.id());
            self.nodes.remove(i);
            self.nodes.push_front(node.clone());
            true
        } else if self.nodes.len() < self.bucket_size {
            trace!("[KBucket] Adding node {:?}", node.id());
            self.nodes.push_front(node.clone());
            true
        } else {
            match self.policy {
                EvictionPolicy::LeastRecentlySeen => match self.nodes.pop_back() {
                    Some(evicted) => {
                        trace!(
                            "[KBucket] Evicting node {:?} for {:?}",
                            evicted.id(),
                            node.id()
                        );
                        self.nodes.push_front(node.clone());
                        true
                    }
                    // Zero sized bucket, nothing to make room with
                    None => false,
                },
                EvictionPolicy::KeepOldest => {
                    trace!("[KBucket] No space, holding {:?} as pending", node.id());
                    self.pending = Some(node.clone());
                    false
                }
            }
        };

        if res {
            self.updated = Some(Instant::now());
        }

        res
    }

    /// Find a node in the bucket
    pub fn find(&self, id: &Id) -> Option<Entry<Id, Info>> {
        self.nodes.iter().find(|n| n.id() == id).cloned()
    }

    /// Iterate over nodes in the bucket, most recently seen first
    pub fn iter(&self) -> impl Iterator<Item = &Entry<Id, Info>> {
        self.nodes.iter()
    }

    /// Clone the list of nodes currently in the bucket
    pub fn nodes(&self) -> Vec<Entry<Id, Info>> {
        self.nodes.iter().cloned().collect()
    }

    /// Fetch the pending replacement, if any
    pub fn pending(&self) -> Option<&Entry<Id, Info>> {
        self.pending.as_ref()
    }

    /// Fetch last updated time
    pub fn updated(&self) -> Option<Instant> {
        self.updated
    }

    /// Fetch number of nodes in bucket
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Fetch the least recently seen node in the bucket
    pub fn oldest(&self) -> Option<Entry<Id, Info>> {
        self.nodes.back().cloned()
    }

    /// Remove an entry from the bucket, promoting the pending node into the freed slot.
    /// Removing an unknown node is a no-op.
    pub fn remove_entry(&mut self, id: &Id) {
        if self.pending.as_ref().map(|p| p.id() == id).unwrap_or(false) {
            self.pending = None;
        }

        let index = match self.position(id) {
            Some(i) => i,
            None => return,
        };

        self.nodes.remove(index);

        if self.nodes.len() < self.bucket_size {
            if let Some(p) = self.pending.take() {
                trace!("[KBucket] Promoting pending node {:?}", p.id());
                self.nodes.push_back(p);
            }
        }
    }

    fn position(&self, id: &Id) -> Option<usize> {
        self.nodes.iter().position(|n| n.id() == id)
    }
}
