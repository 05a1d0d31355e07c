//! Peer entries as held by the routing table and exchanged by lookups
//!
// https://github.com/ryankurte/rust-kad
// Copyright 2018-2023 ryan kurte

use std::fmt::Debug;
use std::time::Instant;

use super::id::{DatabaseId, Distance};

/// Entry pairs a peer ID with its peer information (eg. addresses)
/// and the last time the peer was successfully contacted.
#[derive(Clone, Debug)]
pub struct Entry<Id, Info> {
    id: Id,
    info: Info,
    seen: Option<Instant>,
}

/// Entries are equal when they describe the same peer,
/// contact times are bookkeeping only
impl<Id: PartialEq, Info: PartialEq> PartialEq for Entry<Id, Info> {
    fn eq(&self, other: &Entry<Id, Info>) -> bool {
        self.id == other.id && self.info == other.info
    }
}

impl<Id: Eq, Info: Eq> Eq for Entry<Id, Info> {}

impl<Id, Info> Entry<Id, Info>
where
    Id: DatabaseId + 'static,
    Info: Clone + Debug + 'static,
{
    pub fn new(id: Id, info: Info) -> Entry<Id, Info> {
        Entry {
            id,
            info,
            seen: None,
        }
    }

    pub fn id(&self) -> &Id {
        &self.id
    }

    pub fn info(&self) -> &Info {
        &self.info
    }

    /// Replace peer information as a whole
    pub fn set_info(&mut self, info: Info) {
        self.info = info;
    }

    pub fn seen(&self) -> Option<Instant> {
        self.seen
    }

    pub fn set_seen(&mut self, seen: Instant) {
        self.seen = Some(seen);
    }

    /// Distance from this entry to the provided ID
    pub fn distance(&self, target: &Id) -> Distance<Id> {
        Distance::between(&self.id, target)
    }
}

impl<Id, Info> From<(Id, Info)> for Entry<Id, Info>
where
    Id: DatabaseId + 'static,
    Info: Clone + Debug + 'static,
{
    fn from(d: (Id, Info)) -> Entry<Id, Info> {
        Entry::new(d.0, d.1)
    }
}
