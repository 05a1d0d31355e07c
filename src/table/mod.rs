/**
 * rust-kad
 * Kademlia node table interfaces and default implementations
 *
 * https://github.com/ryankurte/rust-kad
 * Copyright 2018 Ryan Kurte
 */

pub mod nodetable;
pub use self::nodetable::{BucketInfo, NodeTable};

pub mod kbucket;
pub use self::kbucket::KBucket;

pub mod knodetable;
pub use self::knodetable::KNodeTable;

pub mod shared;
pub use self::shared::SharedTable;

/// Behaviour of a bucket that is full when a new peer arrives
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum EvictionPolicy {
    /// Evict the least recently seen peer in favour of the new peer
    #[default]
    LeastRecentlySeen,
    /// Keep existing peers, holding the new peer as a replacement
    /// for the next peer to be removed
    KeepOldest,
}
