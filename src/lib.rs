/**
 * rust-kad
 * Iterative Kademlia node lookup over a pluggable peer transport
 *
 * https://github.com/ryankurte/rust-kad
 * Copyright 2018 Ryan Kurte
 */

use std::time::Duration;

pub mod common;
pub use self::common::{DatabaseId, Distance, Entry, Error, Key, NodeInfo, PeerEntry, PeerId};

pub mod table;
pub use self::table::{EvictionPolicy, KNodeTable, NodeTable, SharedTable};

pub mod connector;
pub use self::connector::{Router, TcpRouter, TcpServer};

pub mod dht;
pub use self::dht::{Dht, Query, QueryOptions, QueryResult, QueryState, QueryStats, Visit, Visitor};

pub mod prelude;

/// DHT configuration, shared by the routing table and lookups
#[derive(PartialEq, Clone, Debug)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct Config {
    /// Number of closest peers to consider when searching and returned in responses
    #[cfg_attr(feature = "clap", arg(long, default_value = "20"))]
    pub k: usize,

    /// Size of buckets in the node table
    #[cfg_attr(feature = "clap", arg(long, default_value = "20"))]
    pub bucket_size: usize,

    /// Number of concurrent requests per lookup
    #[cfg_attr(feature = "clap", arg(long, default_value = "3"))]
    pub concurrency: usize,

    /// Timeout for each request to a peer
    #[cfg_attr(feature = "clap", arg(long, value_parser = humantime::parse_duration, default_value = "5s"))]
    pub request_timeout: Duration,

    /// Overall deadline for a lookup
    #[cfg_attr(feature = "clap", arg(long, value_parser = humantime::parse_duration, default_value = "20s"))]
    pub lookup_timeout: Duration,

    /// Policy for full buckets (least-recently-seen, keep-oldest)
    #[cfg_attr(feature = "clap", arg(long, default_value = "least-recently-seen"))]
    pub eviction: EvictionPolicy,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            k: 20,
            bucket_size: 20,
            concurrency: 3,
            request_timeout: Duration::from_secs(5),
            lookup_timeout: Duration::from_secs(20),
            eviction: EvictionPolicy::default(),
        }
    }
}
