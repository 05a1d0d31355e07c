
pub use crate::dht::Dht;
pub use crate::connector::{Router as DhtRouter, TcpRouter, TcpServer};
pub use crate::dht::{Query as DhtQuery, QueryResult as DhtQueryResult, QueryState as DhtQueryState};
pub use crate::dht::{visit_fn, Visit, Visitor};

pub use crate::common::DatabaseId;
pub use crate::common::{Entry as DhtEntry, NodeInfo, PeerEntry, PeerId};
pub use crate::common::{Error as DhtError};

pub use crate::common::{Request as DhtRequest, Response as DhtResponse};

pub use crate::table::{NodeTable, KNodeTable, SharedTable, EvictionPolicy};

pub use crate::Config as DhtConfig;
