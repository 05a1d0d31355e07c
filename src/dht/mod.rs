/**
 * rust-kad
 * Kademlia lookup driver
 *
 * https://github.com/ryankurte/rust-kad
 * Copyright 2018 Ryan Kurte
 */

use std::fmt::Debug;
use std::future::Future;

use tracing::{debug, instrument, trace};

use crate::common::*;
use crate::connector::Router;
use crate::table::{KNodeTable, NodeTable, SharedTable};
use crate::Config;

pub mod query;
pub use self::query::{
    visit_fn, Query, QueryOptions, QueryResult, QueryState, QueryStats, Visit, VisitFn, Visitor,
};

/// Routing table type used by [Dht] instances
pub type DhtTable<Id, Info> = SharedTable<Id, Info, KNodeTable<Id, Info>>;

/// Kademlia DHT node, owns the routing table and issues lookups via a [Router]
#[derive(Clone)]
pub struct Dht<Id, Info, R> {
    id: Id,
    config: Config,
    table: DhtTable<Id, Info>,
    router: R,
}

impl<Id, Info, R> Dht<Id, Info, R>
where
    Id: DatabaseId + Clone + Debug + 'static,
    Info: Clone + Debug + Send + Sync + 'static,
    R: Router<Id, Info> + Clone + 'static,
{
    /// Create a new DHT node with an empty routing table
    pub fn new(id: Id, config: Config, router: R) -> Dht<Id, Info, R> {
        let table = KNodeTable::new(id.clone(), config.bucket_size, config.eviction);

        Dht {
            id,
            config,
            table: SharedTable::new(table),
            router,
        }
    }

    /// Fetch our own ID
    pub fn id(&self) -> &Id {
        &self.id
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fetch a handle to the routing table
    pub fn table(&self) -> &DhtTable<Id, Info> {
        &self.table
    }

    pub fn router(&self) -> &R {
        &self.router
    }

    /// Seed the routing table with known peers, returning the number stored
    pub fn add_nodes(&self, nodes: &[Entry<Id, Info>]) -> usize {
        self.table.with(|t| {
            nodes
                .iter()
                .filter(|n| {
                    trace!("[DHT] adding node: {:?}", n.id());
                    t.create_or_update(n)
                })
                .count()
        })
    }

    /// Run a query towards `target` seeded from the routing table,
    /// bounded by the configured lookup timeout
    pub async fn query<V>(&self, target: Id, visitor: &mut V) -> Result<QueryResult<Id, Info>, Error>
    where
        V: Visitor<Id, Info>,
    {
        self.query_with_cancel(target, visitor, futures::future::pending())
            .await
    }

    /// Run a query towards `target` that is abandoned when `cancel` resolves
    pub async fn query_with_cancel<V, C>(
        &self,
        target: Id,
        visitor: &mut V,
        cancel: C,
    ) -> Result<QueryResult<Id, Info>, Error>
    where
        V: Visitor<Id, Info>,
        C: Future<Output = ()>,
    {
        let seed = self.table.nearest(&target, 0..self.config.k);

        let q = Query::new(
            self.id.clone(),
            target,
            seed,
            QueryOptions::from(&self.config),
            self.router.clone(),
            self.table.clone(),
        );

        q.run(visitor, cancel).await
    }

    /// Locate the peer with the provided ID
    #[instrument(skip_all, fields(our_id=?self.id, target_id=?target))]
    pub async fn find_node(&self, target: Id) -> Result<Entry<Id, Info>, Error> {
        let t = target.clone();
        let mut visitor = visit_fn(move |p: &Entry<Id, Info>, s: &QueryStats| {
            debug!("[DHT find_node] visiting {:?} ({} requests)", p.id(), s.requests);

            if p.id() == &t {
                Ok(Visit::Stop)
            } else {
                Ok(Visit::Continue)
            }
        });

        let r = self.query(target, &mut visitor).await?;

        debug!(
            "[DHT find_node] {} after {} requests ({} ok, {} failed) in {:?}",
            r.state, r.stats.requests, r.stats.successes, r.stats.failures, r.stats.elapsed
        );

        match (r.state, r.found) {
            (QueryState::Stopped, Some(e)) => Ok(e),
            (QueryState::Cancelled, _) => Err(Error::Cancelled),
            _ => Err(Error::NotFound),
        }
    }

    /// Receive and reply to requests
    pub fn handle(&self, from: &Entry<Id, Info>, req: &Request<Id>) -> Response<Id, Info> {
        let resp = self.respond(req);

        // Update record for sender
        if from.id() != &self.id {
            self.table.with(|t| t.create_or_update(from));
        }

        resp
    }

    /// Build a reply to a request without recording the sender,
    /// for callers that cannot be contacted in return
    pub fn respond(&self, req: &Request<Id>) -> Response<Id, Info> {
        match req {
            Request::Ping => Response::Pong,
            Request::FindNode(id) => {
                let nodes = self.table.nearest(id, 0..self.config.k);
                Response::NodesFound(id.clone(), nodes)
            }
        }
    }
}
