//! Iterative node lookup
//!
//! A [Query] walks the DHT towards a target ID, keeping at most `concurrency`
//! FindNode requests in flight to the closest known peers and merging their
//! answers into a distance-ordered frontier until the lookup converges, a
//! [Visitor] asks to stop, the frontier runs dry, or the lookup is cancelled.
//!
//! Queries do not log, results and failures are reported through [QueryResult].
//!
// https://github.com/ryankurte/rust-kad
// Copyright 2018-2023 ryan kurte

use std::collections::HashSet;
use std::fmt::Debug;
use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;

use crate::common::*;
use crate::connector::Router;
use crate::table::NodeTable;
use crate::Config;

/// Per-query options, see [Config] for descriptions
#[derive(Clone, PartialEq, Debug)]
pub struct QueryOptions {
    /// Number of closest contacted peers to return
    pub k: usize,
    /// Maximum number of requests in flight
    pub concurrency: usize,
    /// Timeout for each FindNode request
    pub request_timeout: Duration,
    /// Overall timeout for the query
    pub timeout: Option<Duration>,
}

impl From<&Config> for QueryOptions {
    fn from(c: &Config) -> Self {
        Self {
            k: c.k,
            concurrency: c.concurrency,
            request_timeout: c.request_timeout,
            timeout: Some(c.lookup_timeout),
        }
    }
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// Request counters for a running query
#[derive(Clone, PartialEq, Debug, Default)]
pub struct QueryStats {
    /// Requests issued
    pub requests: usize,
    /// Requests answered
    pub successes: usize,
    /// Requests failed or timed out
    pub failures: usize,
    /// Time since the query started
    pub elapsed: Duration,
}

/// Visitor decision
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Visit {
    Continue,
    Stop,
}

/// Visitor called for each peer discovered by a query (before it joins the
/// frontier) and for each peer contacted, once its request completes or fails.
/// Failures are visible through [QueryStats::failures].
///
/// Returning [Visit::Stop] ends the query with the visited peer as the result,
/// returning an error aborts the query with that error.
#[async_trait]
pub trait Visitor<Id, Info>: Send {
    async fn visit(&mut self, peer: &Entry<Id, Info>, stats: &QueryStats) -> Result<Visit, Error>;
}

/// Visitor that never stops, for queries collecting the closest peers
#[async_trait]
impl<Id, Info> Visitor<Id, Info> for ()
where
    Id: Sync + Send,
    Info: Sync + Send,
{
    async fn visit(&mut self, _peer: &Entry<Id, Info>, _stats: &QueryStats) -> Result<Visit, Error> {
        Ok(Visit::Continue)
    }
}

/// Closure based [Visitor], see [visit_fn]
pub struct VisitFn<F>(F);

/// Build a [Visitor] from a closure
pub fn visit_fn<Id, Info, F>(f: F) -> VisitFn<F>
where
    F: FnMut(&Entry<Id, Info>, &QueryStats) -> Result<Visit, Error> + Send,
{
    VisitFn(f)
}

#[async_trait]
impl<Id, Info, F> Visitor<Id, Info> for VisitFn<F>
where
    Id: Sync + Send,
    Info: Sync + Send,
    F: FnMut(&Entry<Id, Info>, &QueryStats) -> Result<Visit, Error> + Send,
{
    async fn visit(&mut self, peer: &Entry<Id, Info>, stats: &QueryStats) -> Result<Visit, Error> {
        (self.0)(peer, stats)
    }
}

/// Terminal state of a query
#[derive(Copy, Clone, PartialEq, Eq, Debug, strum::Display)]
pub enum QueryState {
    /// A full round of responses brought no peer closer than those already contacted
    Converged,
    /// The visitor requested the query stop
    Stopped,
    /// The query was cancelled or timed out
    Cancelled,
    /// No peers remained to be contacted
    Exhausted,
}

/// Outcome of a query
#[derive(Clone, PartialEq, Debug)]
pub struct QueryResult<Id, Info> {
    pub state: QueryState,
    /// Peer selected by the visitor, when stopped
    pub found: Option<Entry<Id, Info>>,
    /// Closest peers that answered a request, nearest first (at most `k`)
    pub closest: Vec<Entry<Id, Info>>,
    pub stats: QueryStats,
}

/// RequestState is used to track candidates through the query
#[derive(Copy, Clone, Debug, PartialEq)]
enum RequestState {
    Pending,
    Active,
    Complete,
    Failed,
}

#[derive(Clone, Debug)]
struct Candidate<Id, Info> {
    entry: Entry<Id, Info>,
    distance: Distance<Id>,
    state: RequestState,
    // Discovery order, breaks distance ties
    seq: usize,
}

/// Iterative lookup towards a target ID, see module docs
pub struct Query<Id, Info, R, T> {
    origin: Id,
    target: Id,
    opts: QueryOptions,
    router: R,
    table: T,

    // Ordered by (distance, seq)
    frontier: Vec<Candidate<Id, Info>>,
    known: HashSet<Id>,
    next_seq: usize,

    stats: QueryStats,
    closest_contacted: Option<Distance<Id>>,
    stalled: usize,
}

impl<Id, Info, R, T> Query<Id, Info, R, T>
where
    Id: DatabaseId + Clone + Debug + 'static,
    Info: Clone + Debug + Send + Sync + 'static,
    R: Router<Id, Info> + Clone + 'static,
    T: NodeTable<Id, Info>,
{
    /// Create a query from `origin` (never contacted) towards `target`,
    /// seeded with an initial set of peers (generally the nearest known to `target`).
    ///
    /// Responding peers are refreshed in `table`, failed peers removed.
    pub fn new(
        origin: Id,
        target: Id,
        seed: Vec<Entry<Id, Info>>,
        opts: QueryOptions,
        router: R,
        table: T,
    ) -> Self {
        let mut known = HashSet::new();
        known.insert(origin.clone());

        let mut q = Self {
            origin,
            target,
            opts,
            router,
            table,
            frontier: vec![],
            known,
            next_seq: 0,
            stats: QueryStats::default(),
            closest_contacted: None,
            stalled: 0,
        };

        for e in seed {
            if q.known.insert(e.id().clone()) {
                q.insert(e);
            }
        }

        q
    }

    /// Fetch the query target
    pub fn target(&self) -> &Id {
        &self.target
    }

    /// Execute the query until it terminates or `cancel` resolves.
    ///
    /// Fails with [Error::NoPeers] if the query was not seeded, or with any
    /// error returned by the visitor.
    pub async fn run<V, C>(mut self, visitor: &mut V, cancel: C) -> Result<QueryResult<Id, Info>, Error>
    where
        V: Visitor<Id, Info>,
        C: Future<Output = ()>,
    {
        if self.frontier.is_empty() {
            return Err(Error::NoPeers);
        }

        let start = Instant::now();

        // Resolves on external cancellation or overall timeout
        let timeout = self.opts.timeout;
        let cancelled = async move {
            let deadline = async move {
                match timeout {
                    Some(t) => tokio::time::sleep(t).await,
                    None => futures::future::pending::<()>().await,
                }
            };

            tokio::select! {
                _ = cancel => (),
                _ = deadline => (),
            }
        };
        tokio::pin!(cancelled);

        let concurrency = self.opts.concurrency.max(1);
        let mut in_flight = FuturesUnordered::new();
        let mut found = None;

        let state = 'query: loop {
            // Top up requests to the closest pending candidates
            while found.is_none() && self.stalled < concurrency && in_flight.len() < concurrency {
                if cancelled.as_mut().now_or_never().is_some() {
                    break 'query QueryState::Cancelled;
                }

                let entry = match self.next_pending() {
                    Some(e) => e,
                    None => break,
                };

                self.stats.requests += 1;
                in_flight.push(self.request(entry));
            }

            if in_flight.is_empty() {
                break if found.is_some() {
                    QueryState::Stopped
                } else if self.stalled >= concurrency {
                    QueryState::Converged
                } else {
                    QueryState::Exhausted
                };
            }

            // Await the next response (or cancellation)
            let (entry, res) = tokio::select! {
                biased;

                // A peer already found survives cancellation during the drain
                _ = &mut cancelled => break 'query match found {
                    Some(_) => QueryState::Stopped,
                    None => QueryState::Cancelled,
                },
                Some(r) = in_flight.next() => r,
            };

            self.stats.elapsed = start.elapsed();

            let nodes = match res {
                Ok(nodes) => nodes,
                Err(_e) => {
                    self.stats.failures += 1;
                    self.set_state(entry.id(), RequestState::Failed);
                    self.table.remove_entry(entry.id());

                    if found.is_none() && visitor.visit(&entry, &self.stats).await? == Visit::Stop {
                        found = Some(entry);
                    }
                    continue;
                }
            };

            self.stats.successes += 1;
            self.set_state(entry.id(), RequestState::Complete);
            self.table.create_or_update(&entry);

            // Once stopped, outstanding responses only update bookkeeping
            if found.is_some() {
                continue;
            }

            let d = entry.distance(&self.target);
            if self.closest_contacted.as_ref().map(|c| &d < c).unwrap_or(true) {
                self.closest_contacted = Some(d);
            }

            let (progress, stop) = self.merge(nodes, visitor).await?;
            if progress {
                self.stalled = 0;
            } else {
                self.stalled += 1;
            }

            if let Some(e) = stop {
                found = Some(e);
                continue;
            }

            if visitor.visit(&entry, &self.stats).await? == Visit::Stop {
                found = Some(entry);
            }
        };

        self.stats.elapsed = start.elapsed();

        let closest = self
            .frontier
            .iter()
            .filter(|c| c.state == RequestState::Complete)
            .take(self.opts.k)
            .map(|c| c.entry.clone())
            .collect();

        Ok(QueryResult {
            state,
            found,
            closest,
            stats: self.stats,
        })
    }

    /// Build a request future for a peer, independent of the query borrow
    fn request(
        &self,
        entry: Entry<Id, Info>,
    ) -> impl Future<Output = (Entry<Id, Info>, Result<Vec<Entry<Id, Info>>, Error>)> {
        let router = self.router.clone();
        let target = self.target.clone();
        let timeout = self.opts.request_timeout;

        async move {
            let res = match tokio::time::timeout(timeout, router.find_closer(&entry, &target)).await {
                Ok(r) => r,
                Err(_) => Err(Error::Timeout),
            };
            (entry, res)
        }
    }

    /// Merge peers returned in a response into the frontier.
    ///
    /// Returns whether a peer closer than any contacted peer was found,
    /// and the peer the visitor stopped on (if any).
    async fn merge<V: Visitor<Id, Info>>(
        &mut self,
        nodes: Vec<Entry<Id, Info>>,
        visitor: &mut V,
    ) -> Result<(bool, Option<Entry<Id, Info>>), Error> {
        let mut fresh: Vec<_> = nodes
            .into_iter()
            .filter(|n| n.id() != &self.origin && !self.known.contains(n.id()))
            .collect();
        fresh.sort_by_key(|n| n.distance(&self.target));
        fresh.dedup_by(|a, b| a.id() == b.id());

        let mut progress = false;

        for n in fresh {
            let d = n.distance(&self.target);
            if self.closest_contacted.as_ref().map(|c| &d < c).unwrap_or(true) {
                progress = true;
            }

            if visitor.visit(&n, &self.stats).await? == Visit::Stop {
                return Ok((progress, Some(n)));
            }

            self.known.insert(n.id().clone());
            self.insert(n);
        }

        Ok((progress, None))
    }

    fn insert(&mut self, entry: Entry<Id, Info>) {
        let distance = entry.distance(&self.target);
        let seq = self.next_seq;
        self.next_seq += 1;

        let index = self
            .frontier
            .partition_point(|c| (&c.distance, c.seq) < (&distance, seq));

        self.frontier.insert(
            index,
            Candidate {
                entry,
                distance,
                state: RequestState::Pending,
                seq,
            },
        );
    }

    /// Take the closest pending candidate, marking it active
    fn next_pending(&mut self) -> Option<Entry<Id, Info>> {
        let c = self
            .frontier
            .iter_mut()
            .find(|c| c.state == RequestState::Pending)?;

        c.state = RequestState::Active;
        Some(c.entry.clone())
    }

    fn set_state(&mut self, id: &Id, state: RequestState) {
        if let Some(c) = self.frontier.iter_mut().find(|c| c.entry.id() == id) {
            c.state = state;
        }
    }
}
