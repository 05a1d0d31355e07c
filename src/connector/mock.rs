//! Scripted [Router] for unit testing lookups

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::Router;
use crate::common::*;

#[derive(Clone, Debug)]
pub(crate) enum MockResponse<Id, Info> {
    Nodes(Vec<Entry<Id, Info>>),
    Delayed(Duration, Vec<Entry<Id, Info>>),
    Fail(Error),
}

/// Router returning fixed responses per peer, unknown peers are unreachable
#[derive(Clone)]
pub(crate) struct MockRouter<Id, Info> {
    responses: Arc<HashMap<Id, MockResponse<Id, Info>>>,
    requests: Arc<Mutex<Vec<Id>>>,
}

impl<Id, Info> MockRouter<Id, Info>
where
    Id: Hash + Eq + Clone,
{
    pub(crate) fn new(responses: Vec<(Id, MockResponse<Id, Info>)>) -> Self {
        Self {
            responses: Arc::new(responses.into_iter().collect()),
            requests: Arc::new(Mutex::new(vec![])),
        }
    }

    /// Peers contacted so far, in request order
    pub(crate) fn requests(&self) -> Vec<Id> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl<Id, Info> Router<Id, Info> for MockRouter<Id, Info>
where
    Id: DatabaseId + Clone + Debug + 'static,
    Info: Clone + Debug + Sync + Send + 'static,
{
    async fn find_closer(
        &self,
        peer: &Entry<Id, Info>,
        _target: &Id,
    ) -> Result<Vec<Entry<Id, Info>>, Error> {
        self.requests.lock().unwrap().push(peer.id().clone());

        match self.responses.get(peer.id()).cloned() {
            Some(MockResponse::Nodes(nodes)) => Ok(nodes),
            Some(MockResponse::Delayed(d, nodes)) => {
                tokio::time::sleep(d).await;
                Ok(nodes)
            }
            Some(MockResponse::Fail(e)) => Err(e),
            None => Err(Error::Unreachable),
        }
    }
}
