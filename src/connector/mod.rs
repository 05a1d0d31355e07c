//! Network abstraction consumed by DHT lookups
//!
// https://github.com/ryankurte/rust-kad
// Copyright 2018-2023 ryan kurte

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use crate::common::*;

pub mod codec;

pub mod tcp;
pub use self::tcp::{TcpRouter, TcpServer};

#[cfg(test)]
pub(crate) mod mock;

/// Router sends FindNode requests to peers on behalf of lookups.
///
/// Implementations are responsible for connection management, request / response
/// pairing and any validation of the peer. Calls for different peers may be issued
/// concurrently. Timeouts are applied on top of this by the caller.
#[async_trait]
pub trait Router<Id, Info>: Sync + Send {
    /// Ask `peer` for the entries it knows closest to `target`.
    ///
    /// Returns [Error::Unreachable] (or [Error::Io]) where the peer could not be contacted
    /// and [Error::InvalidResponse] where the peer answered with something unusable.
    async fn find_closer(
        &self,
        peer: &Entry<Id, Info>,
        target: &Id,
    ) -> Result<Vec<Entry<Id, Info>>, Error>;
}

#[async_trait]
impl<Id, Info, R> Router<Id, Info> for Arc<R>
where
    Id: Debug + Sync + Send,
    Info: Debug + Sync + Send,
    R: Router<Id, Info> + ?Sized,
{
    async fn find_closer(
        &self,
        peer: &Entry<Id, Info>,
        target: &Id,
    ) -> Result<Vec<Entry<Id, Info>>, Error> {
        self.as_ref().find_closer(peer, target).await
    }
}
