//! TCP transport for DHT requests
//!
//! Each request opens a new connection to the first reachable address of
//! the peer, writes a single request frame and reads a single response frame.
//!
// https://github.com/ryankurte/rust-kad
// Copyright 2018-2023 ryan kurte

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, trace, warn};

use super::codec::{read_message, write_message};
use super::Router;
use crate::common::*;
use crate::dht::Dht;

/// [Router] issuing requests over TCP
#[derive(Clone, Debug)]
pub struct TcpRouter {
    local: PeerEntry,
    timeout: Duration,
}

impl TcpRouter {
    /// Create a router sending requests on behalf of `local`.
    /// `timeout` bounds [TcpRouter::connect] (lookups apply their own request timeouts).
    pub fn new(local: NodeInfo, timeout: Duration) -> Self {
        Self {
            local: local.into_entry(),
            timeout,
        }
    }

    /// Fetch the local entry sent with each request
    pub fn local(&self) -> &PeerEntry {
        &self.local
    }

    /// Check a peer is reachable and holds the expected identity
    pub async fn connect(&self, peer: &PeerEntry) -> Result<PeerEntry, Error> {
        let req = RequestMessage::ping(self.local.clone());

        let resp = match tokio::time::timeout(self.timeout, self.request(peer, req)).await {
            Ok(r) => r?,
            Err(_) => return Err(Error::Timeout),
        };

        match resp.response {
            Response::Pong => {
                debug!("[TcpRouter] connected to {:?}", peer.info().peer());
                Ok(peer.clone())
            }
            _ => Err(Error::InvalidResponse),
        }
    }

    /// Issue a request to the first reachable address of a peer
    async fn request(
        &self,
        peer: &PeerEntry,
        req: RequestMessage<Key, NodeInfo>,
    ) -> Result<ResponseMessage<Key, NodeInfo>, Error> {
        let mut stream = dial(peer.info()).await?;

        write_message(&mut stream, &Message::Request(req)).await?;

        let resp = match read_message(&mut stream).await? {
            Message::Response(r) => r,
            Message::Request(_) => return Err(Error::InvalidResponse),
        };

        // Responses must come from the peer we asked
        if resp.responder.id() != peer.id() {
            warn!(
                "[TcpRouter] expected response from {:?}, got {:?}",
                peer.info().peer(),
                resp.responder.info().peer()
            );
            return Err(Error::InvalidResponseId);
        }

        Ok(resp)
    }
}

#[async_trait]
impl Router<Key, NodeInfo> for TcpRouter {
    async fn find_closer(&self, peer: &PeerEntry, target: &Key) -> Result<Vec<PeerEntry>, Error> {
        let req = RequestMessage::find_node(self.local.clone(), *target);

        match self.request(peer, req).await?.response {
            Response::NodesFound(id, nodes) if &id == target => {
                trace!(
                    "[TcpRouter] {:?} returned {} nodes",
                    peer.info().peer(),
                    nodes.len()
                );
                Ok(nodes)
            }
            Response::NodesFound(_, _) => Err(Error::InvalidResponseId),
            _ => Err(Error::InvalidResponse),
        }
    }
}

async fn dial(info: &NodeInfo) -> Result<TcpStream, Error> {
    for a in info.addresses() {
        match TcpStream::connect(a).await {
            Ok(s) => return Ok(s),
            Err(e) => debug!("[TcpRouter] connect to {} failed: {}", a, e),
        }
    }

    Err(Error::Unreachable)
}

/// TCP listener answering requests on behalf of a [Dht]
pub struct TcpServer {
    listener: TcpListener,
    local: PeerEntry,
}

impl TcpServer {
    /// Bind a listener for `peer`, advertising the bound address
    pub async fn bind(peer: PeerId, addr: SocketAddr) -> Result<Self, Error> {
        let listener = TcpListener::bind(addr).await?;
        let local = NodeInfo::new(peer, vec![listener.local_addr()?]).into_entry();

        Ok(Self { listener, local })
    }

    /// Fetch the local entry, including the bound address
    pub fn local(&self) -> &PeerEntry {
        &self.local
    }

    /// Accept and answer requests until the listener fails
    pub async fn run<R>(self, dht: Dht<Key, NodeInfo, R>) -> Result<(), Error>
    where
        R: Router<Key, NodeInfo> + Clone + 'static,
    {
        info!(
            "[TcpServer] {} listening on {:?}",
            self.local.info().peer(),
            self.local.info().addresses()
        );

        loop {
            let (stream, from) = self.listener.accept().await?;
            let dht = dht.clone();
            let local = self.local.clone();

            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, &local, &dht).await {
                    debug!("[TcpServer] request from {} failed: {}", from, e);
                }
            });
        }
    }
}

async fn handle_connection<R>(
    mut stream: TcpStream,
    local: &PeerEntry,
    dht: &Dht<Key, NodeInfo, R>,
) -> Result<(), Error>
where
    R: Router<Key, NodeInfo> + Clone + 'static,
{
    let timeout = dht.config().request_timeout;

    let req = match tokio::time::timeout(timeout, read_message(&mut stream)).await {
        Ok(Ok(Message::Request(r))) => r,
        Ok(Ok(Message::Response(_))) => return Err(Error::InvalidResponse),
        Ok(Err(e)) => return Err(e),
        Err(_) => return Err(Error::Timeout),
    };

    trace!(
        "[TcpServer] {:?} from {:?}",
        req.request,
        req.caller.info().peer()
    );

    // Callers without addresses can not be contacted, so are not recorded
    let response = if req.caller.info().addresses().is_empty() {
        dht.respond(&req.request)
    } else {
        dht.handle(&req.caller, &req.request)
    };

    let resp = Message::Response(ResponseMessage {
        responder: local.clone(),
        response,
    });

    match tokio::time::timeout(timeout, write_message(&mut stream, &resp)).await {
        Ok(r) => r,
        Err(_) => Err(Error::Timeout),
    }
}
