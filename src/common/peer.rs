//! Peer identities and network information
//!
// https://github.com/ryankurte/rust-kad
// Copyright 2018-2023 ryan kurte

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{Entry, Error};

/// Length of peer identities and keys in bytes
pub const ID_LEN: usize = 32;

/// 256-bit key space used for peers and lookup targets
pub type Key = [u8; ID_LEN];

/// Routing table / lookup entry for a network peer
pub type PeerEntry = Entry<Key, NodeInfo>;

/// Network identity of a peer
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeerId([u8; ID_LEN]);

impl PeerId {
    pub fn new(id: [u8; ID_LEN]) -> Self {
        Self(id)
    }

    /// Create a random peer identity, used for ephemeral lookup clients
    pub fn random() -> Self {
        Self(rand::random())
    }

    pub fn as_bytes(&self) -> &[u8; ID_LEN] {
        &self.0
    }

    /// Map this identity into the key space (SHA-256 of the identity bytes)
    pub fn key(&self) -> Key {
        let mut hasher = Sha256::new();
        hasher.update(self.0);

        let mut key = [0u8; ID_LEN];
        key.copy_from_slice(&hasher.finalize());
        key
    }
}

impl FromStr for PeerId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| Error::InvalidId)?;
        if bytes.len() != ID_LEN {
            return Err(Error::InvalidId);
        }

        let mut id = [0u8; ID_LEN];
        id.copy_from_slice(&bytes);
        Ok(Self(id))
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form keeps logs readable
        write!(f, "PeerId({})", &hex::encode(self.0)[..12])
    }
}

/// Peer identity with its known network addresses (in preference order)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeInfo {
    peer: PeerId,
    addresses: Vec<SocketAddr>,
}

impl NodeInfo {
    pub fn new(peer: PeerId, addresses: Vec<SocketAddr>) -> Self {
        Self { peer, addresses }
    }

    pub fn peer(&self) -> &PeerId {
        &self.peer
    }

    pub fn addresses(&self) -> &[SocketAddr] {
        &self.addresses
    }

    /// Build a routing entry keyed by the peer's key
    pub fn into_entry(self) -> PeerEntry {
        Entry::new(self.peer.key(), self)
    }
}

impl From<NodeInfo> for PeerEntry {
    fn from(info: NodeInfo) -> Self {
        info.into_entry()
    }
}
