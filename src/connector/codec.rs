//! Wire encoding for DHT messages
//!
//! Messages are sent as frames of a big-endian `u32` length followed by a
//! bincode encoded [WireMessage]. Peers travel as [NodeInfo] records and entry
//! IDs are derived from the peer ID on decode.
//!
// https://github.com/ryankurte/rust-kad
// Copyright 2018-2023 ryan kurte

use std::io::ErrorKind as IoErrorKind;

use bincode::Options;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::common::*;

/// Maximum encoded frame length (excluding the length prefix)
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Bincode options bounding decoded messages to a single frame
fn bincode_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_limit(MAX_FRAME_LEN as u64)
        .with_fixint_encoding()
}

/// Message as sent on the wire, entries are carried by their [NodeInfo]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
enum WireMessage {
    Ping {
        sender: NodeInfo,
    },
    Pong {
        responder: NodeInfo,
    },
    FindNode {
        sender: NodeInfo,
        target: Key,
    },
    NodesFound {
        responder: NodeInfo,
        target: Key,
        nodes: Vec<NodeInfo>,
    },
}

impl From<&Message<Key, NodeInfo>> for WireMessage {
    fn from(m: &Message<Key, NodeInfo>) -> Self {
        match m {
            Message::Request(RequestMessage { caller, request }) => {
                let sender = caller.info().clone();
                match request {
                    Request::Ping => WireMessage::Ping { sender },
                    Request::FindNode(target) => WireMessage::FindNode {
                        sender,
                        target: *target,
                    },
                }
            }
            Message::Response(ResponseMessage {
                responder,
                response,
            }) => {
                let responder = responder.info().clone();
                match response {
                    Response::Pong => WireMessage::Pong { responder },
                    Response::NodesFound(target, nodes) => WireMessage::NodesFound {
                        responder,
                        target: *target,
                        nodes: nodes.iter().map(|n| n.info().clone()).collect(),
                    },
                }
            }
        }
    }
}

impl From<WireMessage> for Message<Key, NodeInfo> {
    fn from(m: WireMessage) -> Self {
        match m {
            WireMessage::Ping { sender } => Message::Request(RequestMessage::ping(sender.into_entry())),
            WireMessage::FindNode { sender, target } => {
                Message::Request(RequestMessage::find_node(sender.into_entry(), target))
            }
            WireMessage::Pong { responder } => Message::Response(ResponseMessage {
                responder: responder.into_entry(),
                response: Response::Pong,
            }),
            WireMessage::NodesFound {
                responder,
                target,
                nodes,
            } => Message::Response(ResponseMessage {
                responder: responder.into_entry(),
                response: Response::NodesFound(
                    target,
                    nodes.into_iter().map(NodeInfo::into_entry).collect(),
                ),
            }),
        }
    }
}

/// Encode a message body (without length prefix)
pub fn encode(m: &Message<Key, NodeInfo>) -> Result<Vec<u8>, Error> {
    bincode_options()
        .serialize(&WireMessage::from(m))
        .map_err(|_| Error::Io(IoErrorKind::InvalidInput))
}

/// Decode a message body (without length prefix), trailing data is rejected
pub fn decode(buf: &[u8]) -> Result<Message<Key, NodeInfo>, Error> {
    let m: WireMessage = bincode_options()
        .deserialize(buf)
        .map_err(|_| Error::InvalidResponse)?;

    Ok(m.into())
}

/// Write a length-prefixed message
pub async fn write_message<W>(w: &mut W, m: &Message<Key, NodeInfo>) -> Result<(), Error>
where
    W: AsyncWrite + Unpin,
{
    let body = encode(m)?;

    w.write_u32(body.len() as u32).await?;
    w.write_all(&body).await?;
    w.flush().await?;

    Ok(())
}

/// Read a length-prefixed message
pub async fn read_message<R>(r: &mut R) -> Result<Message<Key, NodeInfo>, Error>
where
    R: AsyncRead + Unpin,
{
    let len = r.read_u32().await? as usize;
    if len == 0 || len > MAX_FRAME_LEN {
        return Err(Error::InvalidResponse);
    }

    let mut body = vec![0u8; len];
    r.read_exact(&mut body).await?;

    decode(&body)
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use super::*;

    fn node(b: u8, port: u16) -> PeerEntry {
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        NodeInfo::new(PeerId::new([b; ID_LEN]), vec![addr]).into_entry()
    }

    #[tokio::test]
    async fn test_nodes_found_frame() {
        let responder = node(1, 4001);
        let target = PeerId::new([9; ID_LEN]).key();
        let nodes = vec![
            node(2, 4002),
            NodeInfo::new(PeerId::new([3; ID_LEN]), vec![]).into_entry(),
            NodeInfo::new(
                PeerId::new([4; ID_LEN]),
                vec!["[::1]:4004".parse().unwrap(), "10.0.0.4:4004".parse().unwrap()],
            )
            .into_entry(),
        ];

        let m = Message::Response(ResponseMessage {
            responder,
            response: Response::NodesFound(target, nodes),
        });

        let (mut a, mut b) = tokio::io::duplex(1024);
        write_message(&mut a, &m).await.unwrap();
        let decoded = read_message(&mut b).await.unwrap();

        assert_eq!(decoded, m);

        // Entry IDs are the keys of their peer identities
        if let Message::Response(r) = decoded {
            assert_eq!(r.responder.id(), &r.responder.info().peer().key());
        }
    }

    #[test]
    fn test_entry_id_from_peer() {
        // Entries with IDs unrelated to their peer are re-keyed on decode
        let info = NodeInfo::new(PeerId::new([7; ID_LEN]), vec![]);
        let caller = Entry::new([0xAA; ID_LEN], info.clone());

        let buf = encode(&Message::Request(RequestMessage::ping(caller))).unwrap();

        assert_eq!(
            decode(&buf),
            Ok(Message::Request(RequestMessage::ping(info.into_entry())))
        );
    }

    #[test]
    fn test_decode_malformed() {
        let ping = encode(&Message::Request(RequestMessage::ping(node(1, 4001)))).unwrap();

        // Empty, unknown variant, truncated and trailing data
        assert_eq!(decode(&[]), Err(Error::InvalidResponse));
        assert_eq!(decode(&[0x7F, 0, 0, 0]), Err(Error::InvalidResponse));
        assert_eq!(decode(&ping[..ping.len() - 1]), Err(Error::InvalidResponse));

        let mut trailing = ping.clone();
        trailing.push(0);
        assert_eq!(decode(&trailing), Err(Error::InvalidResponse));
    }

    #[test]
    fn test_decode_oversize_node_count() {
        let responder = NodeInfo::new(PeerId::new([1; ID_LEN]), vec![]).into_entry();
        let m = Message::Response(ResponseMessage {
            responder,
            response: Response::NodesFound([2; ID_LEN], vec![]),
        });
        let mut buf = encode(&m).unwrap();

        // Node count follows the variant, responder (ID and empty address list) and target
        let offset = 4 + ID_LEN + 8 + ID_LEN;
        assert_eq!(&buf[offset..], &[0u8; 8]);
        buf[offset..].copy_from_slice(&u64::MAX.to_le_bytes());

        assert_eq!(decode(&buf), Err(Error::InvalidResponse));
    }

    #[test]
    fn test_encode_oversize() {
        let addrs: Vec<SocketAddr> = (0..64).map(|p| SocketAddr::from(([10, 0, 0, 1], p))).collect();
        let nodes = (0..128u8)
            .map(|b| NodeInfo::new(PeerId::new([b; ID_LEN]), addrs.clone()).into_entry())
            .collect();

        let m = Message::Response(ResponseMessage {
            responder: node(1, 4001),
            response: Response::NodesFound([0; ID_LEN], nodes),
        });

        assert_eq!(encode(&m), Err(Error::Io(IoErrorKind::InvalidInput)));
    }

    #[tokio::test]
    async fn test_read_oversize_frame() {
        let (mut a, mut b) = tokio::io::duplex(64);

        a.write_u32(MAX_FRAME_LEN as u32 + 1).await.unwrap();
        assert_eq!(read_message(&mut b).await, Err(Error::InvalidResponse));
    }

    #[tokio::test]
    async fn test_read_truncated_frame() {
        let (mut a, mut b) = tokio::io::duplex(64);

        a.write_u32(16).await.unwrap();
        a.write_all(&[0, 0, 0]).await.unwrap();
        drop(a);

        assert_eq!(read_message(&mut b).await, Err(Error::InvalidResponse));
    }
}
