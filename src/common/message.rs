//! Kademlia message types
//!
// https://github.com/ryankurte/rust-kad
// Copyright 2018-2023 ryan kurte

use super::entry::Entry;

#[derive(PartialEq, Clone, Debug)]
pub enum Request<Id> {
    /// Liveness check, also used to confirm a peer's identity on connect
    Ping,
    /// Ask a peer for the entries it knows closest to an ID
    FindNode(Id),
}

impl<Id> Request<Id> {
    /// Fetch the database ID for the request (if present)
    pub fn id(&self) -> Option<&Id> {
        match self {
            Request::Ping => None,
            Request::FindNode(id) => Some(id),
        }
    }
}

#[derive(PartialEq, Clone, Debug)]
pub enum Response<Id, Info> {
    Pong,
    NodesFound(Id, Vec<Entry<Id, Info>>),
}

#[derive(PartialEq, Clone, Debug)]
pub struct RequestMessage<Id, Info> {
    pub caller: Entry<Id, Info>,
    pub request: Request<Id>,
}

impl<Id, Info> RequestMessage<Id, Info> {
    pub fn ping(caller: Entry<Id, Info>) -> RequestMessage<Id, Info> {
        RequestMessage {
            caller,
            request: Request::Ping,
        }
    }

    pub fn find_node(caller: Entry<Id, Info>, id: Id) -> RequestMessage<Id, Info> {
        RequestMessage {
            caller,
            request: Request::FindNode(id),
        }
    }
}

#[derive(PartialEq, Clone, Debug)]
pub struct ResponseMessage<Id, Info> {
    pub responder: Entry<Id, Info>,
    pub response: Response<Id, Info>,
}

#[derive(PartialEq, Clone, Debug)]
pub enum Message<Id, Info> {
    Request(RequestMessage<Id, Info>),
    Response(ResponseMessage<Id, Info>),
}
