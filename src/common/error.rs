//! Kademlia error types
//!
// https://github.com/ryankurte/rust-kad
// Copyright 2018-2023 ryan kurte

use std::fmt;
use std::io::{Error as IoError, ErrorKind as IoErrorKind};

#[derive(PartialEq, Clone, Debug)]
pub enum Error {
    /// Malformed peer identity
    InvalidId,
    /// Malformed network address
    InvalidAddress,
    /// Peer could not be reached (connect or transport failure)
    Unreachable,
    /// Peer responded with something other than the expected response
    InvalidResponse,
    /// Peer responded for a different request or identity
    InvalidResponseId,
    Timeout,
    Io(IoErrorKind),
    /// No peers available to start a lookup
    NoPeers,
    /// Lookup ran out of candidates without locating the target
    NotFound,
    /// Lookup cancelled or overall deadline reached
    Cancelled,
    /// Error raised by a query visitor
    Visitor(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidId => write!(f, "invalid peer id"),
            Error::InvalidAddress => write!(f, "invalid address"),
            Error::Unreachable => write!(f, "peer unreachable"),
            Error::InvalidResponse => write!(f, "invalid response"),
            Error::InvalidResponseId => write!(f, "response id mismatch"),
            Error::Timeout => write!(f, "request timed out"),
            Error::Io(kind) => write!(f, "io error: {kind:?}"),
            Error::NoPeers => write!(f, "no peers available"),
            Error::NotFound => write!(f, "target not found"),
            Error::Cancelled => write!(f, "lookup cancelled"),
            Error::Visitor(e) => write!(f, "visitor error: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<IoError> for Error {
    fn from(e: IoError) -> Error {
        match e.kind() {
            IoErrorKind::TimedOut => Error::Timeout,
            IoErrorKind::ConnectionRefused
            | IoErrorKind::ConnectionReset
            | IoErrorKind::ConnectionAborted
            | IoErrorKind::NotConnected
            | IoErrorKind::AddrNotAvailable => Error::Unreachable,
            IoErrorKind::UnexpectedEof | IoErrorKind::InvalidData => Error::InvalidResponse,
            k => Error::Io(k),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_mapping() {
        let e = Error::from(IoError::new(IoErrorKind::TimedOut, "slow"));
        assert_eq!(e, Error::Timeout);

        let e = Error::from(IoError::new(IoErrorKind::ConnectionRefused, "nope"));
        assert_eq!(e, Error::Unreachable);

        let e = Error::from(IoError::new(IoErrorKind::UnexpectedEof, "short"));
        assert_eq!(e, Error::InvalidResponse);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(Error::NotFound.to_string(), "target not found");
        assert_eq!(Error::Visitor("boom".into()).to_string(), "visitor error: boom");
    }
}
