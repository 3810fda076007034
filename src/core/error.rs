use std::io;
use thiserror::Error;

use super::types::NodeId;

/// Reasons an inbound datagram could not be decoded
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("datagram too short: need {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    #[error("unknown message type {0}")]
    UnknownType(u8),
}

/// Custom error types for the echo probe
#[derive(Error, Debug)]
pub enum Error {
    #[error("no free sequence number: too many outstanding probes")]
    ResourceExhausted,

    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
}

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Copyable classification of an error, as reported in probe outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ResourceExhausted,
    UnknownNode,
    Transport,
    /// A reply's identifiers disagreed with the pending probe
    Mismatch,
    Config,
    Io,
    Decode,
}

impl Error {
    /// Creates a new transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Error::Transport(msg.into())
    }

    /// Creates a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Returns the kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ResourceExhausted => ErrorKind::ResourceExhausted,
            Error::UnknownNode(_) => ErrorKind::UnknownNode,
            Error::Transport(_) => ErrorKind::Transport,
            Error::Config(_) => ErrorKind::Config,
            Error::Io(_) => ErrorKind::Io,
            Error::Decode(_) => ErrorKind::Decode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::transport("queue full");
        assert!(matches!(err, Error::Transport(_)));
        assert_eq!(err.to_string(), "Transport error: queue full");
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[test]
    fn test_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::Other, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));

        let err: Error = DecodeError::UnknownType(7).into();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(err.to_string(), "Decode error: unknown message type 7");
    }

    #[test]
    fn test_unknown_node_display() {
        let err = Error::UnknownNode(NodeId(0x2a));
        assert_eq!(err.to_string(), "unknown node 000000000000002a");
        assert_eq!(err.kind(), ErrorKind::UnknownNode);
    }
}
