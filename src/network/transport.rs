use std::net::SocketAddr;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::core::{Error, Result};

/// Outbound datagram service.
///
/// `send` hands a datagram off and returns immediately; delivery is best
/// effort and may drop, duplicate or reorder.
pub trait Transport: Send + Sync {
    /// Queues `payload` for delivery to `addr`
    fn send(&self, addr: SocketAddr, payload: Bytes) -> Result<()>;
}

/// Datagram waiting to be written to the socket
pub type Outbound = (Bytes, SocketAddr);

/// Transport that queues datagrams on a bounded channel for an I/O task
#[derive(Clone, Debug)]
pub struct ChannelTransport {
    tx: mpsc::Sender<Outbound>,
}

impl ChannelTransport {
    /// Creates a transport and the receiver its I/O task drains
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (ChannelTransport { tx }, rx)
    }
}

impl Transport for ChannelTransport {
    fn send(&self, addr: SocketAddr, payload: Bytes) -> Result<()> {
        self.tx.try_send((payload, addr)).map_err(|e| match e {
            TrySendError::Full(_) => Error::transport("send queue full"),
            TrySendError::Closed(_) => Error::transport("transport closed"),
        })
    }
}
