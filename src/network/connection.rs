use std::net::SocketAddr;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio_util::codec::BytesCodec;
use tokio_util::udp::UdpFramed;
use tracing::{debug, trace, warn};

use super::transport::Outbound;
use crate::core::{Error, Result};
use crate::ping::InboundDispatcher;

/// UDP socket carrying echo datagrams for one node
pub struct UdpEndpoint {
    framed: UdpFramed<BytesCodec>,
    local_addr: SocketAddr,
}

impl UdpEndpoint {
    /// Binds a non-blocking, address-reusing UDP socket
    pub async fn bind(bind_addr: SocketAddr) -> Result<Self> {
        let socket = Socket::new(
            Domain::for_address(bind_addr),
            Type::DGRAM,
            Some(Protocol::UDP),
        )?;
        socket.set_reuse_address(true)?;
        socket.set_nonblocking(true)?;
        socket
            .bind(&bind_addr.into())
            .map_err(|e| Error::transport(format!("Failed to bind {}: {}", bind_addr, e)))?;

        let socket = UdpSocket::from_std(socket.into())?;
        let local_addr = socket.local_addr()?;
        debug!(%local_addr, "udp endpoint bound");

        Ok(UdpEndpoint {
            framed: UdpFramed::new(socket, BytesCodec::new()),
            local_addr,
        })
    }

    /// Returns the local socket address
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Pumps datagrams until the task is aborted.
    ///
    /// Queued datagrams are written to the socket; received datagrams are
    /// handed to `dispatcher`. A failed send or receive is logged and the
    /// loop carries on. The loop also returns if every sender of `outbound`
    /// is dropped, which cannot happen while `dispatcher` keeps its engine
    /// alive, so [`Node`](super::Node) stops it with an abort.
    pub async fn run(
        self,
        dispatcher: InboundDispatcher,
        mut outbound: mpsc::Receiver<Outbound>,
    ) -> Result<()> {
        let local_addr = self.local_addr;
        let (mut sink, mut stream) = self.framed.split::<(Bytes, SocketAddr)>();

        loop {
            tokio::select! {
                queued = outbound.recv() => match queued {
                    Some((payload, addr)) => {
                        trace!(%addr, len = payload.len(), "sending datagram");
                        if let Err(e) = sink.send((payload, addr)).await {
                            warn!(%addr, error = %e, "failed to send datagram");
                        }
                    }
                    None => {
                        debug!(%local_addr, "outbound queue closed, stopping endpoint");
                        return Ok(());
                    }
                },

                received = stream.next() => match received {
                    Some(Ok((datagram, src))) => {
                        dispatcher.handle_datagram(&datagram, src);
                    }
                    Some(Err(e)) => warn!(%local_addr, error = %e, "failed to receive datagram"),
                    None => return Ok(()),
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_ephemeral_port() {
        let endpoint = UdpEndpoint::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let addr = endpoint.local_addr();
        assert!(addr.ip().is_loopback());
        assert_ne!(addr.port(), 0);
    }
}
