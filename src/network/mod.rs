//! Network collaborators of the probe engine
//!
//! This module defines the transport and address-resolution seams the engine
//! depends on, a UDP endpoint implementing them, and [`Node`], which wires a
//! complete probing node together from a [`Config`].

mod connection;
mod resolver;
mod transport;

pub use self::connection::UdpEndpoint;
pub use self::resolver::{Resolver, StaticResolver};
pub use self::transport::{ChannelTransport, Outbound, Transport};

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::core::{Config, Result};
use crate::ping::PingEngine;
use crate::time::SystemClock;

/// A running probing node: UDP endpoint, engine and expiry sweeper
pub struct Node {
    engine: PingEngine,
    resolver: Arc<StaticResolver>,
    local_addr: SocketAddr,
    tasks: Vec<JoinHandle<Result<()>>>,
}

impl Node {
    /// Binds the endpoint and spawns the I/O and sweep tasks
    pub async fn start(config: Config) -> Result<Self> {
        config.validate()?;

        let endpoint = UdpEndpoint::bind(config.bind_addr).await?;
        let local_addr = endpoint.local_addr();

        let (transport, outbound) = ChannelTransport::channel(config.send_queue);
        let resolver = Arc::new(StaticResolver::from_peers(&config.peers));
        let engine = PingEngine::new(
            &config,
            Arc::new(transport),
            resolver.clone(),
            Arc::new(SystemClock),
        );

        let io_task = tokio::spawn(endpoint.run(engine.dispatcher(), outbound));
        let sweeper = tokio::spawn(engine.clone().run_sweeper(config.sweep_interval));

        info!(
            node = %config.node_id,
            %local_addr,
            peers = config.peers.len(),
            "probe node started"
        );

        Ok(Node {
            engine,
            resolver,
            local_addr,
            tasks: vec![io_task, sweeper],
        })
    }

    /// The node's probe engine
    pub fn engine(&self) -> &PingEngine {
        &self.engine
    }

    /// The node's address table, for adding peers at runtime
    pub fn resolver(&self) -> &StaticResolver {
        &self.resolver
    }

    /// Address the endpoint is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops the engine and the background tasks.
    ///
    /// Probes still outstanding fail with a transport error, and engine
    /// clones held elsewhere reject new probes from then on.
    pub fn shutdown(&mut self) {
        self.engine.shutdown();
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        self.shutdown();
    }
}
