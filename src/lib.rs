//! meshping: node liveness and round-trip latency probes for mesh networks
//!
//! Nodes are addressed by a stable 64-bit identifier rather than a transport
//! address. A probe sends an echo request to the node the resolver maps the
//! identifier to, and completes with the measured round trip when the
//! matching echo reply arrives, or with a timeout when the expiry sweep
//! reaches its deadline first.
//!
//! ```no_run
//! use meshping::{Config, NodeId, PeerEntry};
//! use meshping::network::Node;
//!
//! #[tokio::main]
//! async fn main() -> meshping::Result<()> {
//!     let config = Config {
//!         node_id: NodeId(1),
//!         peers: vec![PeerEntry {
//!             node_id: NodeId(2),
//!             addr: "10.0.0.2:4444".parse().unwrap(),
//!         }],
//!         ..Config::default()
//!     };
//!
//!     let node = Node::start(config).await?;
//!     let outcome = node.engine().ping(NodeId(2), std::time::Duration::from_secs(1)).await;
//!     println!("{:?}", outcome);
//!     Ok(())
//! }
//! ```
pub mod core;
pub mod network;
pub mod ping;
pub mod protocol;
pub mod time;

// Re-export commonly used items
pub use crate::core::{
    Config, DecodeError, Error, ErrorKind, MismatchPolicy, NodeId, PeerEntry, Result,
};
pub use crate::ping::{InboundDispatcher, Outcome, PingEngine, PingEvent, PingStats};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Installs a `fmt` tracing subscriber filtered by `RUST_LOG`.
///
/// Does nothing if a global subscriber is already set.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_init_tracing_is_idempotent() {
        init_tracing();
        init_tracing();
    }
}
