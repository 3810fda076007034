use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{PoisonError, RwLock};

use crate::core::{NodeId, PeerEntry};

/// Maps node identifiers to transport addresses
pub trait Resolver: Send + Sync {
    /// Returns the address of `node`, or `None` if it is unknown
    fn resolve(&self, node: NodeId) -> Option<SocketAddr>;
}

/// Resolver backed by an in-memory table
#[derive(Debug, Default)]
pub struct StaticResolver {
    peers: RwLock<HashMap<NodeId, SocketAddr>>,
}

impl StaticResolver {
    /// Creates an empty resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a resolver seeded with `peers`
    pub fn from_peers(peers: &[PeerEntry]) -> Self {
        let table = peers.iter().map(|p| (p.node_id, p.addr)).collect();
        StaticResolver {
            peers: RwLock::new(table),
        }
    }

    /// Adds or replaces the address of `node`
    pub fn insert(&self, node: NodeId, addr: SocketAddr) -> Option<SocketAddr> {
        self.write().insert(node, addr)
    }

    /// Forgets `node`
    pub fn remove(&self, node: NodeId) -> Option<SocketAddr> {
        self.write().remove(&node)
    }

    /// Returns the number of known nodes
    pub fn len(&self) -> usize {
        self.peers.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether no node is known
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<NodeId, SocketAddr>> {
        self.peers.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Resolver for StaticResolver {
    fn resolve(&self, node: NodeId) -> Option<SocketAddr> {
        self.peers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&node)
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_resolver() {
        let addr: SocketAddr = "10.0.0.2:4444".parse().unwrap();
        let resolver = StaticResolver::from_peers(&[PeerEntry {
            node_id: NodeId(2),
            addr,
        }]);
        assert_eq!(resolver.len(), 1);
        assert_eq!(resolver.resolve(NodeId(2)), Some(addr));
        assert_eq!(resolver.resolve(NodeId(3)), None);

        let moved: SocketAddr = "10.0.0.3:4444".parse().unwrap();
        assert_eq!(resolver.insert(NodeId(2), moved), Some(addr));
        assert_eq!(resolver.resolve(NodeId(2)), Some(moved));

        assert_eq!(resolver.remove(NodeId(2)), Some(moved));
        assert!(resolver.is_empty());
    }
}
