use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::{Error, Result};

/// Stable 64-bit identifier of a node in the mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Generates a new random, non-zero node ID
    pub fn random() -> Self {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        NodeId(rng.gen_range(1..=u64::MAX))
    }

    /// Returns the raw identifier
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        NodeId(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// What the tracker does with a reply whose identifiers disagree with its pending entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchPolicy {
    /// Log the anomaly and keep waiting for a correct reply or the deadline
    #[default]
    KeepPending,
    /// Retire the entry and fail the probe with a mismatch error
    Retire,
}

/// A statically known peer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerEntry {
    /// The peer's node ID
    pub node_id: NodeId,
    /// The peer's transport address
    pub addr: SocketAddr,
}

/// Configuration for a probing node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// This node's identity
    pub node_id: NodeId,
    /// Local address to bind to
    pub bind_addr: SocketAddr,
    /// Timeout used by `send_ping`
    #[serde(serialize_with = "super::serde::serialize_duration")]
    #[serde(deserialize_with = "super::serde::deserialize_duration")]
    pub default_timeout: Duration,
    /// How often pending probes are checked for expiry
    #[serde(serialize_with = "super::serde::serialize_duration")]
    #[serde(deserialize_with = "super::serde::deserialize_duration")]
    pub sweep_interval: Duration,
    /// Handling of replies that disagree with their pending probe
    #[serde(default)]
    pub mismatch_policy: MismatchPolicy,
    /// Buffered completion events per subscriber
    pub event_capacity: usize,
    /// Outbound datagrams queued ahead of the socket
    pub send_queue: usize,
    /// Static node-id to address table
    #[serde(default)]
    pub peers: Vec<PeerEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            node_id: NodeId(1),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], super::DEFAULT_PORT)),
            default_timeout: Duration::from_secs(1),
            sweep_interval: Duration::from_millis(100),
            mismatch_policy: MismatchPolicy::KeepPending,
            event_capacity: 64,
            send_queue: 128,
            peers: Vec::new(),
        }
    }
}

impl Config {
    /// Parses and validates a JSON configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::config(format!("Failed to serialize config: {}", e)))
    }

    /// Checks that the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if self.node_id.0 == 0 {
            return Err(Error::config("node_id must be non-zero"));
        }
        if self.default_timeout.is_zero() {
            return Err(Error::config("default_timeout must be non-zero"));
        }
        if self.sweep_interval.is_zero() {
            return Err(Error::config("sweep_interval must be non-zero"));
        }
        if self.sweep_interval > self.default_timeout {
            return Err(Error::config("sweep_interval exceeds default_timeout"));
        }
        if self.event_capacity == 0 || self.send_queue == 0 {
            return Err(Error::config("channel capacities must be non-zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_random() {
        let id1 = NodeId::random();
        let id2 = NodeId::random();
        assert_ne!(id1, id2);
        assert_ne!(id1.get(), 0);
    }

    #[test]
    fn test_node_id_display() {
        assert_eq!(NodeId(2).to_string(), "0000000000000002");
        assert_eq!(NodeId::from(u64::MAX).to_string(), "ffffffffffffffff");
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_json_roundtrip() {
        let mut config = Config::default();
        config.node_id = NodeId(7);
        config.mismatch_policy = MismatchPolicy::Retire;
        config.peers.push(PeerEntry {
            node_id: NodeId(2),
            addr: "10.0.0.2:4444".parse().unwrap(),
        });

        let json = config.to_json().unwrap();
        let parsed = Config::from_json(&json).unwrap();
        assert_eq!(parsed.node_id, NodeId(7));
        assert_eq!(parsed.mismatch_policy, MismatchPolicy::Retire);
        assert_eq!(parsed.peers, config.peers);
        assert_eq!(parsed.sweep_interval, Duration::from_millis(100));
    }

    #[test]
    fn test_config_from_json_defaults_optional_fields() {
        let json = r#"{
            "node_id": 3,
            "bind_addr": "127.0.0.1:0",
            "default_timeout": 0.5,
            "sweep_interval": 0.05,
            "event_capacity": 8,
            "send_queue": 8
        }"#;
        let config = Config::from_json(json).unwrap();
        assert_eq!(config.mismatch_policy, MismatchPolicy::KeepPending);
        assert!(config.peers.is_empty());
        assert_eq!(config.default_timeout, Duration::from_millis(500));
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.sweep_interval = Duration::from_secs(5);
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = Config::default();
        config.node_id = NodeId(0);
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.sweep_interval = Duration::ZERO;
        assert!(config.validate().is_err());

        assert!(Config::from_json("{ not json").is_err());
    }
}
