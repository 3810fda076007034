//! Echo probe orchestration
//!
//! [`PingEngine`] issues probes and owns the request tracker;
//! [`InboundDispatcher`] feeds it every datagram the transport receives.
//! Outcomes reach callers through a [`PingHandle`], a broadcast of
//! [`PingEvent`]s, or both.

mod dispatcher;
mod engine;
mod stats;

pub use self::dispatcher::{Disposition, InboundDispatcher};
pub use self::engine::{PingEngine, PingHandle};
pub use self::stats::{PingStats, RttStats};

use std::time::Duration;

use crate::core::{ErrorKind, NodeId};
use crate::protocol::Sequence;

/// Terminal result of one probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A matching reply arrived after `round_trip`
    Success { round_trip: Duration },
    /// No matching reply before the deadline
    Timeout,
    /// The probe failed without a reply
    Error { kind: ErrorKind },
}

impl Outcome {
    /// Whether the probe was answered
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    /// Measured round trip of a successful probe
    pub fn round_trip(&self) -> Option<Duration> {
        match self {
            Outcome::Success { round_trip } => Some(*round_trip),
            _ => None,
        }
    }
}

/// Completion notice published for every probe, exactly once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingEvent {
    /// Node that was probed
    pub target: NodeId,
    /// Sequence the probe was sent with
    pub sequence: Sequence,
    /// How it ended
    pub outcome: Outcome,
}
