use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, trace, warn};

use super::engine::Shared;
use super::stats::StatsRecorder;
use super::Outcome;
use crate::core::{DecodeError, ErrorKind, NodeId};
use crate::protocol::{EchoReply, EchoRequest, MatchResult, Message, Sequence};

/// What the dispatcher did with one inbound datagram
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// An echo request addressed to this node was answered
    Answered { sequence: Sequence },
    /// An echo request was addressed to this node but the reply could not be sent
    AnswerFailed { sequence: Sequence },
    /// A reply completed the pending probe with this sequence
    Matched { sequence: Sequence, round_trip: Duration },
    /// A reply disagreed with its pending probe
    Mismatched { sequence: Sequence },
    /// A reply had no pending probe (late, duplicate or spurious)
    Unmatched { sequence: Sequence },
    /// The message belongs to another node's probe
    NotForUs,
    /// The datagram did not decode
    Malformed(DecodeError),
}

/// Classifies inbound datagrams and routes them to the responder or the tracker.
///
/// The transport layer hands every datagram it receives to
/// [`InboundDispatcher::handle_datagram`] together with its source address.
/// Nothing here fails: malformed or stray input is dropped and logged.
#[derive(Clone)]
pub struct InboundDispatcher {
    shared: Arc<Shared>,
}

impl InboundDispatcher {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        InboundDispatcher { shared }
    }

    /// Decodes and routes one datagram received from `src`
    pub fn handle_datagram(&self, payload: &[u8], src: SocketAddr) -> Disposition {
        trace!(%src, len = payload.len(), "datagram received");
        match self.shared.codec.decode(payload) {
            Ok(Message::Request(req)) => self.answer(req, src),
            Ok(Message::Reply(reply)) => self.resolve(reply, src),
            Err(e) => {
                self.shared.with_stats(StatsRecorder::decode_error);
                warn!(%src, error = %e, "dropping malformed datagram");
                Disposition::Malformed(e)
            }
        }
    }

    /// Answers a request addressed to this node; node id 0 addresses every node
    fn answer(&self, req: EchoRequest, src: SocketAddr) -> Disposition {
        let me = self.shared.node_id;
        if req.target_id != me && req.target_id != NodeId(0) {
            debug!(%src, node = %req.target_id, sequence = req.sequence, "echo request for another node");
            return Disposition::NotForUs;
        }

        let reply = req.reply_from(me);
        let payload = self.shared.codec.encode(&reply.into());
        match self.shared.transport.send(src, payload) {
            Ok(()) => {
                self.shared.with_stats(StatsRecorder::answered);
                debug!(%src, requester = %req.requester_id, sequence = req.sequence, "answered echo request");
                Disposition::Answered {
                    sequence: req.sequence,
                }
            }
            Err(e) => {
                warn!(%src, sequence = req.sequence, error = %e, "failed to send echo reply");
                Disposition::AnswerFailed {
                    sequence: req.sequence,
                }
            }
        }
    }

    fn resolve(&self, reply: EchoReply, src: SocketAddr) -> Disposition {
        let sequence = reply.sequence;
        if reply.requester_id != self.shared.node_id {
            debug!(%src, requester = %reply.requester_id, sequence, "echo reply for another node");
            return Disposition::NotForUs;
        }

        let now = self.shared.clock.now();
        let result = self.shared.lock_tracker().resolve(&reply, now);

        match result {
            MatchResult::Matched { round_trip, entry } => {
                self.shared.complete(
                    entry.target_id,
                    sequence,
                    entry.waiter,
                    Outcome::Success { round_trip },
                );
                Disposition::Matched {
                    sequence,
                    round_trip,
                }
            }
            MatchResult::Mismatch { retired } => {
                self.shared.with_stats(StatsRecorder::mismatch);
                warn!(
                    %src,
                    sequence,
                    node = %reply.target_id,
                    responder = %reply.responder_id,
                    "echo reply does not match pending request"
                );
                if let Some(entry) = retired {
                    self.shared.complete(
                        entry.target_id,
                        sequence,
                        entry.waiter,
                        Outcome::Error {
                            kind: ErrorKind::Mismatch,
                        },
                    );
                }
                Disposition::Mismatched { sequence }
            }
            MatchResult::NoMatch => {
                self.shared.with_stats(StatsRecorder::unmatched);
                debug!(%src, sequence, "late or duplicate echo reply");
                Disposition::Unmatched { sequence }
            }
        }
    }
}
