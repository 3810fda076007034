use crate::core::NodeId;

/// Per-requester counter disambiguating concurrently outstanding probes
pub type Sequence = u16;

/// Asks the target node to answer with an [`EchoReply`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EchoRequest {
    /// Originating node
    pub requester_id: NodeId,
    /// Node being probed
    pub target_id: NodeId,
    /// Sequence allocated by the requester's tracker
    pub sequence: Sequence,
}

/// Answer to an [`EchoRequest`], echoing its identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EchoReply {
    /// Originating node of the request being answered
    pub requester_id: NodeId,
    /// Node the request was addressed to
    pub target_id: NodeId,
    /// Sequence copied from the request
    pub sequence: Sequence,
    /// Node that produced this reply
    pub responder_id: NodeId,
}

impl EchoRequest {
    /// Builds the reply this node sends when it is `responder`
    pub fn reply_from(&self, responder: NodeId) -> EchoReply {
        EchoReply {
            requester_id: self.requester_id,
            target_id: self.target_id,
            sequence: self.sequence,
            responder_id: responder,
        }
    }
}

/// Probe protocol messages, tagged by the leading type byte on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    Request(EchoRequest),
    Reply(EchoReply),
}

impl Message {
    /// Sequence carried by either message kind
    pub fn sequence(&self) -> Sequence {
        match self {
            Message::Request(req) => req.sequence,
            Message::Reply(reply) => reply.sequence,
        }
    }
}

impl From<EchoRequest> for Message {
    fn from(req: EchoRequest) -> Self {
        Message::Request(req)
    }
}

impl From<EchoReply> for Message {
    fn from(reply: EchoReply) -> Self {
        Message::Reply(reply)
    }
}
