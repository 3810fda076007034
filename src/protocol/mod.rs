//! Protocol implementation module
//!
//! This module defines the echo probe messages, their fixed binary
//! encoding, and the tracker holding outstanding requests.

pub mod codec;
pub mod message;
pub mod tracker;

pub use self::codec::{
    MessageCodec, ECHO_REPLY_LEN, ECHO_REPLY_TYPE, ECHO_REQUEST_LEN, ECHO_REQUEST_TYPE,
};
pub use self::message::{EchoReply, EchoRequest, Message, Sequence};
pub use self::tracker::{
    ExpiredEntry, MatchResult, PendingEntry, RequestTracker, FIRST_SEQUENCE, SEQUENCE_SPACE,
};
