use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::message::{EchoReply, EchoRequest, Message};
use crate::core::{DecodeError, NodeId};

/// Type discriminator of an echo request
pub const ECHO_REQUEST_TYPE: u8 = 0;
/// Type discriminator of an echo reply
pub const ECHO_REPLY_TYPE: u8 = 1;

/// Encoded size of an echo request: type, sequence, requester, target
pub const ECHO_REQUEST_LEN: usize = 1 + 2 + 8 + 8;
/// Encoded size of an echo reply: request fields plus responder
pub const ECHO_REPLY_LEN: usize = ECHO_REQUEST_LEN + 8;

/// Fixed-layout, big-endian codec for probe messages
#[derive(Clone, Copy, Debug, Default)]
pub struct MessageCodec;

impl MessageCodec {
    /// Creates a new message codec
    pub fn new() -> Self {
        MessageCodec
    }

    /// Number of bytes `message` occupies on the wire
    pub fn encoded_len(message: &Message) -> usize {
        match message {
            Message::Request(_) => ECHO_REQUEST_LEN,
            Message::Reply(_) => ECHO_REPLY_LEN,
        }
    }

    /// Encodes a message into a fresh buffer
    pub fn encode(&self, message: &Message) -> Bytes {
        let mut dst = BytesMut::with_capacity(Self::encoded_len(message));
        self.encode_into(message, &mut dst);
        dst.freeze()
    }

    /// Appends the encoding of `message` to `dst`
    pub fn encode_into(&self, message: &Message, dst: &mut BytesMut) {
        dst.reserve(Self::encoded_len(message));
        match message {
            Message::Request(req) => {
                dst.put_u8(ECHO_REQUEST_TYPE);
                dst.put_u16(req.sequence);
                dst.put_u64(req.requester_id.0);
                dst.put_u64(req.target_id.0);
            }
            Message::Reply(reply) => {
                dst.put_u8(ECHO_REPLY_TYPE);
                dst.put_u16(reply.sequence);
                dst.put_u64(reply.requester_id.0);
                dst.put_u64(reply.target_id.0);
                dst.put_u64(reply.responder_id.0);
            }
        }
    }

    /// Decodes one message from the front of `src`; trailing bytes are ignored
    pub fn decode(&self, src: &[u8]) -> Result<Message, DecodeError> {
        let Some(&kind) = src.first() else {
            return Err(DecodeError::TooShort {
                expected: ECHO_REQUEST_LEN,
                actual: 0,
            });
        };

        let expected = match kind {
            ECHO_REQUEST_TYPE => ECHO_REQUEST_LEN,
            ECHO_REPLY_TYPE => ECHO_REPLY_LEN,
            other => return Err(DecodeError::UnknownType(other)),
        };
        if src.len() < expected {
            return Err(DecodeError::TooShort {
                expected,
                actual: src.len(),
            });
        }

        let mut buf = &src[1..expected];
        let sequence = buf.get_u16();
        let requester_id = NodeId(buf.get_u64());
        let target_id = NodeId(buf.get_u64());

        let message = if kind == ECHO_REQUEST_TYPE {
            Message::Request(EchoRequest {
                requester_id,
                target_id,
                sequence,
            })
        } else {
            Message::Reply(EchoReply {
                requester_id,
                target_id,
                sequence,
                responder_id: NodeId(buf.get_u64()),
            })
        };
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> EchoRequest {
        EchoRequest {
            requester_id: NodeId(1),
            target_id: NodeId(2),
            sequence: 1,
        }
    }

    #[test]
    fn test_request_wire_layout() {
        let bytes = MessageCodec::new().encode(&request().into());
        assert_eq!(bytes.len(), 19);
        assert_eq!(
            &bytes[..],
            &[0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 2][..]
        );
    }

    #[test]
    fn test_reply_wire_layout() {
        let reply = EchoReply {
            requester_id: NodeId(1),
            target_id: NodeId(2),
            sequence: 0x0102,
            responder_id: NodeId(0xaabb),
        };
        let bytes = MessageCodec::new().encode(&reply.into());
        assert_eq!(bytes.len(), 27);
        assert_eq!(bytes[0], ECHO_REPLY_TYPE);
        assert_eq!(&bytes[1..3], &[0x01, 0x02]);
        assert_eq!(&bytes[19..], &[0, 0, 0, 0, 0, 0, 0xaa, 0xbb]);
    }

    #[test]
    fn test_codec_roundtrip() {
        let codec = MessageCodec::new();
        let req: Message = request().into();
        assert_eq!(codec.decode(&codec.encode(&req)), Ok(req));

        let reply: Message = EchoReply {
            requester_id: NodeId(u64::MAX),
            target_id: NodeId(0),
            sequence: u16::MAX,
            responder_id: NodeId(42),
        }
        .into();
        assert_eq!(codec.decode(&codec.encode(&reply)), Ok(reply));
    }

    #[test]
    fn test_decode_too_short() {
        let codec = MessageCodec::new();
        assert_eq!(
            codec.decode(&[0, 0, 1, 0, 0]),
            Err(DecodeError::TooShort { expected: 19, actual: 5 })
        );
        assert!(matches!(codec.decode(&[]), Err(DecodeError::TooShort { .. })));

        // a full request is still too short to be a reply
        let mut bytes = codec.encode(&request().into()).to_vec();
        bytes[0] = ECHO_REPLY_TYPE;
        assert_eq!(
            codec.decode(&bytes),
            Err(DecodeError::TooShort { expected: 27, actual: 19 })
        );
    }

    #[test]
    fn test_decode_unknown_type() {
        let mut bytes = [0u8; 19];
        bytes[0] = 7;
        assert_eq!(
            MessageCodec::new().decode(&bytes),
            Err(DecodeError::UnknownType(7))
        );
    }

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        let codec = MessageCodec::new();
        let mut buf = BytesMut::new();
        codec.encode_into(&request().into(), &mut buf);
        buf.extend_from_slice(b"padding");
        assert_eq!(codec.decode(&buf), Ok(request().into()));
    }

    #[test]
    fn test_decode_never_panics_on_noise() {
        let codec = MessageCodec::new();
        for len in 0..40usize {
            for first in [0u8, 1, 2, 0xff] {
                let mut buf = vec![0xa5u8; len];
                if let Some(b) = buf.first_mut() {
                    *b = first;
                }
                let _ = codec.decode(&buf);
            }
        }
    }
}
