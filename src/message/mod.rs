//! SOME/IP message model: header, identifiers, cookies and owned messages.
//!
//! Everything in this module is transport agnostic. Framing over streams lives
//! in [`crate::codec`]; segmentation lives in [`crate::fragment`].

pub mod cookie;
pub mod header;
pub mod types;

use bytes::{Bytes, BytesMut};
pub use cookie::{CLIENT_COOKIE, COOKIE_LEN, MagicCookie, SERVICE_COOKIE, find_cookie};
pub use header::{HEADER_LEN, Header, LENGTH_COVERED_HEADER_BYTES, PROTOCOL_VERSION};
use thiserror::Error;
pub use types::{ClientId, MessageKind, MessageType, MethodId, ReturnCode, ServiceId, SessionId};

/// Reasons a header or message fails structural validation.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum HeaderError {
    /// Fewer than [`HEADER_LEN`] bytes were available.
    #[error("header truncated: {len} bytes available")]
    Truncated { len: usize },
    /// The protocol version byte is not [`PROTOCOL_VERSION`].
    #[error("unsupported protocol version {0:#04x}")]
    WrongProtocolVersion(u8),
    /// The message type byte is reserved.
    #[error("reserved message type {0:#04x}")]
    ReservedMessageType(u8),
    /// The return code lies outside `0x00..=0x5E`.
    #[error("invalid return code {0:#04x}")]
    InvalidReturnCode(u8),
    /// A request or notification carries a non-zero return code.
    #[error("return code {return_code:#04x} not allowed for message type {message_type:#04x}")]
    ReturnCodeMismatch { message_type: u8, return_code: u8 },
    /// The length field cannot even cover the remaining header bytes.
    #[error("declared length {0} below minimum of 8")]
    LengthTooShort(u32),
    /// The body does not match the declared length.
    #[error("declared body of {declared} bytes but {actual} available")]
    LengthMismatch { declared: u32, actual: usize },
    /// The payload cannot be described by the 32-bit length field.
    #[error("payload of {0} bytes exceeds the length field")]
    PayloadTooLarge(usize),
}

/// An owned SOME/IP message: validated header plus payload bytes.
///
/// The payload of a TP segment still starts with its 4-byte TP header; see
/// [`crate::fragment::TpHeader`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    header: Header,
    payload: Bytes,
}

impl Message {
    /// Build a message, rewriting the header length to match `payload`.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::PayloadTooLarge`] if the payload cannot be
    /// represented in the 32-bit length field.
    pub fn new(mut header: Header, payload: impl Into<Bytes>) -> Result<Self, HeaderError> {
        let payload = payload.into();
        header.length = u32::try_from(payload.len())
            .ok()
            .and_then(|len| len.checked_add(LENGTH_COVERED_HEADER_BYTES))
            .ok_or(HeaderError::PayloadTooLarge(payload.len()))?;
        Ok(Self { header, payload })
    }

    /// Decode exactly one message from `src`.
    ///
    /// # Errors
    ///
    /// Returns a [`HeaderError`] if the header is invalid or the body length
    /// differs from the declared length.
    pub fn decode(mut src: Bytes) -> Result<Self, HeaderError> {
        let header = Header::parse(&src)?;
        let actual = src.len() - HEADER_LEN;
        if u64::try_from(actual).ok() != Some(u64::from(header.body_len())) {
            return Err(HeaderError::LengthMismatch {
                declared: header.body_len(),
                actual,
            });
        }
        let payload = src.split_off(HEADER_LEN);
        Ok(Self { header, payload })
    }

    /// Return the header.
    #[must_use]
    pub const fn header(&self) -> &Header { &self.header }

    /// Return the payload bytes.
    #[must_use]
    pub const fn payload(&self) -> &Bytes { &self.payload }

    /// Consume the message, returning header and payload.
    #[must_use]
    pub fn into_parts(self) -> (Header, Bytes) { (self.header, self.payload) }

    /// Total on-wire size of the message.
    #[must_use]
    pub fn encoded_len(&self) -> usize { HEADER_LEN + self.payload.len() }

    /// Append header and payload to `dst`.
    pub fn encode_into(&self, dst: &mut BytesMut) {
        dst.reserve(self.encoded_len());
        self.header.write_into(dst);
        dst.extend_from_slice(&self.payload);
    }

    /// Encode into a fresh buffer.
    #[must_use]
    pub fn to_bytes(&self) -> Bytes {
        let mut dst = BytesMut::with_capacity(self.encoded_len());
        self.encode_into(&mut dst);
        dst.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification() -> Header {
        Header::new(
            ServiceId::new(0x1111),
            MethodId::new(0x8002),
            MessageKind::Notification.into(),
        )
    }

    #[test]
    fn new_rewrites_length() {
        let msg = Message::new(notification(), vec![1, 2, 3]).expect("small payload");
        assert_eq!(msg.header().length, 11);
        assert_eq!(msg.encoded_len(), 19);
    }

    #[test]
    fn decode_round_trips_encoded_message() {
        let msg = Message::new(notification(), vec![9; 40]).expect("small payload");
        assert_eq!(Message::decode(msg.to_bytes()), Ok(msg));
    }

    #[test]
    fn decode_rejects_length_mismatch() {
        let msg = Message::new(notification(), vec![9; 4]).expect("small payload");
        let mut raw = msg.to_bytes().to_vec();
        raw.push(0);
        assert_eq!(
            Message::decode(Bytes::from(raw)),
            Err(HeaderError::LengthMismatch {
                declared: 4,
                actual: 5,
            })
        );
    }
}
