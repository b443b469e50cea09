//! The fixed 16-byte SOME/IP header.

use bytes::{BufMut, BytesMut};

use super::{
    ClientId,
    HeaderError,
    MessageType,
    MethodId,
    ReturnCode,
    ServiceId,
    SessionId,
};
use crate::byte_order::{decode_u16, decode_u32, encode_u16, encode_u32};

/// Size of the SOME/IP header in bytes.
pub const HEADER_LEN: usize = 16;

/// Number of header bytes counted by the length field.
///
/// The length field covers everything after itself: client, session, the four
/// single-byte fields and the payload.
pub const LENGTH_COVERED_HEADER_BYTES: u32 = 8;

/// The only protocol version this layer accepts.
pub const PROTOCOL_VERSION: u8 = 0x01;

/// Decoded SOME/IP header.
///
/// # Examples
///
/// ```
/// use someip_wire::message::{Header, MessageKind};
/// use someip_wire::message::{MethodId, ServiceId};
/// let header = Header::new(
///     ServiceId::new(0x1234),
///     MethodId::new(0x8001),
///     MessageKind::Notification.into(),
/// );
/// let bytes = header.to_bytes();
/// assert_eq!(Header::parse(&bytes), Ok(header));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub service: ServiceId,
    pub method: MethodId,
    /// Declared length: 8 plus the payload length.
    pub length: u32,
    pub client: ClientId,
    pub session: SessionId,
    pub interface_version: u8,
    pub message_type: MessageType,
    pub return_code: ReturnCode,
}

impl Header {
    /// Build a header for an empty payload with zero client, session and
    /// interface version.
    #[must_use]
    pub const fn new(service: ServiceId, method: MethodId, message_type: MessageType) -> Self {
        Self {
            service,
            method,
            length: LENGTH_COVERED_HEADER_BYTES,
            client: ClientId::new(0),
            session: SessionId::new(0),
            interface_version: 0,
            message_type,
            return_code: ReturnCode::OK,
        }
    }

    /// Parse and validate the first [`HEADER_LEN`] bytes of `src`.
    ///
    /// Validation covers everything that can be judged from the header alone:
    /// protocol version, message type, return code, their combination and the
    /// lower bound of the length field.
    ///
    /// # Errors
    ///
    /// Returns a [`HeaderError`] naming the first check that failed.
    pub fn parse(src: &[u8]) -> Result<Self, HeaderError> {
        let Some(raw) = src.get(..HEADER_LEN) else {
            return Err(HeaderError::Truncated { len: src.len() });
        };
        if raw[12] != PROTOCOL_VERSION {
            return Err(HeaderError::WrongProtocolVersion(raw[12]));
        }
        let message_type = MessageType::from_byte(raw[14])?;
        let return_code = ReturnCode::from_byte(raw[15])?;
        if message_type.kind().requires_ok_return_code() && return_code != ReturnCode::OK {
            return Err(HeaderError::ReturnCodeMismatch {
                message_type: raw[14],
                return_code: raw[15],
            });
        }
        let length = decode_u32([raw[4], raw[5], raw[6], raw[7]]);
        if length < LENGTH_COVERED_HEADER_BYTES {
            return Err(HeaderError::LengthTooShort(length));
        }
        Ok(Self {
            service: decode_u16([raw[0], raw[1]]).into(),
            method: decode_u16([raw[2], raw[3]]).into(),
            length,
            client: decode_u16([raw[8], raw[9]]).into(),
            session: decode_u16([raw[10], raw[11]]).into(),
            interface_version: raw[13],
            message_type,
            return_code,
        })
    }

    /// Serialise the header into its 16-byte wire form.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0..2].copy_from_slice(&encode_u16(self.service.get()));
        out[2..4].copy_from_slice(&encode_u16(self.method.get()));
        out[4..8].copy_from_slice(&encode_u32(self.length));
        out[8..10].copy_from_slice(&encode_u16(self.client.get()));
        out[10..12].copy_from_slice(&encode_u16(self.session.get()));
        out[12] = PROTOCOL_VERSION;
        out[13] = self.interface_version;
        out[14] = self.message_type.to_byte();
        out[15] = self.return_code.get();
        out
    }

    /// Append the wire form to `dst`.
    pub fn write_into(&self, dst: &mut BytesMut) { dst.put_slice(&self.to_bytes()); }

    /// Number of bytes following the header, as declared by the length field.
    #[must_use]
    pub const fn body_len(&self) -> u32 { self.length.saturating_sub(LENGTH_COVERED_HEADER_BYTES) }

    /// Total on-wire size (header plus body), as declared by the length field.
    #[must_use]
    pub fn total_len(&self) -> u64 { HEADER_LEN as u64 + u64::from(self.body_len()) }
}

/// Read the declared length field without validating anything else.
///
/// Returns `None` when fewer than eight bytes are available.
#[must_use]
pub fn peek_length(src: &[u8]) -> Option<u32> { crate::byte_order::u32_at(src, 4) }

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::message::MessageKind;

    fn sample() -> Header {
        Header {
            service: ServiceId::new(0x1234),
            method: MethodId::new(0x0421),
            length: 8 + 3,
            client: ClientId::new(0x0001),
            session: SessionId::new(0x0002),
            interface_version: 0x05,
            message_type: MessageKind::Response.into(),
            return_code: ReturnCode::NOT_READY,
        }
    }

    #[test]
    fn header_layout_is_big_endian() {
        assert_eq!(
            sample().to_bytes(),
            [
                0x12, 0x34, 0x04, 0x21, 0x00, 0x00, 0x00, 0x0B, 0x00, 0x01, 0x00, 0x02, 0x01, 0x05,
                0x80, 0x04,
            ]
        );
        assert_eq!(Header::parse(&sample().to_bytes()), Ok(sample()));
        assert_eq!(sample().body_len(), 3);
        assert_eq!(sample().total_len(), 19);
    }

    #[rstest]
    #[case::empty(8, HEADER_LEN)]
    #[case::one_segment(8 + 1392, HEADER_LEN + 1392)]
    #[case::largest(u32::MAX, HEADER_LEN + 0xFFFF_FFF7)]
    fn total_len_adds_the_header_to_the_body(#[case] length: u32, #[case] expected: usize) {
        let header = Header { length, ..sample() };
        assert_eq!(header.total_len(), u64::try_from(expected).expect("fits in u64"));
    }

    #[rstest]
    #[case::version(12, 0x02, HeaderError::WrongProtocolVersion(0x02))]
    #[case::reserved_type(14, 0x03, HeaderError::ReservedMessageType(0x03))]
    #[case::return_code(15, 0x5F, HeaderError::InvalidReturnCode(0x5F))]
    #[case::mismatch(14, 0x02, HeaderError::ReturnCodeMismatch { message_type: 0x02, return_code: 0x04 })]
    #[case::short_length(7, 0x07, HeaderError::LengthTooShort(7))]
    fn parse_rejects_corrupt_fields(
        #[case] index: usize,
        #[case] value: u8,
        #[case] expected: HeaderError,
    ) {
        let mut bytes = sample().to_bytes();
        bytes[index] = value;
        assert_eq!(Header::parse(&bytes), Err(expected));
    }

    #[test]
    fn parse_reports_truncation() {
        assert_eq!(
            Header::parse(&[0u8; 10]),
            Err(HeaderError::Truncated { len: 10 })
        );
    }
}
