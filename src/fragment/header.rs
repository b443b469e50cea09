//! The 4-byte TP sub-header prefixed to every segment's payload chunk.

use bytes::{BufMut, Bytes, BytesMut};

use super::FragmentError;
use crate::byte_order::{decode_u32, encode_u32};

/// Size of the TP sub-header in bytes.
pub const TP_HEADER_LEN: usize = 4;

/// Granularity of segment offsets in bytes.
pub const OFFSET_UNIT: usize = 16;

const MORE_FLAG: u32 = 0x1;
const OFFSET_MASK: u32 = !0xF;
const MAX_OFFSET_UNITS: u32 = 0x0FFF_FFFF;

/// Decoded TP sub-header: 28-bit offset in 16-byte units, three reserved bits
/// and the more-segments flag.
///
/// # Examples
///
/// ```
/// use someip_wire::fragment::TpHeader;
/// let header = TpHeader::new(87, true).expect("offset fits in 28 bits");
/// assert_eq!(header.offset_bytes(), 1392);
/// assert_eq!(header.encode(), [0x00, 0x00, 0x05, 0x71]);
/// assert_eq!(TpHeader::decode([0x00, 0x00, 0x05, 0x71]), header);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TpHeader {
    offset_units: u32,
    more: bool,
}

impl TpHeader {
    /// Create a header from an offset expressed in 16-byte units.
    ///
    /// Returns `None` if the offset does not fit in 28 bits.
    #[must_use]
    pub const fn new(offset_units: u32, more: bool) -> Option<Self> {
        if offset_units > MAX_OFFSET_UNITS {
            return None;
        }
        Some(Self { offset_units, more })
    }

    /// Create a header from a byte offset.
    ///
    /// Returns `None` if `offset` is not a multiple of [`OFFSET_UNIT`] or does
    /// not fit in 28 bits of units.
    #[must_use]
    pub fn from_byte_offset(offset: usize, more: bool) -> Option<Self> {
        if offset % OFFSET_UNIT != 0 {
            return None;
        }
        Self::new(u32::try_from(offset / OFFSET_UNIT).ok()?, more)
    }

    /// Decode the sub-header. The reserved bits are ignored.
    #[must_use]
    pub fn decode(bytes: [u8; TP_HEADER_LEN]) -> Self {
        let word = decode_u32(bytes);
        Self {
            offset_units: (word & OFFSET_MASK) >> 4,
            more: word & MORE_FLAG != 0,
        }
    }

    /// Split a segment payload into its sub-header and chunk.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentError::TruncatedTpHeader`] if fewer than
    /// [`TP_HEADER_LEN`] bytes are available.
    pub fn split(payload: &[u8]) -> Result<(Self, &[u8]), FragmentError> {
        match payload.split_first_chunk::<TP_HEADER_LEN>() {
            Some((raw, chunk)) => Ok((Self::decode(*raw), chunk)),
            None => Err(FragmentError::TruncatedTpHeader { len: payload.len() }),
        }
    }

    /// Encode the sub-header. The reserved bits are written as zero.
    #[must_use]
    pub fn encode(self) -> [u8; TP_HEADER_LEN] {
        let more = if self.more { MORE_FLAG } else { 0 };
        encode_u32((self.offset_units << 4) | more)
    }

    /// Build a segment payload: this sub-header followed by `chunk`.
    #[must_use]
    pub fn prepend(self, chunk: &[u8]) -> Bytes {
        let mut body = BytesMut::with_capacity(TP_HEADER_LEN + chunk.len());
        body.put_slice(&self.encode());
        body.put_slice(chunk);
        body.freeze()
    }

    /// Offset of the chunk in 16-byte units.
    #[must_use]
    pub const fn offset_units(self) -> u32 { self.offset_units }

    /// Offset of the chunk in bytes.
    #[must_use]
    pub fn offset_bytes(self) -> usize {
        (self.offset_units as usize) * OFFSET_UNIT
    }

    /// Report whether further segments follow.
    #[must_use]
    pub const fn more(self) -> bool { self.more }
}
