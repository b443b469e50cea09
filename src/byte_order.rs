//! Big-endian field access for SOME/IP headers, TP sub-headers and E2E
//! protection fields.
//!
//! Every multi-byte SOME/IP field travels in network byte order. The helpers
//! below are the only places that convert, so the `big_endian_bytes` lint
//! expectation lives here and nowhere else.
//!
//! ```
//! use someip_wire::byte_order::{decode_u32, encode_u16, u16_at, u32_at};
//!
//! assert_eq!(encode_u16(0x1234), [0x12, 0x34]);
//! assert_eq!(decode_u32([0xDE, 0xAD, 0xBE, 0xEF]), 0xDEAD_BEEF);
//!
//! let header = [0x12, 0x34, 0x80, 0x01, 0x00, 0x00, 0x00, 0x0B];
//! assert_eq!(u16_at(&header, 2), Some(0x8001));
//! assert_eq!(u32_at(&header, 4), Some(11));
//! assert_eq!(u32_at(&header, 5), None);
//! ```

macro_rules! network_order {
    ($ty:ty, $width:literal, $encode:ident, $decode:ident, $at:ident) => {
        #[doc = concat!("Encode a `", stringify!($ty), "` as it appears on the wire.")]
        #[must_use]
        pub const fn $encode(value: $ty) -> [u8; $width] {
            #[expect(
                clippy::big_endian_bytes,
                reason = "SOME/IP fields are transmitted most significant byte first."
            )]
            value.to_be_bytes()
        }

        #[doc = concat!("Decode a `", stringify!($ty), "` from its wire bytes.")]
        #[must_use]
        pub const fn $decode(bytes: [u8; $width]) -> $ty {
            #[expect(
                clippy::big_endian_bytes,
                reason = "SOME/IP fields are transmitted most significant byte first."
            )]
            <$ty>::from_be_bytes(bytes)
        }

        #[doc = concat!(
            "Decode the `", stringify!($ty), "` starting at byte `at` of `src`.\n\n",
            "Returns `None` when `src` ends before the field does."
        )]
        #[must_use]
        pub fn $at(src: &[u8], at: usize) -> Option<$ty> {
            let field = src.get(at..)?.first_chunk::<$width>()?;
            Some($decode(*field))
        }
    };
}

network_order!(u16, 2, encode_u16, decode_u16, u16_at);
network_order!(u32, 4, encode_u32, decode_u32, u32_at);
