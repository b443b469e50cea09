//! Stream framing for reliable transports.
//!
//! A byte stream carries SOME/IP messages back to back with no outer length
//! prefix, so message boundaries come from each header's length field. The
//! [`StreamFramer`] follows those boundaries, rejects headers that fail
//! validation, and resynchronises on magic cookies or the next plausible
//! header after corruption.
//!
//! # Error Handling
//!
//! Corrupt input never surfaces as an I/O error on the decode path. It is
//! reported in-band as [`FrameEvent::Rejected`] carrying a [`FramingError`],
//! and decoding continues with the next recoverable boundary. See the
//! [`error`] module for the taxonomy.

use bytes::{Bytes, BytesMut};

use crate::{
    fragment::DEFAULT_MAX_MESSAGE_SIZE,
    message::{HEADER_LEN, MagicCookie, Message},
};

pub mod error;
mod framer;

pub use error::FramingError;
pub use framer::{CursorState, FrameEvent, StreamFramer};

/// Minimum accepted message length in bytes.
///
/// Lengths passed to [`FramerConfig::new`] are clamped to at least this value
/// so that an empty-bodied message always fits.
pub const MIN_MESSAGE_LENGTH: usize = HEADER_LEN;

/// Maximum accepted message length in bytes (16 MiB).
///
/// Lengths passed to [`FramerConfig::new`] are clamped to at most this value
/// to prevent unbounded buffering on a single connection.
pub const MAX_MESSAGE_LENGTH: usize = 16 * 1024 * 1024;

pub(crate) fn clamp_message_length(value: usize) -> usize {
    value.clamp(MIN_MESSAGE_LENGTH, MAX_MESSAGE_LENGTH)
}

/// Settings for one [`StreamFramer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FramerConfig {
    max_message_len: usize,
    expect_cookies: bool,
    outbound_cookie: Option<MagicCookie>,
}

impl FramerConfig {
    /// Accept messages up to `max_message_len` bytes, header included.
    ///
    /// ```
    /// use someip_wire::codec::{FramerConfig, MAX_MESSAGE_LENGTH};
    ///
    /// assert_eq!(FramerConfig::new(usize::MAX).max_message_len(), MAX_MESSAGE_LENGTH);
    /// assert_eq!(FramerConfig::new(4).max_message_len(), 16);
    /// ```
    #[must_use]
    pub fn new(max_message_len: usize) -> Self {
        Self {
            max_message_len: clamp_message_length(max_message_len),
            expect_cookies: false,
            outbound_cookie: None,
        }
    }

    /// Treat cookies inside message bodies as corruption from the first byte
    /// rather than only after the peer has sent a cookie.
    #[must_use]
    pub const fn expect_cookies(mut self, expect: bool) -> Self {
        self.expect_cookies = expect;
        self
    }

    /// Prefix every encoded message with `cookie`.
    #[must_use]
    pub const fn with_outbound_cookie(mut self, cookie: MagicCookie) -> Self {
        self.outbound_cookie = Some(cookie);
        self
    }

    /// Largest accepted message, header included.
    #[must_use]
    pub const fn max_message_len(&self) -> usize { self.max_message_len }

    /// Report whether cookie scanning starts before any cookie is seen.
    #[must_use]
    pub const fn expects_cookies(&self) -> bool { self.expect_cookies }

    /// Cookie written ahead of outbound messages, if any.
    #[must_use]
    pub const fn outbound_cookie(&self) -> Option<MagicCookie> { self.outbound_cookie }
}

impl Default for FramerConfig {
    fn default() -> Self { Self::new(HEADER_LEN + DEFAULT_MAX_MESSAGE_SIZE) }
}

/// Append `message` to `dst`, preceded by `cookie` when one is given.
pub fn encode_stream_unit(message: &Message, cookie: Option<MagicCookie>, dst: &mut BytesMut) {
    if let Some(cookie) = cookie {
        dst.extend_from_slice(cookie.bytes());
    }
    message.encode_into(dst);
}

/// Encode `message` for a stream transport into a fresh buffer.
#[must_use]
pub fn stream_unit(message: &Message, cookie: Option<MagicCookie>) -> Bytes {
    let mut dst = BytesMut::new();
    encode_stream_unit(message, cookie, &mut dst);
    dst.freeze()
}
