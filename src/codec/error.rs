//! Error types for the framing layer.
//!
//! Every [`FramingError`] is local to one connection. The framer reports it,
//! drops the offending bytes and carries on; no variant ends the connection
//! on its own.

use thiserror::Error;

use crate::message::HeaderError;

/// Framing-level errors raised while locating message boundaries.
///
/// Bytes covered by a framing error are never delivered as message data.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum FramingError {
    /// A header failed a static check (version, type, return code, length).
    #[error("implausible header: {0}")]
    Header(#[from] HeaderError),

    /// The declared message size exceeds the configured maximum.
    #[error("message exceeds max length: {size} > {max}")]
    OversizedMessage {
        /// Total size (header plus body) declared by the length field.
        size: u64,
        /// Maximum accepted total size.
        max: usize,
    },

    /// A magic cookie appeared inside the body of a pending message.
    #[error("magic cookie found {offset} bytes into a pending message")]
    CookieInsideMessage {
        /// Position of the cookie relative to the start of the message.
        offset: usize,
    },

    /// The stream ended before a complete message arrived.
    #[error("premature EOF: {bytes_received} bytes of {expected:?} byte message received")]
    TruncatedAtEof {
        /// Bytes buffered when the stream ended.
        bytes_received: usize,
        /// Declared total size, if a header had been accepted.
        expected: Option<usize>,
    },

    /// A datagram ended before the message its header declares.
    #[error("datagram truncated: message declares {declared} bytes, {available} available")]
    TruncatedDatagram {
        /// Total size declared by the header.
        declared: u64,
        /// Bytes left in the datagram.
        available: usize,
    },

    /// A TP segment arrived on a stream transport.
    #[error("segmented message received on a stream transport")]
    SegmentOnStream,
}

impl FramingError {
    /// Report whether the error came from a header that failed validation.
    ///
    /// ```
    /// use someip_wire::{codec::FramingError, message::HeaderError};
    ///
    /// assert!(FramingError::from(HeaderError::WrongProtocolVersion(2)).is_bad_header());
    /// assert!(!FramingError::SegmentOnStream.is_bad_header());
    /// ```
    #[must_use]
    pub const fn is_bad_header(&self) -> bool {
        matches!(self, Self::Header(_) | Self::OversizedMessage { .. })
    }
}

impl From<FramingError> for std::io::Error {
    fn from(error: FramingError) -> Self { Self::new(std::io::ErrorKind::InvalidData, error) }
}
