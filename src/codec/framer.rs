//! Per-connection decoder and encoder for SOME/IP byte streams.

use std::io;

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, trace};

use super::{FramerConfig, FramingError, encode_stream_unit};
use crate::message::{COOKIE_LEN, HEADER_LEN, Header, MagicCookie, Message, find_cookie};

/// Position of a [`StreamFramer`] relative to message boundaries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CursorState {
    /// The next byte starts a header or a cookie.
    Seeking,
    /// A header was accepted; waiting for the rest of the message.
    InMessage {
        /// Declared total size, header included.
        total: usize,
        /// Bytes already searched for an embedded cookie.
        scanned: usize,
    },
    /// Discarding bytes until a cookie or a plausible header appears.
    Resyncing {
        /// Bytes dropped so far in this episode.
        discarded: usize,
    },
}

/// One decoding result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameEvent {
    /// A complete message whose header passed validation.
    Message(Message),
    /// Bytes that were dropped, and why.
    Rejected(FramingError),
}

/// Decoder and encoder for one stream connection.
///
/// The framer owns the connection's cursor state and must only be driven by
/// that connection's reader.
///
/// # Examples
///
/// ```
/// use bytes::BytesMut;
/// use someip_wire::{
///     codec::{FrameEvent, StreamFramer},
///     message::{Header, MessageKind, Message, MethodId, ServiceId},
/// };
/// use tokio_util::codec::Decoder;
///
/// let header = Header::new(ServiceId::new(0x1234), MethodId::new(0x8001), MessageKind::Notification.into());
/// let message = Message::new(header, vec![1, 2, 3]).expect("small payload");
///
/// let mut framer = StreamFramer::default();
/// let mut buf = BytesMut::from(&[0x00; 3][..]);
/// buf.extend_from_slice(&message.to_bytes());
///
/// assert!(matches!(framer.decode(&mut buf), Ok(Some(FrameEvent::Rejected(_)))));
/// assert_eq!(framer.decode(&mut buf).ok(), Some(Some(FrameEvent::Message(message))));
/// ```
#[derive(Clone, Debug)]
pub struct StreamFramer {
    config: FramerConfig,
    state: CursorState,
    cookies_seen: bool,
}

impl StreamFramer {
    /// Create a framer positioned at a message boundary.
    #[must_use]
    pub const fn new(config: FramerConfig) -> Self {
        Self {
            config,
            state: CursorState::Seeking,
            cookies_seen: config.expects_cookies(),
        }
    }

    /// Return the framer's configuration.
    #[must_use]
    pub const fn config(&self) -> &FramerConfig { &self.config }

    /// Return the current cursor state.
    #[must_use]
    pub const fn state(&self) -> CursorState { self.state }

    /// Report whether embedded cookies are treated as corruption.
    #[must_use]
    pub const fn cookies_seen(&self) -> bool { self.cookies_seen }

    /// Validate a header window, returning the declared total size.
    fn accept_header(&self, window: &[u8]) -> Result<usize, FramingError> {
        let header = Header::parse(window)?;
        let size = header.total_len();
        let max = self.config.max_message_len();
        match usize::try_from(size) {
            Ok(total) if total <= max => Ok(total),
            _ => Err(FramingError::OversizedMessage { size, max }),
        }
    }

    fn is_boundary(&self, window: &[u8]) -> bool {
        MagicCookie::detect(window).is_some() || self.accept_header(window).is_ok()
    }

    fn reject(&mut self, error: FramingError, next: CursorState) -> FrameEvent {
        debug!(%error, "stream framing error");
        crate::metrics::inc_framing_errors();
        self.state = next;
        FrameEvent::Rejected(error)
    }

    /// Find a cookie starting at or after `from` that lies wholly in `window`.
    fn embedded_cookie(window: &[u8], from: usize) -> Option<usize> {
        window
            .get(from..)
            .and_then(find_cookie)
            .map(|offset| offset + from)
    }
}

impl Default for StreamFramer {
    fn default() -> Self { Self::new(FramerConfig::default()) }
}

impl Decoder for StreamFramer {
    type Item = FrameEvent;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match self.state {
                CursorState::Seeking => {
                    let Some(window) = src.get(..HEADER_LEN) else {
                        return Ok(None);
                    };
                    if let Some(cookie) = MagicCookie::detect(window) {
                        trace!(?cookie, "magic cookie");
                        src.advance(COOKIE_LEN);
                        self.cookies_seen = true;
                        continue;
                    }
                    match self.accept_header(window) {
                        Ok(total) => {
                            self.state = CursorState::InMessage {
                                total,
                                scanned: HEADER_LEN,
                            };
                        }
                        Err(error) => {
                            return Ok(Some(
                                self.reject(error, CursorState::Resyncing { discarded: 0 }),
                            ));
                        }
                    }
                }
                CursorState::InMessage { total, scanned } => {
                    let available = src.len().min(total);
                    if self.cookies_seen {
                        if let Some(offset) = Self::embedded_cookie(&src[..available], scanned) {
                            src.advance(offset);
                            return Ok(Some(self.reject(
                                FramingError::CookieInsideMessage { offset },
                                CursorState::Seeking,
                            )));
                        }
                        self.state = CursorState::InMessage {
                            total,
                            scanned: available.saturating_sub(COOKIE_LEN - 1).max(scanned),
                        };
                    }
                    if src.len() < total {
                        src.reserve(total - src.len());
                        return Ok(None);
                    }
                    let unit = src.split_to(total).freeze();
                    self.state = CursorState::Seeking;
                    return Ok(Some(match Message::decode(unit) {
                        Ok(message) => FrameEvent::Message(message),
                        Err(error) => self.reject(error.into(), CursorState::Seeking),
                    }));
                }
                CursorState::Resyncing { mut discarded } => {
                    loop {
                        let Some(window) = src.get(..HEADER_LEN) else {
                            self.state = CursorState::Resyncing { discarded };
                            return Ok(None);
                        };
                        if self.is_boundary(window) {
                            break;
                        }
                        src.advance(1);
                        discarded += 1;
                    }
                    debug!(discarded, "stream resynchronised");
                    self.state = CursorState::Seeking;
                }
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(event) = self.decode(src)? {
            return Ok(Some(event));
        }
        // Clean close: nothing buffered at a message boundary
        if src.is_empty() {
            self.state = CursorState::Seeking;
            return Ok(None);
        }
        let expected = match self.state {
            CursorState::InMessage { total, .. } => Some(total),
            CursorState::Seeking | CursorState::Resyncing { .. } => None,
        };
        let error = FramingError::TruncatedAtEof {
            bytes_received: src.len(),
            expected,
        };
        src.clear();
        Ok(Some(self.reject(error, CursorState::Seeking)))
    }
}

impl Encoder<Bytes> for StreamFramer {
    type Error = io::Error;

    /// Write one already encoded message, preceded by the configured cookie.
    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let max = self.config.max_message_len();
        if item.len() > max {
            return Err(FramingError::OversizedMessage {
                size: u64::try_from(item.len()).unwrap_or(u64::MAX),
                max,
            }
            .into());
        }
        let message = Message::decode(item).map_err(FramingError::from)?;
        encode_stream_unit(&message, self.config.outbound_cookie(), dst);
        Ok(())
    }
}

impl Encoder<&Message> for StreamFramer {
    type Error = io::Error;

    fn encode(&mut self, item: &Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let max = self.config.max_message_len();
        if item.encoded_len() > max {
            return Err(FramingError::OversizedMessage {
                size: u64::try_from(item.encoded_len()).unwrap_or(u64::MAX),
                max,
            }
            .into());
        }
        encode_stream_unit(item, self.config.outbound_cookie(), dst);
        Ok(())
    }
}
