//! Pipeline and destination settings.

use crate::{
    codec::FramerConfig,
    fragment::TpConfig,
    message::MagicCookie,
    session::Transport,
};

/// Settings shared by every connection of a [`Pipeline`](super::Pipeline).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineConfig {
    tp: TpConfig,
    framer: FramerConfig,
}

impl PipelineConfig {
    /// Combine segmentation and stream framing settings.
    #[must_use]
    pub const fn new(tp: TpConfig, framer: FramerConfig) -> Self { Self { tp, framer } }

    /// Replace the segmentation settings.
    #[must_use]
    pub const fn with_tp(mut self, tp: TpConfig) -> Self {
        self.tp = tp;
        self
    }

    /// Replace the stream framing settings.
    #[must_use]
    pub const fn with_framer(mut self, framer: FramerConfig) -> Self {
        self.framer = framer;
        self
    }

    /// Segmentation and reassembly settings.
    #[must_use]
    pub const fn tp(&self) -> TpConfig { self.tp }

    /// Settings for each new stream connection's framer.
    #[must_use]
    pub const fn framer(&self) -> FramerConfig { self.framer }
}

/// Where an outbound message is going.
///
/// Cookies only apply to stream transports and are ignored for datagrams.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Destination {
    transport: Transport,
    cookie: Option<MagicCookie>,
}

impl Destination {
    /// A datagram destination; oversized payloads are segmented.
    #[must_use]
    pub const fn datagram() -> Self {
        Self {
            transport: Transport::Datagram,
            cookie: None,
        }
    }

    /// A stream destination; payloads are never segmented.
    #[must_use]
    pub const fn stream() -> Self {
        Self {
            transport: Transport::Stream,
            cookie: None,
        }
    }

    /// Prefix the framed message with `cookie` on stream transports.
    #[must_use]
    pub const fn with_cookie(mut self, cookie: MagicCookie) -> Self {
        self.cookie = Some(cookie);
        self
    }

    #[must_use]
    pub const fn transport(&self) -> Transport { self.transport }

    /// Cookie written ahead of the message, if any.
    #[must_use]
    pub const fn cookie(&self) -> Option<MagicCookie> {
        match self.transport {
            Transport::Stream => self.cookie,
            Transport::Datagram => None,
        }
    }
}

impl From<Transport> for Destination {
    fn from(transport: Transport) -> Self {
        match transport {
            Transport::Datagram => Self::datagram(),
            Transport::Stream => Self::stream(),
        }
    }
}
