//! Magic cookie messages used as stream resynchronisation anchors.
//!
//! A cookie is a complete, well-formed 16-byte header with a reserved
//! service/method pair and a fixed declared length of eight. Cookies are never
//! delivered as application data.

/// Length of a magic cookie on the wire.
pub const COOKIE_LEN: usize = 16;

/// Cookie emitted by clients.
pub const CLIENT_COOKIE: [u8; COOKIE_LEN] = [
    0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00, 0x00, 0x08, 0xDE, 0xAD, 0xBE, 0xEF, 0x01, 0x01, 0x01, 0x00,
];

/// Cookie emitted by services.
pub const SERVICE_COOKIE: [u8; COOKIE_LEN] = [
    0xFF, 0xFF, 0x80, 0x00, 0x00, 0x00, 0x00, 0x08, 0xDE, 0xAD, 0xBE, 0xEF, 0x01, 0x01, 0x02, 0x00,
];

/// Which side of a connection emitted a cookie.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MagicCookie {
    Client,
    Service,
}

impl MagicCookie {
    /// Return the wire bytes for this cookie.
    #[must_use]
    pub const fn bytes(self) -> &'static [u8; COOKIE_LEN] {
        match self {
            Self::Client => &CLIENT_COOKIE,
            Self::Service => &SERVICE_COOKIE,
        }
    }

    /// Identify a cookie at the start of `src`.
    ///
    /// ```
    /// use someip_wire::message::{CLIENT_COOKIE, MagicCookie};
    /// assert_eq!(MagicCookie::detect(&CLIENT_COOKIE), Some(MagicCookie::Client));
    /// assert_eq!(MagicCookie::detect(&CLIENT_COOKIE[..15]), None);
    /// ```
    #[must_use]
    pub fn detect(src: &[u8]) -> Option<Self> {
        match src.get(..COOKIE_LEN)? {
            window if window == CLIENT_COOKIE => Some(Self::Client),
            window if window == SERVICE_COOKIE => Some(Self::Service),
            _ => None,
        }
    }
}

/// Find the first cookie in `haystack`, returning its offset.
#[must_use]
pub fn find_cookie(haystack: &[u8]) -> Option<usize> {
    haystack
        .windows(COOKIE_LEN)
        .position(|window| MagicCookie::detect(window).is_some())
}
