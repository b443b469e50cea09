//! Message and connection builders.

use std::net::{Ipv4Addr, SocketAddr};

use bytes::Bytes;
use rstest::fixture;
use someip_wire::{
    Connection,
    ConnectionId,
    Header,
    Message,
    Transport,
    message::{ClientId, MessageKind, MethodId, ServiceId, SessionId},
};

/// Loopback address on `port`.
#[must_use]
pub fn peer(port: u16) -> SocketAddr { SocketAddr::from((Ipv4Addr::LOCALHOST, port)) }

/// Datagram connection from `127.0.0.1:30490`.
#[allow(
    unused_braces,
    reason = "rustc false positive for single line rstest fixtures"
)]
#[fixture]
pub fn datagram_connection() -> Connection {
    Connection::new(ConnectionId::new(1), peer(30_490), Transport::Datagram)
}

/// Stream connection from `127.0.0.1:30491`.
#[allow(
    unused_braces,
    reason = "rustc false positive for single line rstest fixtures"
)]
#[fixture]
pub fn stream_connection() -> Connection {
    Connection::new(ConnectionId::new(2), peer(30_491), Transport::Stream)
}

/// Notification for `service`/`event` in session 1.
///
/// # Panics
///
/// Panics if the payload does not fit the 32-bit length field.
pub fn notification(service: u16, event: u16, payload: impl Into<Bytes>) -> Message {
    let mut header = Header::new(
        ServiceId::new(service),
        MethodId::new(event),
        MessageKind::Notification.into(),
    );
    header.session = SessionId::new(1);
    Message::new(header, payload).expect("test payload fits the length field")
}

/// Request from `client` in `session`.
///
/// # Panics
///
/// Panics if the payload does not fit the 32-bit length field.
pub fn request(
    service: u16,
    method: u16,
    client: u16,
    session: u16,
    payload: impl Into<Bytes>,
) -> Message {
    let mut header = Header::new(
        ServiceId::new(service),
        MethodId::new(method),
        MessageKind::Request.into(),
    );
    header.client = ClientId::new(client);
    header.session = SessionId::new(session);
    header.interface_version = 1;
    Message::new(header, payload).expect("test payload fits the length field")
}

/// Payload whose bytes encode their own index modulo 251.
///
/// No 16-byte window of such a payload parses as a valid header, so it never
/// attracts a false resync.
#[must_use]
pub fn patterned(len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| u8::try_from(i % 251).unwrap_or_default())
        .collect()
}

/// A run of `0xAA` bytes, which never start a valid header.
#[must_use]
pub fn junk(len: usize) -> Vec<u8> { vec![0xAA; len] }

/// Copy of `wire` with the byte at `index` replaced by `value`.
#[must_use]
pub fn corrupt_byte(wire: &[u8], index: usize, value: u8) -> Vec<u8> {
    let mut bytes = wire.to_vec();
    bytes[index] = value;
    bytes
}
