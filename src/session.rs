//! Connection descriptors handed in by the socket layer.
//!
//! The socket layer owns the actual I/O. It identifies each receive callback
//! with a [`Connection`] so the pipeline can pick the right framing strategy and
//! keep per-connection stream state apart.

use std::net::SocketAddr;

use derive_more::{Display, From, Into};

/// Identifier assigned to a connection by the socket layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, From, Into)]
#[display("ConnectionId({_0})")]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Create a new [`ConnectionId`] with the provided value.
    #[must_use]
    pub const fn new(id: u64) -> Self { Self(id) }

    /// Return the inner `u64` representation.
    #[must_use]
    pub const fn as_u64(self) -> u64 { self.0 }
}

/// Transport class of a connection.
///
/// Datagram transports deliver whole units and carry TP segments; stream
/// transports need framing and never carry TP segments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum Transport {
    #[display("datagram")]
    Datagram,
    #[display("stream")]
    Stream,
}

impl Transport {
    /// Report whether this is the reliable (stream) transport.
    #[must_use]
    pub const fn is_reliable(self) -> bool { matches!(self, Self::Stream) }
}

/// Descriptor for the connection a buffer arrived on.
///
/// # Examples
///
/// ```
/// use std::net::{Ipv4Addr, SocketAddr};
///
/// use someip_wire::session::{Connection, ConnectionId, Transport};
///
/// let peer = SocketAddr::from((Ipv4Addr::LOCALHOST, 30490));
/// let conn = Connection::new(ConnectionId::new(7), peer, Transport::Stream);
/// assert_eq!(conn.id().as_u64(), 7);
/// assert!(conn.transport().is_reliable());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Connection {
    id: ConnectionId,
    peer: SocketAddr,
    transport: Transport,
}

impl Connection {
    /// Describe a connection.
    #[must_use]
    pub const fn new(id: ConnectionId, peer: SocketAddr, transport: Transport) -> Self {
        Self {
            id,
            peer,
            transport,
        }
    }

    /// Return the connection identifier.
    #[must_use]
    pub const fn id(&self) -> ConnectionId { self.id }

    /// Return the remote endpoint.
    #[must_use]
    pub const fn peer(&self) -> SocketAddr { self.peer }

    /// Return the transport class.
    #[must_use]
    pub const fn transport(&self) -> Transport { self.transport }
}
