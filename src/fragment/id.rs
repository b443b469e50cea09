use std::{fmt, net::SocketAddr};

use crate::{
    message::{ClientId, Header, MethodId, ServiceId, SessionId},
    session::Transport,
};

/// Key correlating every segment of one logical message.
///
/// Segments from different senders, sessions or transports never share a
/// reassembly entry, even when the rest of their headers are identical.
///
/// # Examples
///
/// ```
/// use std::net::{Ipv4Addr, SocketAddr};
///
/// use someip_wire::{
///     fragment::MessageIdentity,
///     message::{Header, MessageKind, MethodId, ServiceId},
///     session::Transport,
/// };
///
/// let header = Header::new(ServiceId::new(1), MethodId::new(2), MessageKind::Request.into());
/// let source = SocketAddr::from((Ipv4Addr::LOCALHOST, 30501));
/// let id = MessageIdentity::from_header(source, &header, Transport::Datagram);
/// assert_eq!(id.service(), ServiceId::new(1));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageIdentity {
    source: SocketAddr,
    service: ServiceId,
    method: MethodId,
    client: ClientId,
    session: SessionId,
    transport: Transport,
}

impl MessageIdentity {
    /// Derive the identity of a message received from `source`.
    #[must_use]
    pub const fn from_header(source: SocketAddr, header: &Header, transport: Transport) -> Self {
        Self {
            source,
            service: header.service,
            method: header.method,
            client: header.client,
            session: header.session,
            transport,
        }
    }

    /// Return the sending endpoint.
    #[must_use]
    pub const fn source(&self) -> SocketAddr { self.source }

    /// Return the service identifier.
    #[must_use]
    pub const fn service(&self) -> ServiceId { self.service }

    /// Return the method or event identifier.
    #[must_use]
    pub const fn method(&self) -> MethodId { self.method }

    /// Return the client identifier.
    #[must_use]
    pub const fn client(&self) -> ClientId { self.client }

    /// Return the session identifier.
    #[must_use]
    pub const fn session(&self) -> SessionId { self.session }

    /// Return the transport the segments arrived on.
    #[must_use]
    pub const fn transport(&self) -> Transport { self.transport }
}

impl fmt::Display for MessageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}.{} client {} session {} via {}",
            self.source, self.service, self.method, self.client, self.session, self.transport
        )
    }
}
