//! Inbound path: framing, reassembly and verification.

use std::time::Instant;

use bytes::{Buf, Bytes};
use tokio_util::codec::Decoder;
use tracing::{debug, trace, warn};

use super::{Pipeline, lock};
use crate::{
    codec::{FrameEvent, FramingError},
    e2e::CheckOutcome,
    fragment::{MessageIdentity, ReassemblyStatus},
    message::{COOKIE_LEN, Header, MagicCookie, Message},
    metrics::{self, Direction},
    session::{Connection, Transport},
};

/// A complete message and the result of its E2E check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delivery {
    message: Message,
    e2e: CheckOutcome,
}

impl Delivery {
    #[must_use]
    pub const fn message(&self) -> &Message { &self.message }

    /// Outcome of the E2E check; [`CheckOutcome::NotChecked`] without a binding.
    #[must_use]
    pub const fn e2e(&self) -> CheckOutcome { self.e2e }

    /// `false` only when a protection binding rejected the payload.
    #[must_use]
    pub const fn is_valid(&self) -> bool { self.e2e.is_valid() }

    #[must_use]
    pub fn into_message(self) -> Message { self.message }
}

/// One result of [`Pipeline::on_receive`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Inbound {
    /// A complete message, verified if a binding exists.
    Message(Delivery),
    /// Bytes dropped as corrupt; nothing from them is delivered.
    FramingError(FramingError),
}

impl Inbound {
    /// Return the delivery, if this result carries one.
    #[must_use]
    pub const fn delivery(&self) -> Option<&Delivery> {
        match self {
            Self::Message(delivery) => Some(delivery),
            Self::FramingError(_) => None,
        }
    }
}

impl Pipeline {
    /// Process bytes received on `connection`.
    ///
    /// Stream bytes are appended to the connection's buffer and framed; a
    /// datagram is treated as one or more whole messages. Results are
    /// returned in wire order. Calls for one connection must not overlap;
    /// calls for different connections may run in parallel.
    #[must_use]
    pub fn on_receive(&self, connection: &Connection, bytes: Bytes) -> Vec<Inbound> {
        self.on_receive_at(connection, bytes, crate::clock::now())
    }

    /// Process received bytes using an explicit clock reading for reassembly.
    #[must_use]
    pub fn on_receive_at(&self, connection: &Connection, bytes: Bytes, now: Instant) -> Vec<Inbound> {
        let mut out = Vec::new();
        match connection.transport() {
            Transport::Datagram => self.receive_datagram(connection, bytes, now, &mut out),
            Transport::Stream => self.receive_stream(connection, &bytes, now, &mut out),
        }
        out
    }

    fn receive_datagram(
        &self,
        connection: &Connection,
        mut rest: Bytes,
        now: Instant,
        out: &mut Vec<Inbound>,
    ) {
        while !rest.is_empty() {
            if let Some(cookie) = MagicCookie::detect(&rest) {
                trace!(peer = %connection.peer(), ?cookie, "magic cookie skipped");
                rest.advance(COOKIE_LEN);
                continue;
            }
            let header = match Header::parse(&rest) {
                Ok(header) => header,
                Err(error) => {
                    datagram_error(connection, error.into(), rest.len(), out);
                    return;
                }
            };
            let declared = header.total_len();
            let total = match usize::try_from(declared) {
                Ok(total) if total <= rest.len() => total,
                _ => {
                    let error = FramingError::TruncatedDatagram {
                        declared,
                        available: rest.len(),
                    };
                    datagram_error(connection, error, rest.len(), out);
                    return;
                }
            };
            match Message::decode(rest.split_to(total)) {
                Ok(message) => self.route(connection, message, now, out),
                Err(error) => {
                    datagram_error(connection, error.into(), rest.len(), out);
                    return;
                }
            }
        }
    }

    fn receive_stream(
        &self,
        connection: &Connection,
        bytes: &[u8],
        now: Instant,
        out: &mut Vec<Inbound>,
    ) {
        let slot = self.cursor(connection.id());
        let mut guard = lock(&slot);
        let cursor = &mut *guard;
        cursor.buffer.extend_from_slice(bytes);
        loop {
            match cursor.framer.decode(&mut cursor.buffer) {
                Ok(Some(FrameEvent::Message(message))) => self.route(connection, message, now, out),
                Ok(Some(FrameEvent::Rejected(error))) => out.push(Inbound::FramingError(error)),
                Ok(None) => break,
                Err(error) => {
                    warn!(connection = %connection.id(), %error, "stream decode failed; buffer cleared");
                    cursor.buffer.clear();
                    break;
                }
            }
        }
    }

    /// Send one complete unit through reassembly and verification.
    fn route(&self, connection: &Connection, message: Message, now: Instant, out: &mut Vec<Inbound>) {
        metrics::inc_units(Direction::Inbound, 1);
        let header = *message.header();
        if !header.message_type.is_tp() {
            out.push(self.deliver(message));
            return;
        }
        if connection.transport() == Transport::Stream {
            debug!(connection = %connection.id(), "TP segment on stream transport dropped");
            metrics::inc_framing_errors();
            out.push(Inbound::FramingError(FramingError::SegmentOnStream));
            return;
        }
        let identity = MessageIdentity::from_header(connection.peer(), &header, connection.transport());
        match self.reassembler.push_at(identity, &message, now) {
            Ok(ReassemblyStatus::Complete(message)) => out.push(self.deliver(message)),
            Ok(ReassemblyStatus::Incomplete | ReassemblyStatus::Duplicate) => {}
            Err(error) => warn!(%identity, %error, "segment dropped"),
        }
    }

    fn deliver(&self, message: Message) -> Inbound {
        let header = message.header();
        let e2e = self.registry.verify(header, message.payload());
        if !e2e.is_valid() {
            debug!(
                service = %header.service,
                method = %header.method,
                outcome = ?e2e,
                "E2E check failed"
            );
            metrics::inc_e2e_failures();
        }
        Inbound::Message(Delivery { message, e2e })
    }
}

fn datagram_error(connection: &Connection, error: FramingError, dropped: usize, out: &mut Vec<Inbound>) {
    debug!(peer = %connection.peer(), %error, dropped, "rest of datagram discarded");
    metrics::inc_framing_errors();
    out.push(Inbound::FramingError(error));
}
