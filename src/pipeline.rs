//! Coordination of framing, reassembly and E2E protection.
//!
//! A [`Pipeline`] is shared by every connection of one endpoint. Inbound bytes
//! pass through [`Pipeline::on_receive`]: stream transports are framed by a
//! per-connection [`StreamFramer`](crate::codec::StreamFramer), TP segments are
//! reassembled, and complete messages are verified against the
//! [`E2eRegistry`] before they are handed back as [`Inbound`] results.
//! Outbound messages take the reverse path through [`Pipeline::prepare_send`].
//!
//! The pipeline never drops a message because its E2E check failed; the
//! outcome travels with the message and the caller decides.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Instant,
};

use bytes::BytesMut;
use dashmap::DashMap;

use crate::{
    codec::{CursorState, StreamFramer},
    e2e::E2eRegistry,
    fragment::{Fragmenter, MessageIdentity, Reassembler},
    session::ConnectionId,
};

mod config;
mod receive;
mod send;
mod sweeper;

pub use config::{Destination, PipelineConfig};
pub use receive::{Delivery, Inbound};
pub use send::SendError;
pub use sweeper::spawn_reassembly_sweeper;

/// Framing state and unconsumed bytes of one stream connection.
#[derive(Debug)]
struct StreamCursor {
    framer: StreamFramer,
    buffer: BytesMut,
}

/// Shared wire-integrity pipeline for one endpoint.
///
/// # Examples
///
/// ```
/// use std::net::{Ipv4Addr, SocketAddr};
///
/// use someip_wire::{
///     message::{Header, Message, MessageKind, MethodId, ServiceId},
///     pipeline::{Destination, Inbound, Pipeline},
///     session::{Connection, ConnectionId, Transport},
/// };
///
/// let pipeline = Pipeline::default();
/// let header = Header::new(ServiceId::new(0x1234), MethodId::new(0x8001), MessageKind::Notification.into());
/// let message = Message::new(header, vec![0xAB; 8]).expect("small payload");
///
/// let units = pipeline
///     .prepare_send(message.clone(), Destination::datagram(), None)
///     .expect("no protection binding");
/// assert_eq!(units.len(), 1);
///
/// let peer = SocketAddr::from((Ipv4Addr::LOCALHOST, 30_490));
/// let connection = Connection::new(ConnectionId::new(1), peer, Transport::Datagram);
/// match pipeline.on_receive(&connection, units[0].clone()).as_slice() {
///     [Inbound::Message(delivery)] => assert_eq!(delivery.message(), &message),
///     other => panic!("unexpected result: {other:?}"),
/// }
/// ```
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    registry: E2eRegistry,
    fragmenter: Fragmenter,
    reassembler: Reassembler,
    streams: DashMap<ConnectionId, Arc<Mutex<StreamCursor>>>,
}

impl Pipeline {
    /// Create a pipeline with an empty protection registry.
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self { Self::with_registry(config, E2eRegistry::new()) }

    /// Create a pipeline using pre-populated protection bindings.
    #[must_use]
    pub fn with_registry(config: PipelineConfig, registry: E2eRegistry) -> Self {
        Self {
            config,
            registry,
            fragmenter: Fragmenter::new(config.tp()),
            reassembler: Reassembler::new(config.tp()),
            streams: DashMap::new(),
        }
    }

    /// Return the configuration.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig { &self.config }

    /// Protection bindings consulted on send and receive.
    #[must_use]
    pub const fn registry(&self) -> &E2eRegistry { &self.registry }

    /// The shared reassembly table.
    #[must_use]
    pub const fn reassembler(&self) -> &Reassembler { &self.reassembler }

    /// Forget the framing state of a closed stream connection.
    ///
    /// Returns `true` if the connection had state. Partial messages it left in
    /// the reassembly table are not touched; they expire on their own.
    pub fn close_connection(&self, id: ConnectionId) -> bool {
        let closed = self.streams.remove(&id).is_some();
        if closed {
            tracing::debug!(connection = %id, "stream cursor dropped");
        }
        closed
    }

    /// Number of stream connections with framing state.
    #[must_use]
    pub fn open_streams(&self) -> usize { self.streams.len() }

    /// Cursor state of a stream connection, if it has one.
    #[must_use]
    pub fn stream_state(&self, id: ConnectionId) -> Option<CursorState> {
        let cursor = Arc::clone(self.streams.get(&id)?.value());
        let state = lock(&cursor).framer.state();
        Some(state)
    }

    /// Evict expired partial messages.
    pub fn sweep(&self) -> Vec<MessageIdentity> { self.reassembler.purge_expired() }

    /// Evict partial messages expired at `now`.
    pub fn sweep_at(&self, now: Instant) -> Vec<MessageIdentity> {
        self.reassembler.purge_expired_at(now)
    }

    fn cursor(&self, id: ConnectionId) -> Arc<Mutex<StreamCursor>> {
        let framer = self.config.framer();
        Arc::clone(
            self.streams
                .entry(id)
                .or_insert_with(|| {
                    Arc::new(Mutex::new(StreamCursor {
                        framer: StreamFramer::new(framer),
                        buffer: BytesMut::new(),
                    }))
                })
                .value(),
        )
    }
}

impl Default for Pipeline {
    fn default() -> Self { Self::new(PipelineConfig::default()) }
}

fn lock(cursor: &Mutex<StreamCursor>) -> MutexGuard<'_, StreamCursor> {
    cursor.lock().unwrap_or_else(PoisonError::into_inner)
}
