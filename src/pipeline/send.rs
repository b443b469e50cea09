//! Outbound path: protection, segmentation and framing.

use bytes::Bytes;
use thiserror::Error;
use tracing::trace;

use super::{Destination, Pipeline};
use crate::{
    codec::stream_unit,
    e2e::{self, E2eConfig, E2eError, ProtectionCounter},
    fragment::FragmentationError,
    message::{HeaderError, Message, MethodId, ServiceId},
    metrics::{self, Direction},
    session::Transport,
};

/// Errors raised by [`Pipeline::prepare_send`].
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum SendError {
    /// The element is protected but no counter was supplied.
    #[error("element {service}.{element} is protected and needs a counter")]
    MissingCounter { service: ServiceId, element: MethodId },
    /// The payload cannot carry the element's protection fields.
    #[error("cannot protect element {service}.{element}: {source}")]
    Protection {
        service: ServiceId,
        element: MethodId,
        source: E2eError,
    },
    /// The message could not be split into segments.
    #[error(transparent)]
    Fragmentation(#[from] FragmentationError),
    /// The protected message no longer fits the length field.
    #[error(transparent)]
    Header(#[from] HeaderError),
}

impl Pipeline {
    /// Turn `message` into ready-to-send buffers for `destination`.
    ///
    /// When the element has a protection binding, `counter` supplies the
    /// value embedded in the payload and is advanced once the message has
    /// been protected. Datagram destinations split payloads longer than one
    /// segment; stream destinations receive one buffer, optionally preceded by
    /// a magic cookie.
    ///
    /// # Errors
    ///
    /// Returns [`SendError`] if protection or segmentation fails. The counter
    /// is left unchanged on error.
    pub fn prepare_send(
        &self,
        message: Message,
        destination: Destination,
        counter: Option<&mut ProtectionCounter>,
    ) -> Result<Vec<Bytes>, SendError> {
        let message = self.protect(message, counter)?;
        let units = match destination.transport() {
            Transport::Datagram => self
                .fragmenter
                .segment(&message)?
                .iter()
                .map(Message::to_bytes)
                .collect::<Vec<_>>(),
            Transport::Stream => vec![stream_unit(&message, destination.cookie())],
        };
        trace!(
            service = %message.header().service,
            method = %message.header().method,
            units = units.len(),
            transport = %destination.transport(),
            "message prepared for sending"
        );
        metrics::inc_units(Direction::Outbound, u64::try_from(units.len()).unwrap_or(u64::MAX));
        Ok(units)
    }

    fn protect(
        &self,
        message: Message,
        counter: Option<&mut ProtectionCounter>,
    ) -> Result<Message, SendError> {
        let header = *message.header();
        let (service, element) = (header.service, header.method);
        let Some(config) = self.registry.get(service, element) else {
            return Ok(message);
        };
        if *config == E2eConfig::Unknown {
            return Ok(message);
        }
        let Some(counter) = counter else {
            return Err(SendError::MissingCounter { service, element });
        };
        let (header, payload) = message.into_parts();
        let payload = e2e::protect(&config, &header, payload, counter.current()).map_err(|source| {
            SendError::Protection {
                service,
                element,
                source,
            }
        })?;
        let protected = Message::new(header, payload)?;
        counter.advance();
        Ok(protected)
    }
}
