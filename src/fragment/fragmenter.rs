//! Outbound helper that splits oversized messages into TP segments.
//!
//! [`Fragmenter`] cuts a message payload into chunks of exactly the configured
//! segment length (the last chunk may be shorter). Each segment is a complete
//! SOME/IP message: the original header with the TP flag set and the length
//! rewritten, followed by the TP sub-header and the chunk.

use super::{FragmentationError, TpConfig, TpHeader};
use crate::message::Message;

/// Splits messages into segment-sized messages.
#[derive(Clone, Copy, Debug, Default)]
pub struct Fragmenter {
    config: TpConfig,
}

impl Fragmenter {
    /// Create a fragmenter using the segment length from `config`.
    #[must_use]
    pub const fn new(config: TpConfig) -> Self { Self { config } }

    /// Return the configuration.
    #[must_use]
    pub const fn config(&self) -> &TpConfig { &self.config }

    /// Report whether `message` is too large to travel unsegmented.
    #[must_use]
    pub fn needs_segmentation(&self, message: &Message) -> bool {
        message.payload().len() > self.config.segment_len().get()
    }

    /// Split `message` into TP segments.
    ///
    /// Messages that fit a single segment are returned unchanged as a batch
    /// of one.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentationError::OffsetOverflow`] if a segment offset does
    /// not fit in the TP sub-header.
    pub fn segment(&self, message: &Message) -> Result<Vec<Message>, FragmentationError> {
        if !self.needs_segmentation(message) {
            return Ok(vec![message.clone()]);
        }

        let segment_len = self.config.segment_len().get();
        let payload = message.payload();
        let mut header = *message.header();
        header.message_type = header.message_type.with_tp(true);

        let mut segments = Vec::with_capacity(payload.len().div_ceil(segment_len));
        for (index, chunk) in payload.chunks(segment_len).enumerate() {
            let offset = index * segment_len;
            let more = offset + chunk.len() < payload.len();
            let tp = TpHeader::from_byte_offset(offset, more)
                .ok_or(FragmentationError::OffsetOverflow { offset })?;
            segments.push(Message::new(header, tp.prepend(chunk))?);
        }
        Ok(segments)
    }
}
