//! Inbound table that stitches TP segments back into complete messages.
//!
//! [`Reassembler`] keys partial messages by [`MessageIdentity`] in a sharded
//! concurrent map. Each entry sits behind its own mutex, so segments for
//! unrelated identities never wait on one another while segments for the same
//! identity are applied one at a time. Segments may arrive in any order;
//! duplicates are ignored and overlapping bytes keep the value received
//! first. Entries that stop receiving segments are discarded by
//! [`Reassembler::purge_expired_at`].

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError},
    time::Instant,
};

use dashmap::DashMap;
use tracing::{debug, trace};

use super::{FragmentError, MessageIdentity, TpConfig, TpHeader, ranges::RangeSet};
use crate::message::{Header, Message};

/// Lifecycle of a reassembly entry.
///
/// An entry leaves `Collecting` exactly once, under its own lock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EntryState {
    Collecting,
    Complete,
    Discarded,
}

#[derive(Debug)]
struct PartialMessage {
    state: EntryState,
    header: Header,
    buffer: Vec<u8>,
    received: RangeSet,
    total: Option<usize>,
    created: Instant,
    last_activity: Instant,
}

impl PartialMessage {
    fn new(header: Header, now: Instant) -> Self {
        Self {
            state: EntryState::Collecting,
            header,
            buffer: Vec::new(),
            received: RangeSet::default(),
            total: None,
            created: now,
            last_activity: now,
        }
    }

    /// Apply one validated segment, returning `false` for a pure duplicate.
    fn apply(&mut self, segment: &Segment<'_>, now: Instant) -> Result<bool, FragmentError> {
        let end = segment.end();
        match self.total {
            Some(known) if !segment.more && known != end => {
                return Err(FragmentError::TotalConflict {
                    known,
                    claimed: end,
                });
            }
            Some(total) if end > total => return Err(FragmentError::BeyondTotal { end, total }),
            None if !segment.more && self.received.end() > end => {
                return Err(FragmentError::BeyondTotal {
                    end: self.received.end(),
                    total: end,
                });
            }
            _ => {}
        }

        let learns_total = !segment.more && self.total.is_none();
        let gaps = self.received.gaps(segment.offset..end);
        if gaps.is_empty() && !learns_total {
            return Ok(false);
        }

        if self.buffer.len() < end {
            self.buffer.resize(end, 0);
        }
        for gap in gaps {
            let src = &segment.chunk[gap.start - segment.offset..gap.end - segment.offset];
            self.buffer[gap].copy_from_slice(src);
        }
        self.received.insert(segment.offset..end);
        if learns_total {
            self.total = Some(end);
        }
        self.header.return_code = segment.header.return_code;
        self.last_activity = now;
        Ok(true)
    }

    fn is_complete(&self) -> bool {
        self.total.is_some_and(|total| self.received.covers_prefix(total))
    }

    fn take_message(&mut self) -> Result<Message, FragmentError> {
        let total = self.total.unwrap_or(self.buffer.len());
        let mut payload = std::mem::take(&mut self.buffer);
        payload.truncate(total);
        let mut header = self.header;
        header.message_type = header.message_type.with_tp(false);
        Ok(Message::new(header, payload)?)
    }
}

/// A segment split into its parts, validated against the configuration.
struct Segment<'a> {
    header: &'a Header,
    offset: usize,
    more: bool,
    chunk: &'a [u8],
}

impl Segment<'_> {
    fn end(&self) -> usize { self.offset + self.chunk.len() }
}

/// Result of feeding one segment into the [`Reassembler`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReassemblyStatus {
    /// The segment was stored; more are needed.
    Incomplete,
    /// Every byte of the segment was already held; nothing changed.
    Duplicate,
    /// The segment completed the message, which has left the table.
    Complete(Message),
}

/// Concurrent reassembly table with timeout-based eviction.
#[derive(Debug)]
pub struct Reassembler {
    config: TpConfig,
    entries: DashMap<MessageIdentity, Arc<Mutex<PartialMessage>>>,
}

fn lock(entry: &Mutex<PartialMessage>) -> MutexGuard<'_, PartialMessage> {
    entry.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Reassembler {
    /// Create an empty table governed by `config`.
    #[must_use]
    pub fn new(config: TpConfig) -> Self {
        Self {
            config,
            entries: DashMap::new(),
        }
    }

    /// Return the configuration.
    #[must_use]
    pub const fn config(&self) -> &TpConfig { &self.config }

    /// Process a segment using the current time.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentError`] when the segment is malformed or conflicts
    /// with segments already held for the same identity. The segment is
    /// dropped; the entry is left untouched.
    pub fn push(
        &self,
        identity: MessageIdentity,
        segment: &Message,
    ) -> Result<ReassemblyStatus, FragmentError> {
        self.push_at(identity, segment, crate::clock::now())
    }

    /// Process a segment using an explicit clock reading.
    ///
    /// # Errors
    ///
    /// See [`Reassembler::push`].
    pub fn push_at(
        &self,
        identity: MessageIdentity,
        segment: &Message,
        now: Instant,
    ) -> Result<ReassemblyStatus, FragmentError> {
        let segment = self.validate(segment)?;

        loop {
            let slot = Arc::clone(
                self.entries
                    .entry(identity)
                    .or_insert_with(|| Arc::new(Mutex::new(PartialMessage::new(*segment.header, now))))
                    .value(),
            );
            let mut entry = lock(&slot);
            if entry.state != EntryState::Collecting {
                // Lost a race with completion or eviction; clear the stale slot
                // and start a fresh entry.
                drop(entry);
                self.entries.remove_if(&identity, |_, held| Arc::ptr_eq(held, &slot));
                continue;
            }

            if !entry.apply(&segment, now)? {
                trace!(%identity, offset = segment.offset, "duplicate segment ignored");
                return Ok(ReassemblyStatus::Duplicate);
            }
            if !entry.is_complete() {
                return Ok(ReassemblyStatus::Incomplete);
            }

            entry.state = EntryState::Complete;
            let message = entry.take_message();
            drop(entry);
            self.entries.remove_if(&identity, |_, held| Arc::ptr_eq(held, &slot));
            let message = message?;
            debug!(%identity, len = message.payload().len(), "segmented message reassembled");
            crate::metrics::inc_reassembled();
            return Ok(ReassemblyStatus::Complete(message));
        }
    }

    fn validate<'a>(&self, message: &'a Message) -> Result<Segment<'a>, FragmentError> {
        let header = message.header();
        if !header.message_type.is_tp() {
            return Err(FragmentError::NotSegmented);
        }
        let (tp, chunk) = TpHeader::split(message.payload())?;
        let segment_len = self.config.segment_len().get();
        if tp.more() && chunk.len() != segment_len {
            return Err(FragmentError::NonFinalLength {
                expected: segment_len,
                actual: chunk.len(),
            });
        }
        if chunk.len() > segment_len {
            return Err(FragmentError::ChunkTooLong {
                max: segment_len,
                actual: chunk.len(),
            });
        }
        let segment = Segment {
            header,
            offset: tp.offset_bytes(),
            more: tp.more(),
            chunk,
        };
        let max = self.config.max_message_size().get();
        if segment.end() > max {
            return Err(FragmentError::MessageTooLarge {
                end: segment.end(),
                max,
            });
        }
        Ok(segment)
    }

    /// Drop the partial message for `identity`, if any.
    ///
    /// Returns `true` when an entry was discarded.
    pub fn reset(&self, identity: &MessageIdentity) -> bool {
        let Some((_, slot)) = self.entries.remove(identity) else {
            return false;
        };
        let mut entry = lock(&slot);
        if entry.state == EntryState::Collecting {
            entry.state = EntryState::Discarded;
            true
        } else {
            false
        }
    }

    /// Remove partial messages that exceeded the configured timeout.
    ///
    /// Returns the identities of messages that were evicted.
    pub fn purge_expired(&self) -> Vec<MessageIdentity> {
        self.purge_expired_at(crate::clock::now())
    }

    /// Remove partial messages that exceeded the configured timeout using an
    /// explicit clock reading.
    ///
    /// Entries whose lock is held by a concurrent segment are treated as active
    /// and revisited on the next sweep.
    pub fn purge_expired_at(&self, now: Instant) -> Vec<MessageIdentity> {
        let timeout = self.config.reassembly_timeout();
        let mut evicted = Vec::new();
        let mut ages = Vec::new();

        self.entries.retain(|identity, slot| {
            let mut entry = match slot.try_lock() {
                Ok(entry) => entry,
                Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
                Err(TryLockError::WouldBlock) => return true,
            };
            match entry.state {
                EntryState::Collecting
                    if now.saturating_duration_since(entry.last_activity) >= timeout =>
                {
                    entry.state = EntryState::Discarded;
                    evicted.push(*identity);
                    ages.push(now.saturating_duration_since(entry.created));
                    false
                }
                EntryState::Collecting => true,
                EntryState::Complete | EntryState::Discarded => false,
            }
        });

        for (identity, age) in evicted.iter().zip(ages) {
            debug!(%identity, ?age, "partial message evicted after timeout");
            crate::metrics::inc_evicted();
        }
        evicted
    }

    /// Number of partial messages currently buffered.
    #[must_use]
    pub fn buffered_len(&self) -> usize { self.entries.len() }

    /// Number of payload bytes held for `identity`, if it has an entry.
    #[must_use]
    pub fn buffered_bytes(&self, identity: &MessageIdentity) -> Option<usize> {
        let slot = Arc::clone(self.entries.get(identity)?.value());
        let entry = lock(&slot);
        Some(entry.received.covered())
    }

    /// Arrival time of the first segment held for `identity`, if it has an
    /// entry. Later segments do not move it.
    #[must_use]
    pub fn buffered_since(&self, identity: &MessageIdentity) -> Option<Instant> {
        let slot = Arc::clone(self.entries.get(identity)?.value());
        let entry = lock(&slot);
        Some(entry.created)
    }
}

impl Default for Reassembler {
    fn default() -> Self { Self::new(TpConfig::default()) }
}
