//! The CRC-32 protection profile.
//!
//! Four big-endian CRC bytes at `crc_offset` cover every other payload byte.
//! An optional 8-bit counter may be placed anywhere outside the CRC field; it
//! carries the low byte of the sender's counter.

use serde::{Deserialize, Serialize};

use super::{CheckOutcome, E2eError};
use crate::{
    byte_order::{encode_u16, encode_u32, u32_at},
    crc::crc32_update,
};

/// Width of the CRC field in bytes.
pub const CRC_LEN: usize = 4;

/// Configuration of one CRC-32 protected element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Crc32Config {
    /// Byte position of the first CRC byte.
    pub crc_offset: usize,
    /// Byte position of the rolling counter, if the element carries one.
    #[serde(default)]
    pub counter_offset: Option<usize>,
}

impl Crc32Config {
    /// Configuration without a counter.
    #[must_use]
    pub const fn new(crc_offset: usize) -> Self {
        Self {
            crc_offset,
            counter_offset: None,
        }
    }

    /// Place an 8-bit counter at `offset`.
    #[must_use]
    pub const fn with_counter_at(mut self, offset: usize) -> Self {
        self.counter_offset = Some(offset);
        self
    }

    /// Smallest payload this configuration can protect.
    #[must_use]
    pub fn min_len(&self) -> usize {
        let crc_end = self.crc_offset + CRC_LEN;
        self.counter_offset
            .map_or(crc_end, |counter| crc_end.max(counter + 1))
    }

    /// Reject layouts whose fields collide.
    ///
    /// # Errors
    ///
    /// Returns [`E2eError::InvalidConfig`] when the counter byte lies inside
    /// the CRC field.
    pub fn validate(&self) -> Result<(), E2eError> {
        match self.counter_offset {
            Some(counter) if (self.crc_offset..self.crc_offset + CRC_LEN).contains(&counter) => {
                Err(E2eError::InvalidConfig {
                    reason: "counter overlaps the CRC field",
                })
            }
            _ => Ok(()),
        }
    }

    fn crc(&self, payload: &[u8]) -> u32 {
        let before = crc32_update(0, &payload[..self.crc_offset]);
        crc32_update(before, &payload[self.crc_offset + CRC_LEN..])
    }
}

/// Protect `payload` in place.
pub(super) fn protect(config: &Crc32Config, payload: &mut [u8], counter: u16) -> Result<(), E2eError> {
    let required = config.min_len();
    if payload.len() < required {
        return Err(E2eError::TooShort {
            required,
            actual: payload.len(),
        });
    }
    if let Some(offset) = config.counter_offset {
        let [_, low] = encode_u16(counter);
        payload[offset] = low;
    }
    let crc = encode_u32(config.crc(payload));
    payload[config.crc_offset..config.crc_offset + CRC_LEN].copy_from_slice(&crc);
    Ok(())
}

/// Verify `payload`.
pub(super) fn check(config: &Crc32Config, payload: &[u8]) -> CheckOutcome {
    if payload.len() < config.min_len() {
        return CheckOutcome::TooShort;
    }
    let counter = config.counter_offset.map(|offset| u16::from(payload[offset]));
    match u32_at(payload, config.crc_offset) {
        Some(embedded) if embedded == config.crc(payload) => CheckOutcome::Valid { counter },
        _ => CheckOutcome::WrongCrc { counter },
    }
}
