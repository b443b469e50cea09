//! The profile 4 protection layout.
//!
//! The protected area starts at the client ID of the SOME/IP header, so the
//! CRC also covers client, session, protocol and interface versions, message
//! type and return code. A 12-byte E2E header sits `offset` bits into that
//! area:
//!
//! | bytes  | field                                       |
//! |--------|---------------------------------------------|
//! | 0..2   | length of the protected area                |
//! | 2..4   | 16-bit counter                              |
//! | 4..8   | data-ID, instance in the most significant byte |
//! | 8..12  | CRC-32P4 over every other byte of the area  |

use serde::{Deserialize, Serialize};

use super::{CheckOutcome, E2eError};
use crate::{
    byte_order::{encode_u16, encode_u32, u16_at, u32_at},
    crc::{crc32p4, crc32p4_update},
    message::Header,
};

/// Width of the E2E header in bytes.
pub const E2E_HEADER_LEN: usize = 12;

/// Header bytes that belong to the protected area.
const UPPER_LEN: usize = 8;

const fn default_offset() -> usize { UPPER_LEN * 8 }

const fn default_max_data_length() -> usize { 4096 }

const fn default_max_delta_counter() -> u16 { 1 }

/// Configuration of one profile 4 protected element.
///
/// `offset` counts bits from the client ID; the data lengths count bytes of
/// the whole protected area.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct P04Config {
    /// Bit position of the E2E header within the protected area.
    #[serde(default = "default_offset")]
    pub offset: usize,
    /// Full data-ID; the most significant byte carries the instance.
    pub data_id: u32,
    #[serde(default)]
    pub min_data_length: usize,
    #[serde(default = "default_max_data_length")]
    pub max_data_length: usize,
    /// Largest counter step a receiver accepts between two messages.
    #[serde(default = "default_max_delta_counter")]
    pub max_delta_counter: u16,
}

impl P04Config {
    /// Configuration with the E2E header at the start of the payload.
    #[must_use]
    pub const fn new(data_id: u32) -> Self {
        Self {
            offset: default_offset(),
            data_id,
            min_data_length: 0,
            max_data_length: default_max_data_length(),
            max_delta_counter: default_max_delta_counter(),
        }
    }

    /// Smallest payload this configuration can protect.
    #[must_use]
    pub fn min_len(&self) -> usize {
        (self.payload_offset() + E2E_HEADER_LEN).max(self.min_data_length.saturating_sub(UPPER_LEN))
    }

    /// Largest payload this configuration can protect.
    #[must_use]
    pub const fn max_len(&self) -> usize { self.max_data_length.saturating_sub(UPPER_LEN) }

    /// Reject layouts the 16-bit length field or the payload cannot hold.
    ///
    /// # Errors
    ///
    /// Returns [`E2eError::InvalidConfig`] naming the first problem found.
    pub fn validate(&self) -> Result<(), E2eError> {
        let reason = if self.offset % 8 != 0 {
            "E2E header offset must be a whole number of bytes"
        } else if self.offset < default_offset() {
            "E2E header must start inside the payload"
        } else if self.max_data_length > usize::from(u16::MAX) {
            "maximum data length must fit the 16-bit length field"
        } else if self.min_data_length > self.max_data_length {
            "minimum data length exceeds the maximum"
        } else if self.offset / 8 + E2E_HEADER_LEN > self.max_data_length {
            "E2E header does not fit the maximum data length"
        } else if self.max_delta_counter == 0 {
            "maximum counter delta must be at least 1"
        } else {
            return Ok(());
        };
        Err(E2eError::InvalidConfig { reason })
    }

    const fn payload_offset(&self) -> usize { (self.offset / 8).saturating_sub(UPPER_LEN) }

    fn crc(&self, upper: &[u8; UPPER_LEN], payload: &[u8]) -> u32 {
        let at = self.payload_offset();
        let crc = crc32p4_update(crc32p4(upper), &payload[..at + 8]);
        crc32p4_update(crc, &payload[at + E2E_HEADER_LEN..])
    }
}

fn upper(header: &Header) -> [u8; UPPER_LEN] {
    let [_, _, _, _, _, _, _, _, upper @ ..] = header.to_bytes();
    upper
}

/// Protect `payload` in place for a message carrying `header`.
pub(super) fn protect(
    config: &P04Config,
    header: &Header,
    payload: &mut [u8],
    counter: u16,
) -> Result<(), E2eError> {
    let required = config.min_len();
    if payload.len() < required {
        return Err(E2eError::TooShort {
            required,
            actual: payload.len(),
        });
    }
    let too_long = E2eError::TooLong {
        limit: config.max_len(),
        actual: payload.len(),
    };
    if payload.len() > config.max_len() {
        return Err(too_long);
    }
    let length = u16::try_from(payload.len() + UPPER_LEN).map_err(|_| too_long)?;
    let at = config.payload_offset();
    payload[at..at + 2].copy_from_slice(&encode_u16(length));
    payload[at + 2..at + 4].copy_from_slice(&encode_u16(counter));
    payload[at + 4..at + 8].copy_from_slice(&encode_u32(config.data_id));
    let crc = encode_u32(config.crc(&upper(header), payload));
    payload[at + 8..at + E2E_HEADER_LEN].copy_from_slice(&crc);
    Ok(())
}

/// Verify `payload` received with `header`.
///
/// Counter continuity is judged by the caller, which owns the receive state.
pub(super) fn check(config: &P04Config, header: &Header, payload: &[u8]) -> CheckOutcome {
    if payload.len() < config.min_len() {
        return CheckOutcome::TooShort;
    }
    if payload.len() > config.max_len() {
        return CheckOutcome::TooLong;
    }
    let at = config.payload_offset();
    let (Some(length), Some(counter), Some(data_id), Some(embedded)) = (
        u16_at(payload, at),
        u16_at(payload, at + 2),
        u32_at(payload, at + 4),
        u32_at(payload, at + 8),
    ) else {
        return CheckOutcome::TooShort;
    };
    if embedded != config.crc(&upper(header), payload) {
        return CheckOutcome::WrongCrc {
            counter: Some(counter),
        };
    }
    if usize::from(length) != payload.len() + UPPER_LEN || data_id != config.data_id {
        return CheckOutcome::Mismatch { counter };
    }
    CheckOutcome::Valid {
        counter: Some(counter),
    }
}
