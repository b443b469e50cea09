//! The CRC-8 protection profile (AUTOSAR profile 1 layout).
//!
//! Layout with the default offsets: byte `crc_offset` holds the CRC, the low
//! nibble of byte 1 holds the 4-bit counter and, in [`DataIdMode::Nibble`],
//! the high nibble of byte 1 carries the low nibble of the data-ID high byte.
//! The data-ID is never transmitted in full; it seeds the CRC instead.

use serde::{Deserialize, Serialize};

use super::{CheckOutcome, E2eError};
use crate::{byte_order::encode_u16, crc::crc8_update};

/// Counter values cycle through `0..COUNTER_MODULUS`.
pub const COUNTER_MODULUS: u8 = 15;

/// How the 16-bit data-ID is mixed into the CRC.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataIdMode {
    /// Low byte then high byte seed the CRC.
    Both,
    /// Low byte for even counters, high byte for odd counters.
    Alternating,
    /// Only the low byte seeds the CRC.
    Low,
    /// Low byte seeds the CRC; the low nibble of the high byte is transmitted.
    #[default]
    Nibble,
}

impl TryFrom<u8> for DataIdMode {
    type Error = E2eError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Both),
            1 => Ok(Self::Alternating),
            2 => Ok(Self::Low),
            3 => Ok(Self::Nibble),
            _ => Err(E2eError::InvalidConfig {
                reason: "data-ID mode must be 0..=3",
            }),
        }
    }
}

const fn default_counter_offset() -> usize { 8 }

const fn default_data_id_nibble_offset() -> usize { 12 }

/// Configuration of one CRC-8 protected element.
///
/// Offsets named `*_offset` without a unit suffix follow the AUTOSAR
/// convention: `crc_offset` counts bytes, the others count bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Crc8Config {
    /// Byte position of the CRC.
    pub crc_offset: usize,
    pub data_id: u16,
    #[serde(default)]
    pub data_id_mode: DataIdMode,
    /// Protected data length in bits.
    pub data_length: usize,
    /// Bit position of the 4-bit counter.
    #[serde(default = "default_counter_offset")]
    pub counter_offset: usize,
    /// Bit position of the transmitted data-ID nibble.
    #[serde(default = "default_data_id_nibble_offset")]
    pub data_id_nibble_offset: usize,
}

impl Crc8Config {
    /// Configuration with the default counter and nibble offsets.
    #[must_use]
    pub const fn new(crc_offset: usize, data_id: u16, data_id_mode: DataIdMode, data_length: usize) -> Self {
        Self {
            crc_offset,
            data_id,
            data_id_mode,
            data_length,
            counter_offset: default_counter_offset(),
            data_id_nibble_offset: default_data_id_nibble_offset(),
        }
    }

    /// Smallest payload this configuration can protect.
    #[must_use]
    pub fn min_len(&self) -> usize {
        let mut required = (self.data_length / 8 + 1)
            .max(self.crc_offset + 1)
            .max(self.counter_offset / 8 + 1);
        if self.data_id_mode == DataIdMode::Nibble {
            required = required.max(self.data_id_nibble_offset / 8 + 1);
        }
        required
    }

    /// Reject layouts whose fields collide.
    ///
    /// # Errors
    ///
    /// Returns [`E2eError::InvalidConfig`] when the counter or data-ID nibble
    /// overlaps the CRC byte or each other.
    pub fn validate(&self) -> Result<(), E2eError> {
        if self.counter_offset % 4 != 0 || self.data_id_nibble_offset % 4 != 0 {
            return Err(E2eError::InvalidConfig {
                reason: "nibble offsets must be multiples of 4 bits",
            });
        }
        if self.counter_offset / 8 == self.crc_offset {
            return Err(E2eError::InvalidConfig {
                reason: "counter overlaps the CRC byte",
            });
        }
        if self.data_id_mode == DataIdMode::Nibble
            && (self.data_id_nibble_offset / 8 == self.crc_offset
                || self.data_id_nibble_offset == self.counter_offset)
        {
            return Err(E2eError::InvalidConfig {
                reason: "data-ID nibble overlaps another field",
            });
        }
        Ok(())
    }

    fn data_id_nibble(&self) -> u8 { encode_u16(self.data_id)[0] & 0x0F }

    fn crc(&self, payload: &[u8], counter: u8) -> u8 {
        let [high, low] = encode_u16(self.data_id);
        let seeded = match self.data_id_mode {
            DataIdMode::Both => crc8_update(crc8_update(0xFF, &[low]), &[high]),
            DataIdMode::Alternating if counter % 2 == 0 => crc8_update(0xFF, &[low]),
            DataIdMode::Alternating => crc8_update(0xFF, &[high]),
            DataIdMode::Low => crc8_update(0xFF, &[low]),
            DataIdMode::Nibble => crc8_update(crc8_update(0xFF, &[low]), &[0x00]),
        };
        let mut crc = seeded;
        if self.crc_offset >= 1 {
            crc = crc8_update(crc, &payload[..self.crc_offset]);
        }
        if self.crc_offset + 1 < self.data_length / 8 {
            crc = crc8_update(crc, &payload[self.crc_offset + 1..]);
        }
        crc ^ 0xFF
    }
}

fn write_nibble(payload: &mut [u8], bit_offset: usize, value: u8) {
    let byte = &mut payload[bit_offset / 8];
    *byte = if bit_offset % 8 == 0 {
        (*byte & 0xF0) | (value & 0x0F)
    } else {
        (*byte & 0x0F) | ((value & 0x0F) << 4)
    };
}

fn read_nibble(payload: &[u8], bit_offset: usize) -> u8 {
    let byte = payload[bit_offset / 8];
    if bit_offset % 8 == 0 { byte & 0x0F } else { byte >> 4 }
}

/// Protect `payload` in place.
pub(super) fn protect(config: &Crc8Config, payload: &mut [u8], counter: u16) -> Result<(), E2eError> {
    let required = config.min_len();
    if payload.len() < required {
        return Err(E2eError::TooShort {
            required,
            actual: payload.len(),
        });
    }
    let counter = reduce(counter);
    write_nibble(payload, config.counter_offset, counter);
    if config.data_id_mode == DataIdMode::Nibble {
        write_nibble(payload, config.data_id_nibble_offset, config.data_id_nibble());
    }
    payload[config.crc_offset] = config.crc(payload, counter);
    Ok(())
}

/// Verify `payload`.
pub(super) fn check(config: &Crc8Config, payload: &[u8]) -> CheckOutcome {
    if payload.len() < config.min_len() {
        return CheckOutcome::TooShort;
    }
    let counter = read_nibble(payload, config.counter_offset);
    if config.crc(payload, counter) == payload[config.crc_offset] {
        CheckOutcome::Valid {
            counter: Some(u16::from(counter)),
        }
    } else {
        CheckOutcome::WrongCrc {
            counter: Some(u16::from(counter)),
        }
    }
}

fn reduce(counter: u16) -> u8 {
    let [_, low] = encode_u16(counter % u16::from(COUNTER_MODULUS));
    low
}
