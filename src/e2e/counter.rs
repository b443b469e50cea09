//! Sender-owned rolling counters for protected elements.

use super::{E2eConfig, crc8};

/// Rolling counter owned by whoever originates messages for one element.
///
/// The counter wraps at the width of the profile it was created for: 15 values
/// for the CRC-8 profile, 256 for the CRC-32 profile and 65 536 for profile 4.
///
/// # Examples
///
/// ```
/// use someip_wire::e2e::{Crc8Config, DataIdMode, E2eConfig, ProtectionCounter};
///
/// let config = E2eConfig::Crc8(Crc8Config::new(0, 0xA73, DataIdMode::Nibble, 56));
/// let mut counter = ProtectionCounter::for_config(&config);
/// let values: Vec<u16> = (0..16).map(|_| counter.advance()).collect();
/// assert_eq!(values[14], 14);
/// assert_eq!(values[15], 0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProtectionCounter {
    value: u16,
    modulus: u32,
}

impl ProtectionCounter {
    /// Start a counter at zero with the wrap-around of `config`'s profile.
    #[must_use]
    pub fn for_config(config: &E2eConfig) -> Self {
        let modulus = match config {
            E2eConfig::Crc8(_) => u32::from(crc8::COUNTER_MODULUS),
            E2eConfig::Crc32(_) | E2eConfig::Unknown => 256,
            E2eConfig::P04(_) => 1 << 16,
        };
        Self { value: 0, modulus }
    }

    /// Start at `value` instead of zero, reduced into range.
    #[must_use]
    pub fn starting_at(mut self, value: u16) -> Self {
        self.value = reduce(u32::from(value), self.modulus);
        self
    }

    /// Value that the next protected message will carry.
    #[must_use]
    pub const fn current(&self) -> u16 { self.value }

    /// Return the current value and step to the next one.
    pub fn advance(&mut self) -> u16 {
        let current = self.value;
        self.value = reduce(u32::from(current) + 1, self.modulus);
        current
    }
}

fn reduce(value: u32, modulus: u32) -> u16 { u16::try_from(value % modulus).unwrap_or(0) }
