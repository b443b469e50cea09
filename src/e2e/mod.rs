//! End-to-end payload protection.
//!
//! A protected payload embeds a CRC (and, depending on the profile, a rolling
//! counter and part of a data identifier) at configured offsets. Every profile
//! is one variant of [`E2eConfig`] and is handled by the single
//! [`protect`]/[`check`] pair. Both functions are pure: the caller owns the
//! counter and decides what to do with a failed check. Receive-side counter
//! continuity lives in [`E2eRegistry::verify`].

pub mod counter;
pub mod crc32;
pub mod crc8;
pub mod p04;
pub mod registry;

use std::{fmt, str::FromStr};

use bytes::Bytes;
pub use counter::ProtectionCounter;
pub use crc8::{Crc8Config, DataIdMode};
pub use crc32::Crc32Config;
pub use p04::P04Config;
pub use registry::{E2eRegistry, RegistryError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::message::Header;

/// Errors raised by protection or configuration validation.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum E2eError {
    /// The payload is shorter than the profile's footprint.
    #[error("payload of {actual} bytes is shorter than the {required}-byte protection footprint")]
    TooShort { required: usize, actual: usize },
    /// The payload exceeds the profile's maximum data length.
    #[error("payload of {actual} bytes exceeds the {limit}-byte protection limit")]
    TooLong { limit: usize, actual: usize },
    /// The configured layout is unusable.
    #[error("invalid protection config: {reason}")]
    InvalidConfig { reason: &'static str },
}

/// Profile family named in configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProfileKind {
    Crc8,
    Crc32,
    P04,
    /// A profile this layer does not implement; payloads pass through.
    Unknown,
}

impl FromStr for ProfileKind {
    type Err = std::convert::Infallible;

    /// Parse a profile name. Unrecognised names yield [`ProfileKind::Unknown`].
    ///
    /// ```
    /// use someip_wire::e2e::ProfileKind;
    /// assert_eq!("CRC8".parse::<ProfileKind>(), Ok(ProfileKind::Crc8));
    /// assert_eq!("p04".parse::<ProfileKind>(), Ok(ProfileKind::P04));
    /// assert_eq!("P07".parse::<ProfileKind>(), Ok(ProfileKind::Unknown));
    /// ```
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Ok(match name.to_ascii_uppercase().as_str() {
            "CRC8" | "P01" => Self::Crc8,
            "CRC32" => Self::Crc32,
            "P04" => Self::P04,
            _ => Self::Unknown,
        })
    }
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Crc8 => "CRC8",
            Self::Crc32 => "CRC32",
            Self::P04 => "P04",
            Self::Unknown => "unknown",
        })
    }
}

/// Protection settings for one element.
///
/// Deserialises from a table tagged with `profile`; unrecognised profile
/// names become [`E2eConfig::Unknown`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "profile")]
pub enum E2eConfig {
    #[serde(rename = "CRC8", alias = "P01")]
    Crc8(Crc8Config),
    #[serde(rename = "CRC32")]
    Crc32(Crc32Config),
    P04(P04Config),
    #[serde(other)]
    Unknown,
}

impl E2eConfig {
    /// Return the profile family.
    #[must_use]
    pub const fn kind(&self) -> ProfileKind {
        match self {
            Self::Crc8(_) => ProfileKind::Crc8,
            Self::Crc32(_) => ProfileKind::Crc32,
            Self::P04(_) => ProfileKind::P04,
            Self::Unknown => ProfileKind::Unknown,
        }
    }

    /// Smallest payload the profile can protect; zero for unknown profiles.
    #[must_use]
    pub fn min_len(&self) -> usize {
        match self {
            Self::Crc8(config) => config.min_len(),
            Self::Crc32(config) => config.min_len(),
            Self::P04(config) => config.min_len(),
            Self::Unknown => 0,
        }
    }

    /// Reject layouts whose fields collide.
    ///
    /// # Errors
    ///
    /// Returns [`E2eError::InvalidConfig`] describing the collision.
    pub fn validate(&self) -> Result<(), E2eError> {
        match self {
            Self::Crc8(config) => config.validate(),
            Self::Crc32(config) => config.validate(),
            Self::P04(config) => config.validate(),
            Self::Unknown => Ok(()),
        }
    }
}

/// Result of verifying a payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CheckOutcome {
    /// No profile applied; the payload was not inspected.
    NotChecked,
    /// The embedded CRC matches.
    Valid { counter: Option<u16> },
    /// The embedded CRC does not match.
    WrongCrc { counter: Option<u16> },
    /// The payload is shorter than the profile's footprint.
    TooShort,
    /// The payload exceeds the profile's maximum data length.
    TooLong,
    /// The CRC matches but the embedded length or data-ID does not.
    Mismatch { counter: u16 },
    /// The counter repeated or jumped further than the binding allows.
    WrongSequence { counter: u16 },
}

impl CheckOutcome {
    /// `true` unless a protected payload failed verification.
    #[must_use]
    pub const fn is_valid(&self) -> bool { matches!(self, Self::NotChecked | Self::Valid { .. }) }

    /// Report whether a profile inspected the payload.
    #[must_use]
    pub const fn is_checked(&self) -> bool { !matches!(self, Self::NotChecked) }

    /// Counter carried by the payload, when the profile has one and the
    /// payload was long enough to read it.
    #[must_use]
    pub const fn counter(&self) -> Option<u16> {
        match self {
            Self::Valid { counter } | Self::WrongCrc { counter } => *counter,
            Self::Mismatch { counter } | Self::WrongSequence { counter } => Some(*counter),
            Self::NotChecked | Self::TooShort | Self::TooLong => None,
        }
    }
}

/// Embed counter, data-ID and CRC into `payload` according to `config`.
///
/// `header` is the header the payload will travel with; only profiles whose
/// protected area reaches into the header read it. Unknown profiles return the
/// payload unchanged. The same inputs always produce the same bytes.
///
/// # Errors
///
/// Returns [`E2eError::TooShort`] if the payload cannot hold the profile's
/// fields, or [`E2eError::TooLong`] if it exceeds the profile's limit.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use someip_wire::e2e::{Crc32Config, E2eConfig, check, protect};
/// use someip_wire::message::{Header, MessageKind, MethodId, ServiceId};
///
/// let header = Header::new(ServiceId::new(0x1234), MethodId::new(0x0421), MessageKind::Request.into());
/// let config = E2eConfig::Crc32(Crc32Config::new(0));
/// let payload = Bytes::from_static(&[0, 0, 0, 0, 0xFF, 0x00, 0xFF, 0x32]);
/// let protected = protect(&config, &header, payload, 0).expect("payload is long enough");
/// assert_eq!(&protected[..4], &[0xA4, 0xB2, 0x75, 0x1F]);
/// assert!(check(&config, &header, &protected).is_valid());
/// ```
pub fn protect(
    config: &E2eConfig,
    header: &Header,
    payload: Bytes,
    counter: u16,
) -> Result<Bytes, E2eError> {
    let mut buf = payload.to_vec();
    match config {
        E2eConfig::Crc8(profile) => crc8::protect(profile, &mut buf, counter)?,
        E2eConfig::Crc32(profile) => crc32::protect(profile, &mut buf, counter)?,
        E2eConfig::P04(profile) => p04::protect(profile, header, &mut buf, counter)?,
        E2eConfig::Unknown => return Ok(payload),
    }
    Ok(Bytes::from(buf))
}

/// Verify `payload`, received with `header`, against `config`.
///
/// Only the payload itself is judged; counter continuity across messages is
/// left to the caller.
#[must_use]
pub fn check(config: &E2eConfig, header: &Header, payload: &[u8]) -> CheckOutcome {
    match config {
        E2eConfig::Crc8(profile) => crc8::check(profile, payload),
        E2eConfig::Crc32(profile) => crc32::check(profile, payload),
        E2eConfig::P04(profile) => p04::check(profile, header, payload),
        E2eConfig::Unknown => CheckOutcome::NotChecked,
    }
}

#[cfg(test)]
mod tests;
