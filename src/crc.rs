//! Table-driven CRC engines used by the E2E profiles.
//!
//! Three families are provided:
//!
//! - CRC-8 (SAE-J1850): polynomial `0x1D`, initial register `0xFF`, final XOR
//!   `0xFF`.
//! - CRC-32 (IEEE 802.3): reflected polynomial `0xEDB88320`, initial register
//!   `0xFFFFFFFF`, final XOR `0xFFFFFFFF`.
//! - CRC-32P4 (AUTOSAR profile 4): polynomial `0xF4ACFB13`, reflected as
//!   `0xC8DF352F`, with the same register handling as CRC-32.
//!
//! All expose an `update` entry point that continues from a previously
//! returned value, so a CRC may be computed over disjoint windows of a buffer
//! (for example the bytes either side of an embedded CRC field).

/// CRC family selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CrcProfile {
    Crc8,
    Crc32,
    Crc32P4,
}

const CRC8_POLY: u8 = 0x1D;
const CRC8_XOR: u8 = 0xFF;
const CRC32_POLY_REFLECTED: u32 = 0xEDB8_8320;
const CRC32_XOR: u32 = 0xFFFF_FFFF;
const CRC32P4_POLY_REFLECTED: u32 = 0xC8DF_352F;

const CRC8_TABLE: [u8; 256] = crc8_table();
const CRC32_TABLE: [u32; 256] = reflected_table(CRC32_POLY_REFLECTED);
const CRC32P4_TABLE: [u32; 256] = reflected_table(CRC32P4_POLY_REFLECTED);

#[expect(
    clippy::cast_possible_truncation,
    reason = "table index never exceeds 255"
)]
const fn crc8_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x80 == 0 {
                crc << 1
            } else {
                (crc << 1) ^ CRC8_POLY
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "table index never exceeds 255"
)]
const fn reflected_table(poly: u32) -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 == 0 {
                crc >> 1
            } else {
                (crc >> 1) ^ poly
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Continue a CRC-8 from `previous`, a value returned by an earlier call.
///
/// Pass `0` to start a fresh computation.
#[must_use]
pub fn crc8_update(previous: u8, bytes: &[u8]) -> u8 {
    let reg = bytes
        .iter()
        .fold(previous ^ CRC8_XOR, |reg, &b| CRC8_TABLE[usize::from(reg ^ b)]);
    reg ^ CRC8_XOR
}

/// Compute the CRC-8 of `bytes`.
///
/// ```
/// assert_eq!(someip_wire::crc::crc8(b"123456789"), 0x4B);
/// ```
#[must_use]
pub fn crc8(bytes: &[u8]) -> u8 { crc8_update(0, bytes) }

/// Continue a CRC-32 from `previous`, a value returned by an earlier call.
///
/// Pass `0` to start a fresh computation.
#[must_use]
pub fn crc32_update(previous: u32, bytes: &[u8]) -> u32 { reflected_update(&CRC32_TABLE, previous, bytes) }

/// Compute the CRC-32 of `bytes`.
///
/// ```
/// assert_eq!(someip_wire::crc::crc32(b"123456789"), 0xCBF4_3926);
/// ```
#[must_use]
pub fn crc32(bytes: &[u8]) -> u32 { crc32_update(0, bytes) }

/// Continue a CRC-32P4 from `previous`, a value returned by an earlier call.
///
/// Pass `0` to start a fresh computation.
#[must_use]
pub fn crc32p4_update(previous: u32, bytes: &[u8]) -> u32 {
    reflected_update(&CRC32P4_TABLE, previous, bytes)
}

/// Compute the CRC-32P4 of `bytes`.
///
/// ```
/// assert_eq!(someip_wire::crc::crc32p4(b"123456789"), 0x1697_D06A);
/// ```
#[must_use]
pub fn crc32p4(bytes: &[u8]) -> u32 { crc32p4_update(0, bytes) }

fn reflected_update(table: &[u32; 256], previous: u32, bytes: &[u8]) -> u32 {
    let reg = bytes.iter().fold(previous ^ CRC32_XOR, |reg, &b| {
        let index = (reg ^ u32::from(b)) & 0xFF;
        table[index as usize] ^ (reg >> 8)
    });
    reg ^ CRC32_XOR
}

/// Compute the CRC of `bytes` for `profile`, widened to `u32`.
#[must_use]
pub fn compute(profile: CrcProfile, bytes: &[u8]) -> u32 {
    match profile {
        CrcProfile::Crc8 => u32::from(crc8(bytes)),
        CrcProfile::Crc32 => crc32(bytes),
        CrcProfile::Crc32P4 => crc32p4(bytes),
    }
}

/// Check `bytes` against an expected CRC value for `profile`.
#[must_use]
pub fn verify(profile: CrcProfile, bytes: &[u8], expected: u32) -> bool {
    compute(profile, bytes) == expected
}
