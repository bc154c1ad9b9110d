//! CRC-16/MODBUS checksum engine.
//!
//! Two interchangeable implementations of the same checksum are provided:
//!
//! - [`BitwiseCrc`] shifts every byte through the generator eight times. It
//!   needs no table and is the smallest option for flash-starved targets.
//! - [`LookupCrc`] folds a whole byte per step through a 256-entry table. The
//!   table is built at compile time, so there is no start-up cost, at the price
//!   of 512 bytes of read-only data.
//!
//! Both implement [`Crc16`] and produce identical results for every input.
//! [`DefaultCrc`] names the one selected by the `crc-lookup` feature.
//!
//! # Example
//!
//! ```
//! use mbrtu::crc::{self, BitwiseCrc, Crc16, LookupCrc};
//!
//! let request = [0x11, 0x03, 0x00, 0x6B, 0x00, 0x03];
//! assert_eq!(crc::compute(&request), 0x8776);
//! assert_eq!(BitwiseCrc::compute(&request), LookupCrc::compute(&request));
//!
//! let adu = [0x11, 0x03, 0x00, 0x6B, 0x00, 0x03, 0x76, 0x87];
//! assert!(crc::validate(&adu));
//! ```

/// Initial CRC register value.
pub const CRC_INIT: u16 = 0xFFFF;

/// Reflected form of the generator polynomial 0x8005.
pub const CRC_POLY: u16 = 0xA001;

/// Number of bytes a CRC occupies on the wire.
pub const CRC_LEN: usize = 2;

/// A CRC-16 algorithm over byte sequences.
///
/// Implementations are stateless; every function is pure.
pub trait Crc16 {
    /// Feed `bytes` into a running CRC register value.
    fn update(crc: u16, bytes: &[u8]) -> u16;

    /// Compute the CRC of `bytes`.
    #[inline]
    fn compute(bytes: &[u8]) -> u16 {
        Self::update(CRC_INIT, bytes)
    }

    /// Check a frame whose last two bytes are its little-endian CRC.
    ///
    /// Inputs shorter than two bytes cannot carry a CRC and are rejected.
    fn validate(frame: &[u8]) -> bool {
        match split_crc(frame) {
            Some((body, carried)) => Self::compute(body) == carried,
            None => false,
        }
    }

    /// CRC of `bytes` in wire order (low byte first).
    #[inline]
    fn to_wire(bytes: &[u8]) -> [u8; CRC_LEN] {
        Self::compute(bytes).to_le_bytes()
    }
}

/// Split a frame into its body and the CRC it carries.
#[inline]
pub fn split_crc(frame: &[u8]) -> Option<(&[u8], u16)> {
    let body_len = frame.len().checked_sub(CRC_LEN)?;
    let (body, tail) = frame.split_at(body_len);
    Some((body, u16::from_le_bytes([tail[0], tail[1]])))
}

/// Bit-at-a-time CRC computation.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitwiseCrc;

impl Crc16 for BitwiseCrc {
    fn update(mut crc: u16, bytes: &[u8]) -> u16 {
        for &byte in bytes {
            crc ^= u16::from(byte);
            for _ in 0..8 {
                crc = if crc & 0x0001 != 0 {
                    (crc >> 1) ^ CRC_POLY
                } else {
                    crc >> 1
                };
            }
        }
        crc
    }
}

/// Table-driven CRC computation.
#[derive(Debug, Clone, Copy, Default)]
pub struct LookupCrc;

/// Precomputed remainders for every byte value.
pub static CRC_TABLE: [u16; 256] = build_table();

const fn build_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u16;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x0001 != 0 {
                (crc >> 1) ^ CRC_POLY
            } else {
                crc >> 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

impl Crc16 for LookupCrc {
    #[inline]
    fn update(mut crc: u16, bytes: &[u8]) -> u16 {
        for &byte in bytes {
            let index = ((crc ^ u16::from(byte)) & 0x00FF) as usize;
            crc = (crc >> 8) ^ CRC_TABLE[index];
        }
        crc
    }
}

/// The CRC implementation selected at build time.
#[cfg(feature = "crc-lookup")]
pub type DefaultCrc = LookupCrc;

/// The CRC implementation selected at build time.
#[cfg(not(feature = "crc-lookup"))]
pub type DefaultCrc = BitwiseCrc;

/// Compute the CRC of `bytes` with [`DefaultCrc`].
#[inline]
pub fn compute(bytes: &[u8]) -> u16 {
    DefaultCrc::compute(bytes)
}

/// Validate a frame with a trailing CRC using [`DefaultCrc`].
#[inline]
pub fn validate(frame: &[u8]) -> bool {
    DefaultCrc::validate(frame)
}
