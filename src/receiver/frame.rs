//! Completed frames as handed to the dispatcher.

use crate::crc::{self, Crc16};
use crate::{Error, Result};

/// Shortest well-formed frame: address, function code, two CRC bytes.
pub const MIN_FRAME_LEN: usize = 4;

/// Address every slave accepts and none answers.
pub const BROADCAST_ADDRESS: u8 = 0;

/// A frame delimited by silence.
///
/// Borrowed from the receiver's buffer. While a `Frame` is alive the
/// receiver is borrowed too, so no byte can be appended underneath it.
///
/// A frame is valid when it is at least [`MIN_FRAME_LEN`] bytes long and its
/// trailing CRC matches. Invalid frames are still delivered; what to do with
/// them is the dispatcher's decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    bytes: &'a [u8],
    checksum: Option<u16>,
    valid: bool,
}

impl<'a> Frame<'a> {
    /// Check `bytes` with the CRC implementation `K`.
    pub fn checked<K: Crc16>(bytes: &'a [u8]) -> Self {
        let split = crc::split_crc(bytes);
        let checksum = split.map(|(body, _)| K::compute(body));
        let valid = bytes.len() >= MIN_FRAME_LEN
            && split.is_some_and(|(_, carried)| checksum == Some(carried));
        Self {
            bytes,
            checksum,
            valid,
        }
    }

    /// All bytes of the frame, CRC included.
    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Number of bytes, CRC included.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if the frame holds no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns true if the length and CRC are correct.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// CRC computed over everything but the last two bytes.
    #[inline]
    pub fn checksum(&self) -> Option<u16> {
        self.checksum
    }

    /// CRC carried in the last two bytes.
    #[inline]
    pub fn received_checksum(&self) -> Option<u16> {
        crc::split_crc(self.bytes).map(|(_, carried)| carried)
    }

    /// `Ok` for a valid frame, otherwise the reason it is not.
    pub fn check(&self) -> Result<()> {
        if self.valid {
            return Ok(());
        }
        if self.bytes.len() < MIN_FRAME_LEN {
            return Err(Error::InvalidFrame {
                len: self.bytes.len(),
            });
        }
        match (self.checksum, self.received_checksum()) {
            (Some(expected), Some(actual)) if expected != actual => {
                Err(Error::ChecksumMismatch { expected, actual })
            }
            _ => Err(Error::InvalidFrame {
                len: self.bytes.len(),
            }),
        }
    }

    /// Slave address (first byte).
    #[inline]
    pub fn address(&self) -> Option<u8> {
        self.bytes.first().copied()
    }

    /// Returns true if addressed to every slave.
    #[inline]
    pub fn is_broadcast(&self) -> bool {
        self.address() == Some(BROADCAST_ADDRESS)
    }

    /// Function code (second byte).
    #[inline]
    pub fn function_code(&self) -> Option<u8> {
        self.bytes.get(1).copied()
    }

    /// Protocol data unit: function code and data, without address or CRC.
    ///
    /// Empty for frames shorter than [`MIN_FRAME_LEN`].
    pub fn pdu(&self) -> &'a [u8] {
        if self.bytes.len() < MIN_FRAME_LEN {
            return &[];
        }
        &self.bytes[1..self.bytes.len() - crc::CRC_LEN]
    }
}
