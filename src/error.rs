//! Error types for RTU link operations.
//!
//! This module defines the [`Error`] enum which represents every failure the
//! link core can report, from memory acquisition at start-up to register
//! access performed by a dispatcher.
//!
//! # Example
//!
//! ```
//! use mbrtu::{Error, RegisterTable, Result};
//!
//! fn bump(table: &mut RegisterTable<[u16; 4]>, address: u16) -> Result<u16> {
//!     match table.read(address) {
//!         Ok(value) => {
//!             table.write(address, value.wrapping_add(1))?;
//!             Ok(value)
//!         }
//!         Err(Error::OutOfRange { address }) => {
//!             // Nothing mapped there; the caller answers with an exception.
//!             Err(Error::OutOfRange { address })
//!         }
//!         Err(e) => Err(e),
//!     }
//! }
//!
//! let mut table = RegisterTable::new(100, [0u16; 4]);
//! assert_eq!(bump(&mut table, 101).unwrap(), 0);
//! assert!(bump(&mut table, 7).is_err());
//! ```

use core::fmt;

/// Errors that can occur while receiving, transmitting or dispatching frames.
///
/// Timing and framing errors are recovered locally by the receiver (the
/// state machine resets and the next frame is attempted); they are still
/// returned so the caller can count or log them. Memory errors happen at
/// start-up and are fatal for the channel.
#[derive(Debug)]
#[cfg_attr(all(feature = "defmt", not(feature = "std")), derive(defmt::Format))]
pub enum Error {
    /// A frame's trailing CRC did not match the CRC computed over its body.
    ChecksumMismatch {
        /// CRC computed over the received bytes
        expected: u16,
        /// CRC carried by the frame
        actual: u16,
    },

    /// A frame too short to carry an address, a function code and a CRC.
    InvalidFrame {
        /// Number of bytes received
        len: usize,
    },

    /// More bytes arrived than the buffer can hold.
    ///
    /// The in-progress frame is discarded and the receiver waits for the
    /// next silence before accepting bytes again.
    BufferOverrun {
        /// Capacity of the buffer that overflowed
        capacity: usize,
    },

    /// The allocator could not provide the requested storage.
    ///
    /// Only produced by heap-backed memory.
    OutOfMemory {
        /// Number of bytes requested
        requested: usize,
        /// Number of bytes still available to this channel
        available: usize,
    },

    /// A register address outside the mapped table was accessed.
    OutOfRange {
        /// The first address that is not mapped
        address: u16,
    },

    /// A byte arrived while a completed frame was still waiting for `poll`.
    ///
    /// The byte is rejected; call `poll` or `reset` to continue.
    UnconsumedFrame,

    /// A configuration value is unusable.
    InvalidConfig(&'static str),

    /// The transport refused or failed to send a frame.
    Transport,

    /// The interrupt-to-main-loop event queue is full.
    QueueFull,

    /// An I/O error occurred while reading or writing a configuration file.
    ///
    /// Only available with the `std` feature.
    #[cfg(feature = "std")]
    IOError(std::io::Error),

    /// A configuration document could not be parsed or produced.
    ///
    /// Only available with the `std` feature.
    #[cfg(feature = "std")]
    Json(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ChecksumMismatch { expected, actual } => write!(
                f,
                "CRC mismatch: computed {expected:#06x}, frame carries {actual:#06x}"
            ),
            Error::InvalidFrame { len } => write!(f, "Invalid frame: only {len} bytes"),
            Error::BufferOverrun { capacity } => {
                write!(f, "Buffer overrun: frame exceeds {capacity} bytes")
            }
            Error::OutOfMemory {
                requested,
                available,
            } => write!(
                f,
                "Out of memory: requested {requested} bytes, {available} available"
            ),
            Error::OutOfRange { address } => {
                write!(f, "Register address {address:#06x} is not mapped")
            }
            Error::UnconsumedFrame => {
                write!(f, "Byte received before the completed frame was consumed")
            }
            Error::InvalidConfig(reason) => write!(f, "Invalid configuration: {reason}"),
            Error::Transport => write!(f, "Transport error"),
            Error::QueueFull => write!(f, "Event queue full"),
            #[cfg(feature = "std")]
            Error::IOError(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "std")]
            Error::Json(e) => write!(f, "JSON error: {e}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IOError(e) => Some(e),
            Error::Json(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(feature = "std")]
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IOError(err)
    }
}

#[cfg(feature = "std")]
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

/// A specialized Result type for RTU link operations.
///
/// This is defined as `core::result::Result<T, Error>` for convenience.
pub type Result<T> = core::result::Result<T, Error>;
