//! Link configuration.
//!
//! Two layers of configuration exist:
//!
//! - **Build time**: the `crc-lookup`, `dynamic-alloc` and `tickless` Cargo
//!   features choose an implementation variant. They are mirrored here as
//!   constants so applications can report how they were built. Switching them
//!   changes footprint and mechanism only, never what goes on the wire.
//! - **Run time**: [`RtuConfig`] carries the serial and memory parameters of
//!   one channel. With the `std` feature it can be loaded from JSON.
//!
//! # Example
//!
//! ```
//! use mbrtu::RtuConfig;
//!
//! let config = RtuConfig {
//!     baud_rate: 19_200,
//!     slave_address: 0x11,
//!     ..RtuConfig::default()
//! };
//! config.validate().unwrap();
//! ```

use crate::timing::Thresholds;
use crate::{Error, Result};

/// Whether CRCs are computed through the lookup table.
pub const USE_CRC_LOOKUP: bool = cfg!(feature = "crc-lookup");

/// Whether buffers and register storage come from the heap.
pub const USE_MALLOC: bool = cfg!(feature = "dynamic-alloc");

/// Whether timing is timestamp-driven instead of tick-driven.
pub const TICKLESS: bool = cfg!(feature = "tickless");

/// Largest RTU application data unit: address, 253-byte PDU, CRC.
pub const MAX_ADU_LEN: usize = 256;

/// Size of statically reserved transmit and receive buffers.
pub const STATIC_BUFFER_LEN: usize = MAX_ADU_LEN;

/// Number of statically reserved holding registers.
pub const STATIC_REGISTER_COUNT: usize = 64;

/// Highest unicast slave address.
pub const MAX_SLAVE_ADDRESS: u8 = 247;

/// Parameters of one RTU channel.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RtuConfig {
    /// Serial symbol rate in bits per second.
    pub baud_rate: u32,
    /// Requested receive buffer capacity in bytes.
    pub rx_capacity: usize,
    /// Requested transmit buffer capacity in bytes.
    pub tx_capacity: usize,
    /// Address of the first mapped register.
    pub register_base: u16,
    /// Number of mapped registers (heap mode; static mode is fixed at build time).
    pub register_count: u16,
    /// Period of the tick source in microseconds (periodic mode).
    pub tick_period_us: u32,
    /// Upper bound on heap bytes this channel may take, `None` for no limit.
    pub heap_budget: Option<usize>,
    /// Address this node answers to when acting as a slave.
    pub slave_address: u8,
}

impl Default for RtuConfig {
    fn default() -> Self {
        Self {
            baud_rate: 9_600,
            rx_capacity: STATIC_BUFFER_LEN,
            tx_capacity: STATIC_BUFFER_LEN,
            register_base: 0,
            register_count: STATIC_REGISTER_COUNT as u16,
            tick_period_us: 1_000,
            heap_budget: None,
            slave_address: 1,
        }
    }
}

impl RtuConfig {
    /// Check that every field is usable.
    pub fn validate(&self) -> Result<()> {
        if self.baud_rate == 0 {
            return Err(Error::InvalidConfig("baud rate must be non-zero"));
        }
        if self.rx_capacity == 0 || self.tx_capacity == 0 {
            return Err(Error::InvalidConfig("buffer capacity must be non-zero"));
        }
        if self.tick_period_us == 0 {
            return Err(Error::InvalidConfig("tick period must be non-zero"));
        }
        if self.slave_address == 0 || self.slave_address > MAX_SLAVE_ADDRESS {
            return Err(Error::InvalidConfig("slave address must be 1..=247"));
        }
        if u32::from(self.register_base) + u32::from(self.register_count) > 0x1_0000 {
            return Err(Error::InvalidConfig("register window exceeds address space"));
        }
        Ok(())
    }

    /// Silence thresholds derived from [`baud_rate`](Self::baud_rate).
    #[inline]
    pub fn thresholds(&self) -> Thresholds {
        Thresholds::for_baud(self.baud_rate)
    }

    /// Parse a configuration from a JSON document.
    ///
    /// Missing fields take their default value.
    #[cfg(feature = "std")]
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: RtuConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    #[cfg(feature = "std")]
    pub fn from_json_file(path: &str) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(Error::IOError)?;
        Self::from_json_str(&json)
    }

    /// Serialize the configuration as pretty-printed JSON.
    #[cfg(feature = "std")]
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Save the configuration to a JSON file.
    #[cfg(feature = "std")]
    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(Error::IOError)?;
        Ok(())
    }
}
