#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

//! # mbrtu
//!
//! A `no_std` Modbus RTU link-layer core for microcontrollers and hosts.
//!
//! RTU frames have no length field and no terminator: a frame is whatever
//! arrived between two silences, and its integrity is guarded by a CRC-16.
//! This crate implements the three pieces that make that work:
//!
//! - **CRC engine** ([`crc`]): CRC-16/MODBUS, bitwise or table-driven.
//! - **Memory ownership** ([`memory`]): transmit/receive buffers and the
//!   register table, statically sized or heap allocated.
//! - **Frame timing** ([`timing`]): t1.5/t3.5 silence detection, driven by a
//!   periodic tick or by timestamps alone.
//!
//! [`FrameReceiver`] combines them into the reception state machine, and
//! [`RtuSlave`] adds a [`FrameTransmitter`] and a [`Dispatcher`] to form a
//! complete slave channel.
//!
//! ## Build-time switches
//!
//! | Feature | Default | Selects |
//! |---------|---------|---------|
//! | `crc-lookup` | on | [`LookupCrc`] instead of [`BitwiseCrc`] as [`DefaultCrc`] |
//! | `dynamic-alloc` | off | [`HeapMemory`] instead of [`StaticMemory`] as [`DefaultMemory`] |
//! | `tickless` | on | [`MonotonicClock`] instead of [`TickClock`] as [`DefaultClock`] |
//!
//! The switches change footprint and mechanism only. Every variant pair
//! implements one trait and is chosen at compile time, so there is no
//! dynamic dispatch and code written against the defaults builds with any
//! combination.
//!
//! Other features: `std` (JSON configuration files), `alloc`, `serde`,
//! `log` (diagnostics through the `log` facade), `defmt` and `heapless`
//! (interrupt-safe byte queue in [`queue`]).
//!
//! ## Quick Start
//!
//! ```
//! use mbrtu::crc::LookupCrc;
//! use mbrtu::{
//!     ManualClock, PollOutcome, RegisterDispatcher, RtuConfig, RtuSlave, StaticMemory,
//!     VecTransport, Result,
//! };
//!
//! fn main() -> Result<()> {
//!     let config = RtuConfig { slave_address: 0x11, register_base: 0x6B, ..RtuConfig::default() };
//!     let mut slave: RtuSlave<StaticMemory, ManualClock, RegisterDispatcher, LookupCrc> =
//!         RtuSlave::init(&config, ManualClock::new(0), RegisterDispatcher::new(0x11))?;
//!     slave.registers_mut().write_range(0x6B, &[0xAE41, 0x5652, 0x4340])?;
//!
//!     // Bytes arrive from the UART with microsecond timestamps.
//!     let request = [0x11, 0x03, 0x00, 0x6B, 0x00, 0x03, 0x76, 0x87];
//!     for (i, &byte) in request.iter().enumerate() {
//!         slave.on_byte(byte, i as u64 * 1_146)?;
//!     }
//!
//!     // Later, once the line has been quiet for t3.5:
//!     slave.clock_mut().set(20_000);
//!     let mut wire = VecTransport::new();
//!     assert_eq!(slave.poll(&mut wire)?, PollOutcome::Replied { len: 11 });
//!     assert_eq!(&wire.last().unwrap()[..3], &[0x11, 0x03, 0x06]);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`crc`] | CRC-16 implementations and helpers |
//! | [`memory`] | Buffers, register table and memory models |
//! | [`timing`] | Clocks, thresholds and the frame timer |
//! | [`receiver`] | Frame reception state machine |
//! | [`transmitter`] | ADU encoding and the transport seam |
//! | [`dispatch`] | Dispatcher seam and a register-serving slave |
//! | [`slave`] | A complete slave channel |
//! | [`config`] | Link configuration |
//! | [`error`] | Error types and [`Result`] alias |
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`], an alias for
//! `core::result::Result<T, Error>`. Framing problems are recovered inside
//! the receiver and reported for counting; memory failures happen only at
//! initialization and are fatal for the channel.

#[cfg(feature = "alloc")]
extern crate alloc;

#[macro_use]
mod macros;

pub mod config;
pub mod crc;
pub mod dispatch;
pub mod error;
pub mod memory;
#[cfg(feature = "heapless")]
pub mod queue;
pub mod receiver;
pub mod slave;
pub mod timing;
pub mod transmitter;

// Re-export commonly used types at the crate root
pub use config::RtuConfig;
pub use crc::{BitwiseCrc, Crc16, DefaultCrc, LookupCrc};
pub use dispatch::{Dispatcher, ExceptionCode, RegisterDispatcher};
pub use error::{Error, Result};
#[cfg(feature = "alloc")]
pub use memory::HeapMemory;
pub use memory::{
    Buffer, BufferKind, DefaultMemory, MemoryModel, RegisterTable, StaticMemory,
};
pub use receiver::{Frame, FrameReceiver, ReceiverStats};
pub use slave::{PollOutcome, RtuSlave};
pub use timing::{
    Clock, DefaultClock, FrameTimer, ManualClock, MonotonicClock, Phase, Thresholds, TickClock,
    TimeoutEvent,
};
#[cfg(feature = "alloc")]
pub use transmitter::VecTransport;
pub use transmitter::{FrameTransmitter, Transport};
