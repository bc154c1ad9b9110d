//! Frame reception state machine.
//!
//! [`FrameReceiver`] accumulates bytes in a receive [`Buffer`], lets the
//! [`FrameTimer`] decide where frames end, checks each completed frame's CRC
//! and surfaces it exactly once through [`poll`](FrameReceiver::poll).
//!
//! # Example
//!
//! ```
//! use mbrtu::crc::LookupCrc;
//! use mbrtu::{FrameReceiver, ManualClock, RtuConfig, StaticMemory};
//!
//! let config = RtuConfig::default(); // 9600 baud: t1.5 = 1719 µs, t3.5 = 4011 µs
//! let mut memory = StaticMemory::<256, 8>::default();
//! let mut rx: FrameReceiver<_, _, LookupCrc> =
//!     FrameReceiver::new(&mut memory, &config, ManualClock::new(0)).unwrap();
//!
//! let adu = [0x11, 0x03, 0x00, 0x6B, 0x00, 0x03, 0x76, 0x87];
//! for (i, &byte) in adu.iter().enumerate() {
//!     rx.on_byte(byte, i as u64 * 1_146).unwrap();
//! }
//!
//! assert!(rx.poll_at(10_000).is_none()); // not quiet long enough yet
//! let frame = rx.poll_at(20_000).unwrap();
//! assert!(frame.is_valid());
//! assert_eq!(frame.as_bytes(), &adu);
//! ```

mod frame;

pub use frame::{BROADCAST_ADDRESS, Frame, MIN_FRAME_LEN};

use core::marker::PhantomData;

use crate::config::RtuConfig;
use crate::crc::{Crc16, DefaultCrc};
use crate::memory::{Buffer, BufferKind, ByteStorage, MemoryModel};
use crate::timing::{ByteDisposition, Clock, FrameTimer, Phase, TimeoutEvent};
use crate::{Error, Result};

/// Counters kept by a [`FrameReceiver`].
///
/// Every counter saturates at `u32::MAX` instead of wrapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReceiverStats {
    /// Frames completed and delivered, valid or not.
    pub frames: u32,
    /// Delivered frames that failed the length or CRC check.
    pub checksum_errors: u32,
    /// Frames discarded because they overflowed the buffer.
    pub overruns: u32,
    /// Frames discarded because a character gap split them.
    pub framing_errors: u32,
    /// Bytes rejected because a completed frame had not been consumed.
    pub unconsumed_bytes: u32,
}

impl ReceiverStats {
    /// Delivered frames that passed the checks.
    #[inline]
    pub fn valid_frames(&self) -> u32 {
        self.frames.saturating_sub(self.checksum_errors)
    }

    /// Frames lost or delivered corrupt, for any reason.
    #[inline]
    pub fn total_errors(&self) -> u32 {
        self.checksum_errors
            .saturating_add(self.overruns)
            .saturating_add(self.framing_errors)
    }
}

/// Receive side of an RTU channel.
///
/// `B` is the buffer storage chosen by the [`MemoryModel`], `C` the time
/// source and `K` the CRC implementation.
pub struct FrameReceiver<B, C, K = DefaultCrc> {
    buffer: Buffer<B>,
    timer: FrameTimer<C>,
    stats: ReceiverStats,
    ready: bool,
    _crc: PhantomData<K>,
}

impl<B: ByteStorage, C: Clock, K: Crc16> FrameReceiver<B, C, K> {
    /// Acquire a receive buffer from `memory` and set up timing for `config`.
    ///
    /// Fails if the configuration is invalid or the buffer cannot be
    /// allocated; either is fatal for the channel.
    pub fn new<M>(memory: &mut M, config: &RtuConfig, clock: C) -> Result<Self>
    where
        M: MemoryModel<Bytes = B>,
    {
        config.validate()?;
        let buffer = memory.acquire(BufferKind::Receive, config.rx_capacity)?;
        let timer = FrameTimer::new(clock, config.thresholds());
        debug!(
            "receiver ready: {} bytes, t1.5 {} us, t3.5 {} us",
            buffer.capacity(),
            timer.thresholds().char_gap_us,
            timer.thresholds().frame_gap_us
        );
        Ok(Self::from_parts(buffer, timer))
    }

    /// Build a receiver from an already acquired buffer and a timer.
    pub fn from_parts(mut buffer: Buffer<B>, timer: FrameTimer<C>) -> Self {
        buffer.clear();
        Self {
            buffer,
            timer,
            stats: ReceiverStats::default(),
            ready: false,
            _crc: PhantomData,
        }
    }

    /// Give the receive buffer back to `memory`.
    pub fn release<M>(self, memory: &mut M)
    where
        M: MemoryModel<Bytes = B>,
    {
        memory.release(self.buffer);
    }

    /// Feed one byte received at `timestamp` (clock units).
    ///
    /// Silence implied by `timestamp` is settled first, so a late byte can
    /// complete the previous frame before being considered.
    ///
    /// # Errors
    ///
    /// - [`Error::BufferOverrun`]: the frame outgrew the buffer. It is
    ///   discarded and bytes are ignored until the line goes quiet.
    /// - [`Error::UnconsumedFrame`]: a completed frame is waiting for
    ///   [`poll`](Self::poll); this byte was not stored.
    pub fn on_byte(&mut self, byte: u8, timestamp: u64) -> Result<()> {
        self.settle(timestamp);

        match self.timer.on_byte_received(timestamp) {
            ByteDisposition::Start => {
                self.buffer.clear();
                self.store(byte)
            }
            ByteDisposition::Append => self.store(byte),
            ByteDisposition::Discard => Ok(()),
            ByteDisposition::Unconsumed => {
                // A late byte may have completed the frame just now.
                self.finish_frame();
                self.stats.unconsumed_bytes = self.stats.unconsumed_bytes.saturating_add(1);
                warn!("byte {byte:#04x} rejected: completed frame not consumed");
                Err(Error::UnconsumedFrame)
            }
        }
    }

    /// Feed one byte stamped with the clock's current time.
    #[inline]
    pub fn on_byte_now(&mut self, byte: u8) -> Result<()> {
        let now = self.timer.clock().now();
        self.on_byte(byte, now)
    }

    /// Advance a periodic clock by one tick.
    #[inline]
    pub fn on_tick(&mut self) {
        self.timer.on_tick();
    }

    fn store(&mut self, byte: u8) -> Result<()> {
        if let Err(e) = self.buffer.push(byte) {
            self.stats.overruns = self.stats.overruns.saturating_add(1);
            warn!(
                "buffer overrun after {} bytes, frame discarded",
                self.buffer.len()
            );
            self.buffer.clear();
            self.timer.resync();
            return Err(e);
        }
        Ok(())
    }

    /// Process silence up to `now` and act on a frame-gap timeout.
    fn settle(&mut self, now: u64) {
        if self.timer.poll_timeout_at(now) != TimeoutEvent::FrameGap {
            return;
        }
        match self.timer.phase() {
            Phase::FrameComplete => self.finish_frame(),
            Phase::FrameError => {
                self.stats.framing_errors = self.stats.framing_errors.saturating_add(1);
                warn!(
                    "framing error: {} bytes split by a character gap",
                    self.buffer.len()
                );
                self.buffer.clear();
                self.timer.reset();
            }
            Phase::Idle | Phase::Receiving => {}
        }
    }

    /// Freeze the buffer as the pending frame, once.
    fn finish_frame(&mut self) {
        if self.ready || self.timer.phase() != Phase::FrameComplete {
            return;
        }
        self.ready = true;
        self.stats.frames = self.stats.frames.saturating_add(1);
        let frame = Frame::checked::<K>(self.buffer.as_slice());
        if frame.is_valid() {
            debug!("frame complete: {} bytes", frame.len());
        } else {
            self.stats.checksum_errors = self.stats.checksum_errors.saturating_add(1);
            warn!("frame complete with bad CRC or length: {} bytes", frame.len());
        }
    }

    /// Return the completed frame, if any, as of the clock's current time.
    #[inline]
    pub fn poll(&mut self) -> Option<Frame<'_>> {
        let now = self.timer.clock().now();
        self.poll_at(now)
    }

    /// Return the completed frame, if any, as of `now` (clock units).
    ///
    /// A frame is returned once; later calls return `None` until another
    /// frame completes.
    pub fn poll_at(&mut self, now: u64) -> Option<Frame<'_>> {
        self.settle(now);
        if !self.ready {
            return None;
        }
        self.ready = false;
        self.timer.consume();
        Some(Frame::checked::<K>(self.buffer.as_slice()))
    }

    /// Returns true if a completed frame is waiting for [`poll`](Self::poll).
    #[inline]
    pub fn has_frame(&self) -> bool {
        self.ready
    }

    /// Abandon any frame in progress or pending and return to idle.
    pub fn reset(&mut self) {
        trace!("receiver reset");
        self.buffer.clear();
        self.ready = false;
        self.timer.reset();
    }

    /// Current timing phase.
    #[inline]
    pub fn phase(&self) -> Phase {
        self.timer.phase()
    }

    /// Counters since creation.
    #[inline]
    pub fn stats(&self) -> &ReceiverStats {
        &self.stats
    }

    /// Receive buffer capacity in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// The frame timer.
    #[inline]
    pub fn timer(&self) -> &FrameTimer<C> {
        &self.timer
    }

    /// The clock, mutably; used to advance manual clocks.
    #[inline]
    pub fn clock_mut(&mut self) -> &mut C {
        self.timer.clock_mut()
    }
}
