//! Silence-based frame delimiting.
//!
//! RTU frames carry no length or terminator; a frame ends when the line has
//! been quiet for 3.5 character times (t3.5). A gap of more than 1.5
//! character times (t1.5) inside a frame corrupts it. [`FrameTimer`] tracks
//! the time of the last byte and turns elapsed silence into
//! [`TimeoutEvent`]s.
//!
//! The timer is generic over a [`Clock`]:
//!
//! - **Periodic**: [`TickClock`] only advances when the tick interrupt calls
//!   [`FrameTimer::on_tick`]; byte timestamps are tick counts.
//! - **Tickless**: [`MonotonicClock`] or [`ManualClock`]; byte timestamps are
//!   microseconds and timeouts are evaluated whenever the caller polls.
//!
//! Thresholds are derived identically in both modes. A silence exactly equal
//! to a threshold has not exceeded it: a byte arriving exactly t1.5 after the
//! previous one still belongs to the same frame, and a frame is complete only
//! once more than t3.5 has elapsed.
//!
//! # State machine
//!
//! ```text
//!            byte                     silence > t3.5
//!   Idle ───────────▶ Receiving ─────────────────────▶ FrameComplete
//!    ▲                   │ byte after t1.5 < gap ≤ t3.5       │
//!    │                   ▼                                    │ consume()
//!    │               FrameError ── silence > t3.5 ── reset() ─┤
//!    └────────────────────────────────────────────────────────┘
//! ```

mod clock;
mod thresholds;

pub use clock::{Clock, DefaultClock, ManualClock, MonotonicClock, TickClock};
pub use thresholds::{
    BITS_PER_CHAR, FIXED_CHAR_GAP_US, FIXED_FRAME_GAP_US, FIXED_TIMING_BAUD, Thresholds,
};

/// Phase of the frame being timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// No frame in progress.
    Idle,
    /// Bytes are arriving within the character gap.
    Receiving,
    /// The frame gap elapsed; the frame waits to be consumed.
    FrameComplete,
    /// A character gap split the frame; bytes are dropped until silence.
    FrameError,
}

/// Result of evaluating elapsed silence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeoutEvent {
    /// No threshold exceeded.
    None,
    /// More than t1.5 of silence inside a frame.
    CharacterGap,
    /// More than t3.5 of silence; the frame has ended.
    FrameGap,
}

/// What the receiver should do with a byte just reported to the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ByteDisposition {
    /// First byte of a new frame.
    Start,
    /// Next byte of the current frame.
    Append,
    /// Drop the byte: the frame is corrupt, or the line is resynchronising.
    Discard,
    /// A completed frame has not been consumed; the byte must be rejected.
    Unconsumed,
}

/// Timing state for one receive channel.
#[derive(Debug, Clone)]
pub struct FrameTimer<C> {
    clock: C,
    thresholds: Thresholds,
    char_gap: u64,
    frame_gap: u64,
    last_event: Option<u64>,
    phase: Phase,
    awaiting_silence: bool,
}

impl<C: Clock> FrameTimer<C> {
    /// A timer in [`Phase::Idle`] using `thresholds` on `clock`.
    pub fn new(clock: C, thresholds: Thresholds) -> Self {
        let char_gap = clock.micros_to_units(thresholds.char_gap_us);
        let frame_gap = clock.micros_to_units(thresholds.frame_gap_us);
        Self {
            clock,
            thresholds,
            char_gap,
            frame_gap,
            last_event: None,
            phase: Phase::Idle,
            awaiting_silence: false,
        }
    }

    /// Current phase.
    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Thresholds in microseconds.
    #[inline]
    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Character-gap threshold in clock units.
    #[inline]
    pub fn char_gap(&self) -> u64 {
        self.char_gap
    }

    /// Frame-gap threshold in clock units.
    #[inline]
    pub fn frame_gap(&self) -> u64 {
        self.frame_gap
    }

    /// Timestamp of the last byte seen, in clock units.
    #[inline]
    pub fn last_event(&self) -> Option<u64> {
        self.last_event
    }

    /// The underlying clock.
    #[inline]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// The underlying clock, mutably.
    #[inline]
    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Advance a periodic clock by one tick.
    #[inline]
    pub fn on_tick(&mut self) {
        self.clock.tick();
    }

    /// Record the time of `timestamp`, clamped so time never runs backwards.
    fn record(&mut self, timestamp: u64) -> u64 {
        let previous = self.last_event.unwrap_or(timestamp);
        let now = timestamp.max(previous);
        self.last_event = Some(now);
        now - previous
    }

    fn elapsed_at(&self, now: u64) -> Option<u64> {
        self.last_event.map(|last| now.saturating_sub(last))
    }

    /// Report a byte received at `timestamp` (clock units).
    pub fn on_byte_received(&mut self, timestamp: u64) -> ByteDisposition {
        let had_event = self.last_event.is_some();
        let gap = self.record(timestamp);

        match self.phase {
            Phase::Idle => {
                if self.awaiting_silence && had_event && gap <= self.frame_gap {
                    return ByteDisposition::Discard;
                }
                self.awaiting_silence = false;
                self.phase = Phase::Receiving;
                ByteDisposition::Start
            }
            Phase::Receiving => {
                if gap > self.frame_gap {
                    // The frame ended before this byte; nobody polled in time.
                    self.phase = Phase::FrameComplete;
                    ByteDisposition::Unconsumed
                } else if gap > self.char_gap {
                    trace!("character gap of {gap} units splits frame");
                    self.phase = Phase::FrameError;
                    ByteDisposition::Discard
                } else {
                    ByteDisposition::Append
                }
            }
            Phase::FrameError => {
                if gap > self.frame_gap {
                    self.phase = Phase::Receiving;
                    ByteDisposition::Start
                } else {
                    ByteDisposition::Discard
                }
            }
            Phase::FrameComplete => ByteDisposition::Unconsumed,
        }
    }

    /// Evaluate silence up to the clock's current time.
    #[inline]
    pub fn poll_timeout(&mut self) -> TimeoutEvent {
        let now = self.clock.now();
        self.poll_timeout_at(now)
    }

    /// Evaluate silence up to `now` (clock units).
    ///
    /// Reaching the frame gap moves `Receiving` to `FrameComplete`; the event
    /// is reported once. In `FrameError` the frame gap is reported until
    /// [`reset`](Self::reset) is called.
    pub fn poll_timeout_at(&mut self, now: u64) -> TimeoutEvent {
        let Some(elapsed) = self.elapsed_at(now) else {
            return TimeoutEvent::None;
        };

        match self.phase {
            Phase::Idle => {
                if self.awaiting_silence && elapsed > self.frame_gap {
                    trace!("line quiet, resynchronised");
                    self.awaiting_silence = false;
                }
                TimeoutEvent::None
            }
            Phase::Receiving => {
                if elapsed > self.frame_gap {
                    self.phase = Phase::FrameComplete;
                    TimeoutEvent::FrameGap
                } else if elapsed > self.char_gap {
                    TimeoutEvent::CharacterGap
                } else {
                    TimeoutEvent::None
                }
            }
            Phase::FrameError => {
                if elapsed > self.frame_gap {
                    TimeoutEvent::FrameGap
                } else {
                    TimeoutEvent::None
                }
            }
            Phase::FrameComplete => TimeoutEvent::None,
        }
    }

    /// Hand the completed frame over; returns false if none was complete.
    pub fn consume(&mut self) -> bool {
        if self.phase == Phase::FrameComplete {
            self.phase = Phase::Idle;
            true
        } else {
            false
        }
    }

    /// Abandon whatever is in progress and return to `Idle`.
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.awaiting_silence = false;
    }

    /// Return to `Idle`, ignoring bytes until a full frame gap of silence.
    ///
    /// Used after an overrun so the tail of an oversized frame is not taken
    /// for the start of a new one.
    pub fn resync(&mut self) {
        self.phase = Phase::Idle;
        self.awaiting_silence = true;
    }

    /// Returns true while bytes are being ignored after [`resync`](Self::resync).
    #[inline]
    pub fn is_resyncing(&self) -> bool {
        self.awaiting_silence
    }
}
