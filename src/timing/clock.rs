//! Time sources for the frame timer.

/// A monotonic time source.
///
/// Units are chosen by the implementation: whole ticks for [`TickClock`],
/// microseconds for the tickless clocks. The timer converts its thresholds
/// once at construction through [`micros_to_units`](Clock::micros_to_units)
/// and afterwards compares raw units only.
pub trait Clock {
    /// Current time in clock units.
    fn now(&self) -> u64;

    /// Convert a duration in microseconds to clock units, rounding up.
    fn micros_to_units(&self, micros: u32) -> u64;

    /// Advance the clock by one period.
    ///
    /// Only periodic clocks move on ticks; the default does nothing.
    #[inline]
    fn tick(&mut self) {}
}

/// A counter advanced by a periodic interrupt.
///
/// Time does not pass unless [`tick`](Clock::tick) is called, so timeout
/// resolution is one tick period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickClock {
    ticks: u64,
    period_us: u32,
}

impl TickClock {
    /// A clock ticking every `period_us` microseconds.
    ///
    /// A zero period is treated as one microsecond.
    pub const fn new(period_us: u32) -> Self {
        Self {
            ticks: 0,
            period_us: if period_us == 0 { 1 } else { period_us },
        }
    }

    /// Length of one tick in microseconds.
    #[inline]
    pub fn period_us(&self) -> u32 {
        self.period_us
    }
}

impl Clock for TickClock {
    #[inline]
    fn now(&self) -> u64 {
        self.ticks
    }

    fn micros_to_units(&self, micros: u32) -> u64 {
        u64::from(micros).div_ceil(u64::from(self.period_us))
    }

    #[inline]
    fn tick(&mut self) {
        self.ticks = self.ticks.saturating_add(1);
    }
}

/// A free-running microsecond counter read on demand.
///
/// Wraps the platform's monotonic timer (a hardware timer register, a
/// `embassy_time::Instant`, `std::time::Instant` on a host, ...).
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    source: fn() -> u64,
}

impl MonotonicClock {
    /// A clock reading microseconds from `source`.
    pub const fn new(source: fn() -> u64) -> Self {
        Self { source }
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> u64 {
        (self.source)()
    }

    #[inline]
    fn micros_to_units(&self, micros: u32) -> u64 {
        u64::from(micros)
    }
}

/// A microsecond clock moved by hand.
///
/// For simulations and tests, and for transports that stamp every event
/// themselves and only need the timer to compare stamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManualClock {
    now_us: u64,
}

impl ManualClock {
    /// A clock reading `now_us`.
    pub const fn new(now_us: u64) -> Self {
        Self { now_us }
    }

    /// Jump to `now_us`; earlier values are ignored.
    pub fn set(&mut self, now_us: u64) {
        self.now_us = self.now_us.max(now_us);
    }

    /// Move forward by `micros`.
    pub fn advance(&mut self, micros: u64) {
        self.now_us = self.now_us.saturating_add(micros);
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now(&self) -> u64 {
        self.now_us
    }

    #[inline]
    fn micros_to_units(&self, micros: u32) -> u64 {
        u64::from(micros)
    }
}

/// The clock selected at build time.
#[cfg(feature = "tickless")]
pub type DefaultClock = MonotonicClock;

/// The clock selected at build time.
#[cfg(not(feature = "tickless"))]
pub type DefaultClock = TickClock;
