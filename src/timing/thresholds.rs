//! Silence intervals derived from the serial symbol rate.
//!
//! A character is 11 bits, so at 9600 baud t1.5 is 1719 µs and t3.5 is
//! 4011 µs. Rounding t3.5 down to "about 3.9 ms" is not enough: at 9600 baud
//! a silence between 3.9 ms and 4.011 ms does not complete a frame.

/// Bits on the wire per character: start, 8 data, parity or 2nd stop, stop.
pub const BITS_PER_CHAR: u64 = 11;

/// Above this rate the intervals are fixed instead of scaling with the baud.
pub const FIXED_TIMING_BAUD: u32 = 19_200;

/// Fixed inter-character timeout above [`FIXED_TIMING_BAUD`].
pub const FIXED_CHAR_GAP_US: u32 = 750;

/// Fixed inter-frame delay above [`FIXED_TIMING_BAUD`].
pub const FIXED_FRAME_GAP_US: u32 = 1_750;

/// Character-gap (t1.5) and frame-gap (t3.5) thresholds in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Thresholds {
    /// Silence after which a following byte is a framing error.
    pub char_gap_us: u32,
    /// Silence after which the frame is complete.
    pub frame_gap_us: u32,
}

impl Thresholds {
    /// Derive both thresholds for `baud_rate`.
    ///
    /// Up to 19200 baud they are 1.5 and 3.5 character times, rounded up to
    /// the next microsecond. Faster links use 750 µs and 1750 µs so that the
    /// timer load stays bounded. A zero rate is treated as 1 baud.
    pub const fn for_baud(baud_rate: u32) -> Self {
        if baud_rate > FIXED_TIMING_BAUD {
            return Self {
                char_gap_us: FIXED_CHAR_GAP_US,
                frame_gap_us: FIXED_FRAME_GAP_US,
            };
        }
        let baud = if baud_rate == 0 { 1 } else { baud_rate as u64 };
        // Half character times: 3 halves for t1.5, 7 halves for t3.5.
        let half_char_scaled = BITS_PER_CHAR * 1_000_000;
        Self {
            char_gap_us: saturate((3 * half_char_scaled).div_ceil(2 * baud)),
            frame_gap_us: saturate((7 * half_char_scaled).div_ceil(2 * baud)),
        }
    }

    /// Thresholds given directly in microseconds.
    pub const fn new(char_gap_us: u32, frame_gap_us: u32) -> Self {
        Self {
            char_gap_us,
            frame_gap_us,
        }
    }
}

const fn saturate(value: u64) -> u32 {
    if value > u32::MAX as u64 {
        u32::MAX
    } else {
        value as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_9600_baud() {
        let t = Thresholds::for_baud(9_600);
        assert_eq!(t.char_gap_us, 1_719);
        assert_eq!(t.frame_gap_us, 4_011);
    }

    #[test]
    fn test_19200_baud_still_scales() {
        let t = Thresholds::for_baud(19_200);
        assert_eq!(t.char_gap_us, 860);
        assert_eq!(t.frame_gap_us, 2_006);
    }

    #[test]
    fn test_fixed_above_19200() {
        for baud in [38_400, 57_600, 115_200, 921_600] {
            let t = Thresholds::for_baud(baud);
            assert_eq!(t, Thresholds::new(750, 1_750));
        }
    }

    #[test]
    fn test_slow_and_zero_baud() {
        let t = Thresholds::for_baud(1_200);
        assert_eq!(t.char_gap_us, 13_750);
        assert_eq!(t.frame_gap_us, 32_084);
        let t = Thresholds::for_baud(0);
        assert!(t.char_gap_us < t.frame_gap_us);
    }
}
