//! Fixed-Point Chip Time
//!
//! Every generator schedules its next state change on a single time axis
//! measured in master-clock cycles with 8 fractional bits (24.8). The
//! fractional part absorbs the generally irrational ratio between the chip
//! clock and the host sample rate.

use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub};

/// Number of fractional bits in a [`Cycles`] value
pub const FRACTION_BITS: u32 = 8;

/// Raw units per whole master-clock cycle
pub const ONE_CLOCK: i64 = 1 << FRACTION_BITS;

/// Point (or span) on the chip time axis, in 1/256 master-clock cycles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cycles(i64);

impl Cycles {
    /// Start of the time axis
    pub const ZERO: Cycles = Cycles(0);

    /// Sentinel for "never": parked generators schedule here
    pub const NEVER: Cycles = Cycles(i64::MAX / 4);

    /// Build from a raw fixed-point value
    #[inline]
    pub const fn from_raw(raw: i64) -> Self {
        Cycles(raw)
    }

    /// Build from a whole number of master-clock cycles
    #[inline]
    pub const fn from_clocks(clocks: i64) -> Self {
        Cycles(clocks << FRACTION_BITS)
    }

    /// Raw fixed-point value
    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Whole master-clock cycles (fraction truncated toward negative infinity)
    #[inline]
    pub const fn whole_clocks(self) -> i64 {
        self.0 >> FRACTION_BITS
    }

    /// Whether this is the parked sentinel (or beyond it)
    #[inline]
    pub const fn is_never(self) -> bool {
        self.0 >= Self::NEVER.0
    }

    /// Number of whole `period`s that have fully elapsed when an event due at
    /// `self` is observed at `now`, counting the due event itself.
    ///
    /// Returns 0 while `self` is still in the future.
    #[inline]
    pub fn periods_elapsed(self, now: Cycles, period: Cycles) -> i64 {
        debug_assert!(period.0 > 0, "period must be positive");
        if now < self {
            0
        } else {
            (now.0 - self.0) / period.0 + 1
        }
    }

    /// Saturating addition, used when scheduling relative to the sentinel
    #[inline]
    pub fn saturating_add(self, rhs: Cycles) -> Cycles {
        Cycles(self.0.saturating_add(rhs.0).min(Self::NEVER.0))
    }
}

impl Add for Cycles {
    type Output = Cycles;

    #[inline]
    fn add(self, rhs: Cycles) -> Cycles {
        Cycles(self.0 + rhs.0)
    }
}

impl AddAssign for Cycles {
    #[inline]
    fn add_assign(&mut self, rhs: Cycles) {
        self.0 += rhs.0;
    }
}

impl Sub for Cycles {
    type Output = Cycles;

    #[inline]
    fn sub(self, rhs: Cycles) -> Cycles {
        Cycles(self.0 - rhs.0)
    }
}

impl Mul<i64> for Cycles {
    type Output = Cycles;

    #[inline]
    fn mul(self, count: i64) -> Cycles {
        Cycles(self.0 * count)
    }
}

impl fmt::Display for Cycles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_never() {
            return f.write_str("never");
        }
        let frac = self.0 & (ONE_CLOCK - 1);
        write!(f, "{}+{}/256", self.whole_clocks(), frac)
    }
}
