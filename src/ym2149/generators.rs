//! Tone and noise generators
//!
//! Each generator is event driven: instead of counting master-clock ticks it
//! remembers when its next state change is due and how far apart consecutive
//! changes are. The scheduler services whichever relevant generator is due
//! first.

use super::cycles::Cycles;
use super::scheduler::Oscillator;

/// Number of tone channels
pub const NUM_CHANNELS: usize = 3;

/// Master clocks per square-wave toggle for a period value of 1
/// (a full square period is two toggles, 16 clocks).
pub const TONE_PREDIVIDER: i64 = 8;

/// Master clocks per LFSR shift for a period value of 1
pub const NOISE_PREDIVIDER: i64 = 16;

/// Largest 12-bit tone period
pub const MAX_TONE_PERIOD: u16 = 0x0FFF;

/// Largest 5-bit noise period
pub const MAX_NOISE_PERIOD: u8 = 0x1F;

/// LFSR power-up value; any non-zero value avoids the all-zero lock-up
pub const NOISE_SEED: u32 = 0x1_FFFF;

const LFSR_MASK: u32 = 0x1_FFFF;

/// Reload interval for a raw period register value, treating 0 as 1
#[inline]
fn reload_for(period: u32, predivider: i64) -> Cycles {
    Cycles::from_clocks(i64::from(period.max(1)) * predivider)
}

/// Pull a pending event in when a shorter period makes it due sooner.
///
/// The hardware counter compares against the period on every tick, so a
/// period that shrinks below the current count fires on the next tick.
#[inline]
fn clamp_next_event(next_event: &mut Cycles, now: Cycles, reload: Cycles) {
    let limit = now + reload;
    if *next_event > limit {
        *next_event = limit;
    }
}

/// One square-wave tone channel together with its mixer and volume state
#[derive(Clone, Debug)]
pub struct ToneChannel {
    reload: Cycles,
    next_event: Cycles,
    tone_enabled: bool,
    square: bool,
    noise_enabled: bool,
    volume: u8,
}

impl ToneChannel {
    /// Create a channel in its reset state at time zero
    pub fn new() -> Self {
        let mut channel = Self {
            reload: Cycles::ZERO,
            next_event: Cycles::ZERO,
            tone_enabled: false,
            square: false,
            noise_enabled: false,
            volume: 0,
        };
        channel.reset(Cycles::ZERO);
        channel
    }

    /// Set the 12-bit period (0 behaves as 1)
    #[inline]
    pub fn set_period(&mut self, now: Cycles, period: u16) {
        self.reload = reload_for(u32::from(period & MAX_TONE_PERIOD), TONE_PREDIVIDER);
        clamp_next_event(&mut self.next_event, now, self.reload);
    }

    /// Set the 5-bit volume field; bit 4 selects the envelope
    #[inline]
    pub fn set_volume(&mut self, volume: u8) {
        self.volume = volume & 0x1F;
    }

    /// Apply this channel's tone/noise enables
    #[inline]
    pub fn set_mixer(&mut self, tone_enabled: bool, noise_enabled: bool) {
        self.tone_enabled = tone_enabled;
        self.noise_enabled = noise_enabled;
    }

    /// Interval between two toggles
    #[inline]
    pub fn reload(&self) -> Cycles {
        self.reload
    }

    /// Whether the tone output is routed to the channel
    #[inline]
    pub fn tone_enabled(&self) -> bool {
        self.tone_enabled
    }

    /// Whether the noise output is routed to the channel
    #[inline]
    pub fn noise_enabled(&self) -> bool {
        self.noise_enabled
    }

    /// Current square-wave level
    #[inline]
    pub fn square(&self) -> bool {
        self.square
    }

    /// Raw 5-bit volume field
    #[inline]
    pub fn volume(&self) -> u8 {
        self.volume
    }

    /// Whether the envelope overrides the fixed volume
    #[inline]
    pub fn uses_envelope(&self) -> bool {
        self.volume & 0x10 != 0
    }

    /// Volume table index given the shared envelope level
    #[inline]
    pub fn level_index(&self, envelope_level: u8) -> usize {
        if self.uses_envelope() {
            envelope_level as usize
        } else {
            (self.volume & 0x0F) as usize
        }
    }

    /// Whether the channel passes its level given the current noise bit.
    ///
    /// A disabled source counts as permanently high.
    #[inline]
    pub fn gate(&self, noise_bit: bool) -> bool {
        (self.square || !self.tone_enabled) && (noise_bit || !self.noise_enabled)
    }

    /// Reset to power-up state: muted, silent, slowest period
    pub fn reset(&mut self, now: Cycles) {
        self.tone_enabled = false;
        self.noise_enabled = false;
        self.volume = 0;
        self.square = false;
        self.reload = reload_for(u32::from(MAX_TONE_PERIOD), TONE_PREDIVIDER);
        self.next_event = now + self.reload;
    }

    /// Shift the schedule after the time axis has been rebased
    pub(crate) fn rebase(&mut self, offset: Cycles) {
        self.next_event = self.next_event - offset;
    }
}

impl Default for ToneChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl Oscillator for ToneChannel {
    #[inline]
    fn next_event(&self) -> Cycles {
        self.next_event
    }

    #[inline]
    fn step(&mut self) {
        self.square = !self.square;
        self.next_event += self.reload;
    }

    #[inline]
    fn skip_ahead(&mut self, now: Cycles) {
        let periods = self.next_event.periods_elapsed(now, self.reload);
        if periods > 0 {
            self.next_event += self.reload * periods;
            if periods & 1 == 1 {
                self.square = !self.square;
            }
        }
        debug_assert!(self.next_event > now);
    }
}

/// Noise generator using a 17-bit LFSR shared by all three channels
#[derive(Clone, Debug)]
pub struct NoiseGenerator {
    reload: Cycles,
    next_event: Cycles,
    lfsr: u32,
}

impl NoiseGenerator {
    /// Create a noise generator in its reset state at time zero
    pub fn new() -> Self {
        let mut noise = Self {
            reload: Cycles::ZERO,
            next_event: Cycles::ZERO,
            lfsr: NOISE_SEED,
        };
        noise.reset(Cycles::ZERO);
        noise
    }

    /// Set the 5-bit period (0 behaves as 1)
    #[inline]
    pub fn set_period(&mut self, now: Cycles, period: u8) {
        self.reload = reload_for(u32::from(period & MAX_NOISE_PERIOD), NOISE_PREDIVIDER);
        clamp_next_event(&mut self.next_event, now, self.reload);
    }

    /// Interval between two shifts
    #[inline]
    pub fn reload(&self) -> Cycles {
        self.reload
    }

    /// Audible noise output (bit 0 of the shift register)
    #[inline]
    pub fn output(&self) -> bool {
        self.lfsr & 1 != 0
    }

    /// Raw shift register contents
    #[inline]
    pub fn lfsr(&self) -> u32 {
        self.lfsr
    }

    /// Reset to power-up state
    pub fn reset(&mut self, now: Cycles) {
        self.lfsr = NOISE_SEED;
        self.reload = reload_for(u32::from(MAX_NOISE_PERIOD), NOISE_PREDIVIDER);
        self.next_event = now + self.reload;
    }

    pub(crate) fn rebase(&mut self, offset: Cycles) {
        self.next_event = self.next_event - offset;
    }
}

impl Default for NoiseGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Oscillator for NoiseGenerator {
    #[inline]
    fn next_event(&self) -> Cycles {
        self.next_event
    }

    #[inline]
    fn step(&mut self) {
        let feedback = (self.lfsr ^ (self.lfsr >> 2)) & 1;
        self.lfsr = ((self.lfsr >> 1) | (feedback << 16)) & LFSR_MASK;
        debug_assert!(self.lfsr != 0, "noise LFSR reached the all-zero state");
        self.next_event += self.reload;
    }

    /// Only the schedule moves: nothing observes the register while noise is
    /// routed to no channel.
    #[inline]
    fn skip_ahead(&mut self, now: Cycles) {
        let periods = self.next_event.periods_elapsed(now, self.reload);
        if periods > 0 {
            self.next_event += self.reload * periods;
        }
        debug_assert!(self.next_event > now);
    }
}
