//! Envelope Generator
//!
//! A 16-step ramp generator shared by the three channels. Register R13 holds
//! four flag bits (continue, attack, alternate, hold). The hardware treats
//! every code with *continue* clear like a continuing code that holds at zero,
//! so the 16 register values collapse onto 8 canonical waveforms.
//!
//! The generator steps once per `16 × period` master clocks. When a ramp
//! reaches either end, the hold/alternate pair decides what happens next:
//!
//! | hold | alternate | at the boundary                      |
//! |------|-----------|--------------------------------------|
//! | 1    | 0         | reflect the index and park           |
//! | 1    | 1         | park without reflecting              |
//! | 0    | 1         | reflect and reverse (triangle)       |
//! | 0    | 0         | wrap to the opposite end (sawtooth)  |
//!
//! A parked envelope schedules itself at [`Cycles::NEVER`] so it never
//! constrains the scheduler.

use std::fmt;

use super::cycles::Cycles;
use super::scheduler::Oscillator;

/// Master clocks per envelope step for a period value of 1
pub const ENVELOPE_PREDIVIDER: i64 = 16;

/// Highest envelope level
pub const MAX_LEVEL: u8 = 15;

/// Length of one full continuous pattern (two ramps)
const PATTERN_STEPS: i64 = 32;

/// Envelope Shape Control - Register R13, canonical form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvelopeShape {
    /// 1000: `\\\\` repeating decay (buzzer)
    SawtoothDown = 0x08,
    /// 1001: `\___` decay then hold at zero (also codes 0x00-0x03)
    DecayHold = 0x09,
    /// 1010: `\/\/` triangle starting with a decay
    TriangleDown = 0x0A,
    /// 1011: `\‾‾‾` decay then hold at maximum
    DecayHoldHigh = 0x0B,
    /// 1100: `////` repeating attack (buzzer)
    SawtoothUp = 0x0C,
    /// 1101: `/‾‾‾` attack then hold at maximum
    AttackHold = 0x0D,
    /// 1110: `/\/\` triangle starting with an attack
    TriangleUp = 0x0E,
    /// 1111: `/___` attack then drop and hold at zero (also codes 0x04-0x07)
    AttackHoldLow = 0x0F,
}

impl EnvelopeShape {
    /// All canonical shapes in register order
    pub const ALL: [EnvelopeShape; 8] = [
        EnvelopeShape::SawtoothDown,
        EnvelopeShape::DecayHold,
        EnvelopeShape::TriangleDown,
        EnvelopeShape::DecayHoldHigh,
        EnvelopeShape::SawtoothUp,
        EnvelopeShape::AttackHold,
        EnvelopeShape::TriangleUp,
        EnvelopeShape::AttackHoldLow,
    ];

    /// Decode a raw R13 value, folding non-continuing codes onto their
    /// continuing equivalents
    pub fn from_register(value: u8) -> Self {
        match value & 0x0F {
            0x00..=0x03 | 0x09 => EnvelopeShape::DecayHold,
            0x04..=0x07 | 0x0F => EnvelopeShape::AttackHoldLow,
            0x08 => EnvelopeShape::SawtoothDown,
            0x0A => EnvelopeShape::TriangleDown,
            0x0B => EnvelopeShape::DecayHoldHigh,
            0x0C => EnvelopeShape::SawtoothUp,
            0x0D => EnvelopeShape::AttackHold,
            _ => EnvelopeShape::TriangleUp,
        }
    }

    /// Register code of the canonical shape
    pub fn code(self) -> u8 {
        self as u8
    }

    /// First ramp rises
    pub fn attack(self) -> bool {
        self.code() & 0x04 != 0
    }

    /// Ramps alternate direction
    pub fn alternate(self) -> bool {
        self.code() & 0x02 != 0
    }

    /// Envelope parks after the first ramp
    pub fn hold(self) -> bool {
        self.code() & 0x01 != 0
    }
}

impl fmt::Display for EnvelopeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvelopeShape::SawtoothDown => write!(f, "Sawtooth-Down (Buzzer)"),
            EnvelopeShape::DecayHold => write!(f, "Decay-Hold"),
            EnvelopeShape::TriangleDown => write!(f, "Triangle (Decay first)"),
            EnvelopeShape::DecayHoldHigh => write!(f, "Decay-Hold-High"),
            EnvelopeShape::SawtoothUp => write!(f, "Sawtooth-Up (Buzzer)"),
            EnvelopeShape::AttackHold => write!(f, "Attack-Hold"),
            EnvelopeShape::TriangleUp => write!(f, "Triangle (Attack first)"),
            EnvelopeShape::AttackHoldLow => write!(f, "Attack-Hold-Low"),
        }
    }
}

/// Envelope Generator
#[derive(Debug, Clone)]
pub struct EnvelopeGenerator {
    reload: Cycles,
    next_event: Cycles,
    index: u8,
    direction: i8,
    hold: bool,
    alternate: bool,
}

impl EnvelopeGenerator {
    /// Create a parked envelope generator
    pub fn new() -> Self {
        let mut envelope = Self {
            reload: Cycles::ZERO,
            next_event: Cycles::NEVER,
            index: 0,
            direction: 0,
            hold: true,
            alternate: false,
        };
        envelope.reset();
        envelope
    }

    /// Set the 16-bit period (0 behaves as 1)
    pub fn set_period(&mut self, now: Cycles, period: u16) {
        self.reload = Cycles::from_clocks(i64::from(period.max(1)) * ENVELOPE_PREDIVIDER);
        if self.direction != 0 {
            let limit = now + self.reload;
            if self.next_event > limit {
                self.next_event = limit;
            }
        }
    }

    /// Select a shape and restart the ramp.
    ///
    /// Always restarts, even when the shape is unchanged.
    pub fn set_shape(&mut self, now: Cycles, value: u8) {
        let shape = EnvelopeShape::from_register(value);
        self.hold = shape.hold();
        self.alternate = shape.alternate();
        if shape.attack() {
            self.index = 0;
            self.direction = 1;
        } else {
            self.index = MAX_LEVEL;
            self.direction = -1;
        }
        self.next_event = now + self.reload;
    }

    /// Current level (0-15)
    #[inline]
    pub fn level(&self) -> u8 {
        self.index
    }

    /// Current stepping direction (-1, 0 when parked, +1)
    #[inline]
    pub fn direction(&self) -> i8 {
        self.direction
    }

    /// Whether the envelope has stopped stepping
    #[inline]
    pub fn is_parked(&self) -> bool {
        self.direction == 0
    }

    /// Interval between two steps
    #[inline]
    pub fn reload(&self) -> Cycles {
        self.reload
    }

    /// Reset to power-up state: parked at zero with the slowest period
    pub fn reset(&mut self) {
        self.index = 0;
        self.direction = 0;
        self.hold = true;
        self.alternate = false;
        self.reload = Cycles::from_clocks(i64::from(u16::MAX) * ENVELOPE_PREDIVIDER);
        self.next_event = Cycles::NEVER;
    }

    pub(crate) fn rebase(&mut self, offset: Cycles) {
        if !self.next_event.is_never() {
            self.next_event = self.next_event - offset;
        }
    }

    /// Move the index one step and apply the boundary rule
    #[inline]
    fn advance_index(&mut self) {
        let next = self.index as i8 + self.direction;
        if (0..=MAX_LEVEL as i8).contains(&next) {
            self.index = next as u8;
            return;
        }

        let wrapped = (next & 0x0F) as u8;
        if self.hold {
            self.index = if self.alternate {
                wrapped
            } else {
                wrapped ^ MAX_LEVEL
            };
            self.direction = 0;
        } else if self.alternate {
            self.index = wrapped ^ MAX_LEVEL;
            self.direction = -self.direction;
        } else {
            self.index = wrapped;
        }
        debug_assert!(self.index <= MAX_LEVEL);
    }
}

impl Default for EnvelopeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Oscillator for EnvelopeGenerator {
    #[inline]
    fn next_event(&self) -> Cycles {
        self.next_event
    }

    #[inline]
    fn step(&mut self) {
        self.advance_index();
        if self.is_parked() {
            self.next_event = Cycles::NEVER;
        } else {
            self.next_event += self.reload;
        }
    }

    fn skip_ahead(&mut self, now: Cycles) {
        let periods = self.next_event.periods_elapsed(now, self.reload);
        if periods == 0 {
            return;
        }
        self.next_event += self.reload * periods;

        // Continuous shapes repeat every 32 steps; holding shapes park within 32
        let steps = if self.hold {
            periods.min(PATTERN_STEPS)
        } else {
            periods % PATTERN_STEPS
        };
        for _ in 0..steps {
            self.advance_index();
            if self.is_parked() {
                self.next_event = Cycles::NEVER;
                break;
            }
        }
        debug_assert!(self.next_event > now);
    }
}
