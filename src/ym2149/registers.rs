//! PSG Register Definitions
//!
//! Defines the 16 registers (R0-R13, R14-R15 for I/O ports) that form the
//! only externally visible bus of the chip, together with the per-register
//! bit widths that every write is masked to.

use std::fmt;

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

/// Number of addressable registers
pub const NUM_REGISTERS: usize = 16;

/// Number of sound registers accepted by a bulk load (R0-R13)
pub const NUM_SOUND_REGISTERS: usize = 14;

/// Per-register bit masks (8,4,8,4,8,4,5,8,5,5,5,8,8,4,8,8 bits)
pub const REG_MASK: [u8; NUM_REGISTERS] = [
    0xFF, 0x0F, 0xFF, 0x0F, 0xFF, 0x0F, 0x1F, 0xFF, 0x1F, 0x1F, 0x1F, 0xFF, 0xFF, 0x0F, 0xFF,
    0xFF,
];

/// Register image after power-up or [`reset`](super::Ym2149::reset).
///
/// Periods sit at their maximum, all mixer outputs are off and every volume
/// is zero, which mirrors the generator reset state.
pub const POWER_UP_REGISTERS: [u8; NUM_REGISTERS] = [
    0xFF, 0x0F, 0xFF, 0x0F, 0xFF, 0x0F, 0x1F, 0x3F, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0x00, 0x00,
    0x00,
];

/// PSG Register Address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive)]
pub enum Register {
    /// Channel A period (low byte) - R0
    ChAPeriodLo = 0x00,
    /// Channel A period (high nibble) - R1
    ChAPeriodHi = 0x01,
    /// Channel B period (low byte) - R2
    ChBPeriodLo = 0x02,
    /// Channel B period (high nibble) - R3
    ChBPeriodHi = 0x03,
    /// Channel C period (low byte) - R4
    ChCPeriodLo = 0x04,
    /// Channel C period (high nibble) - R5
    ChCPeriodHi = 0x05,
    /// Noise period - R6
    NoisePeriod = 0x06,
    /// Mixer control (enable/disable tone and noise) - R7
    MixerCtrl = 0x07,
    /// Channel A volume / envelope select - R8
    ChAVolume = 0x08,
    /// Channel B volume / envelope select - R9
    ChBVolume = 0x09,
    /// Channel C volume / envelope select - R10
    ChCVolume = 0x0A,
    /// Envelope period (low byte) - R11
    EnvelopePeriodLo = 0x0B,
    /// Envelope period (high byte) - R12
    EnvelopePeriodHi = 0x0C,
    /// Envelope shape - R13
    EnvelopeShape = 0x0D,
    /// I/O Port A - R14
    PortA = 0x0E,
    /// I/O Port B - R15
    PortB = 0x0F,
}

impl Register {
    /// Decode an address; only the low 4 bits are wired, so 0x10 aliases R0
    pub fn from_addr(addr: u8) -> Self {
        match Register::from_u8(addr & 0x0F) {
            Some(register) => register,
            None => unreachable!("4-bit address always maps to a register"),
        }
    }

    /// Register address value
    pub fn addr(self) -> u8 {
        self as u8
    }

    /// Bit mask applied to values written to this register
    #[inline]
    pub fn mask(self) -> u8 {
        REG_MASK[self as usize]
    }

    /// Tone channel owning a period or volume register
    pub fn channel(self) -> Option<usize> {
        match self {
            Register::ChAPeriodLo | Register::ChAPeriodHi | Register::ChAVolume => Some(0),
            Register::ChBPeriodLo | Register::ChBPeriodHi | Register::ChBVolume => Some(1),
            Register::ChCPeriodLo | Register::ChCPeriodHi | Register::ChCVolume => Some(2),
            _ => None,
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Register::ChAPeriodLo => write!(f, "R0 (Channel A Period Low)"),
            Register::ChAPeriodHi => write!(f, "R1 (Channel A Period High)"),
            Register::ChBPeriodLo => write!(f, "R2 (Channel B Period Low)"),
            Register::ChBPeriodHi => write!(f, "R3 (Channel B Period High)"),
            Register::ChCPeriodLo => write!(f, "R4 (Channel C Period Low)"),
            Register::ChCPeriodHi => write!(f, "R5 (Channel C Period High)"),
            Register::NoisePeriod => write!(f, "R6 (Noise Period)"),
            Register::MixerCtrl => write!(f, "R7 (Mixer Control)"),
            Register::ChAVolume => write!(f, "R8 (Channel A Volume)"),
            Register::ChBVolume => write!(f, "R9 (Channel B Volume)"),
            Register::ChCVolume => write!(f, "R10 (Channel C Volume)"),
            Register::EnvelopePeriodLo => write!(f, "R11 (Envelope Period Low)"),
            Register::EnvelopePeriodHi => write!(f, "R12 (Envelope Period High)"),
            Register::EnvelopeShape => write!(f, "R13 (Envelope Shape)"),
            Register::PortA => write!(f, "R14 (I/O Port A)"),
            Register::PortB => write!(f, "R15 (I/O Port B)"),
        }
    }
}

/// Raw register bank (16 bytes), always holding masked values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterBank {
    registers: [u8; NUM_REGISTERS],
}

impl RegisterBank {
    /// Create a register bank holding the power-up image
    pub fn new() -> Self {
        RegisterBank {
            registers: POWER_UP_REGISTERS,
        }
    }

    /// Read a register value
    #[inline]
    pub fn read(&self, register: Register) -> u8 {
        self.registers[register as usize]
    }

    /// Mask and store a value.
    ///
    /// Returns the stored value when it differs from the previous contents,
    /// `None` when the write repeated what was already there.
    #[inline]
    pub fn write(&mut self, register: Register, value: u8) -> Option<u8> {
        let value = value & register.mask();
        let slot = &mut self.registers[register as usize];
        if *slot == value {
            None
        } else {
            *slot = value;
            Some(value)
        }
    }

    /// Combined 12-bit tone period of a channel
    #[inline]
    pub fn tone_period(&self, channel: usize) -> u16 {
        let base = channel * 2;
        (u16::from(self.registers[base + 1]) << 8) | u16::from(self.registers[base])
    }

    /// Combined 16-bit envelope period
    #[inline]
    pub fn envelope_period(&self) -> u16 {
        (u16::from(self.registers[12]) << 8) | u16::from(self.registers[11])
    }

    /// Get all registers as a slice
    pub fn as_slice(&self) -> &[u8; NUM_REGISTERS] {
        &self.registers
    }

    /// Restore the power-up image
    pub fn reset(&mut self) {
        self.registers = POWER_UP_REGISTERS;
    }
}

impl Default for RegisterBank {
    fn default() -> Self {
        Self::new()
    }
}
