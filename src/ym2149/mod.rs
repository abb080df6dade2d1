//! YM2149 PSG Emulation Domain
//!
//! Event-driven emulation of the Yamaha YM2149 / General Instrument AY-3-8912
//! Programmable Sound Generator: three square-wave tone channels, one noise
//! generator and one envelope generator on a shared fixed-point time axis,
//! integrated into host samples by a box-filter resampler.
//!
//! Implementation:
//! - `cycles` - 24.8 fixed-point chip time
//! - `registers` - register file with per-register masks
//! - `generators` - tone channels and the noise LFSR
//! - `envelope` - 16-step envelope state machine
//! - `mixer` - R7 routing, stereo wiring and the volume law
//! - `scheduler` - event loop and resampler
//! - `chip` - public facade

// Internal modules
pub mod chip;
pub mod cycles;
pub mod envelope;
pub mod generators;
pub mod mixer;
pub mod registers;
pub mod scheduler;

// Re-export public API
pub use chip::{cycles_per_sample, Ym2149, ENVELOPE_SHAPE_UNCHANGED};
pub use cycles::Cycles;
pub use envelope::EnvelopeShape;
pub use mixer::{log_volume_curve, MixerFlags, StereoMix};
pub use registers::{
    Register, RegisterBank, NUM_REGISTERS, NUM_SOUND_REGISTERS, POWER_UP_REGISTERS, REG_MASK,
};
pub use scheduler::GeneratorId;
