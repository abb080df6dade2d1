//! YM2149 / AY-3-8912 PSG Emulator
//!
//! An event-driven emulator of the Yamaha YM2149 and General Instrument
//! AY-3-8912 Programmable Sound Generators. Instead of ticking every master
//! clock, each generator keeps the chip time of its next state change and the
//! scheduler jumps from event to event, integrating the mixed output over
//! every host sample. The result is exact box-filtered audio at any clock and
//! sample rate, with cost proportional to the number of audible events.
//!
//! # Features
//! - Three tone channels, 17-bit noise LFSR, all 16 envelope shapes
//! - 24.8 fixed-point time axis with sub-clock sample boundaries
//! - Mono, ABC and ACB stereo wiring with a logarithmic volume law
//! - Register-level API plus convenience period setters and bulk loads
//! - Thread-safe shared handle and WAV export
//!
//! # Backend Trait
//! The `Ym2149Backend` trait lets the owned chip and the shared handle be
//! driven through one interface (the WAV exporter accepts either).
//!
//! # Quick start
//! ```
//! use ym2149_psg::{ChipConfig, StereoMix, Ym2149};
//!
//! let config = ChipConfig {
//!     stereo: StereoMix::Abc,
//!     ..ChipConfig::default()
//! };
//! let mut chip = Ym2149::new(config).unwrap();
//! chip.write_register(0x07, 0x3E); // Enable tone A
//! chip.set_tone_period(0, 0x11C); // A4 at 2 MHz
//! chip.write_register(0x08, 0x0F); // Max volume
//!
//! // One 50 Hz frame of interleaved stereo
//! let mut frame = vec![0i16; 882 * 2];
//! assert_eq!(chip.render(&mut frame, 882), 882);
//! ```

#![warn(missing_docs)]

// Domain modules
pub mod backend; // Backend trait abstraction
pub mod config; // Chip configuration
pub mod export; // WAV output
pub mod shared; // Thread-safe handle
pub mod ym2149; // PSG emulation (core)

/// Error types for YM2149 emulator operations
///
/// The emulator itself never fails once configured; errors come from
/// configuration and from file output.
#[derive(thiserror::Error, Debug)]
pub enum Ym2149Error {
    /// IO error from filesystem
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON configuration
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Audio file output error
    #[error("Audio file error: {0}")]
    AudioFileError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for Ym2149Error {
    /// Converts a String into `Ym2149Error::Other`.
    ///
    /// Prefer the specific variants (`ConfigError`, `AudioFileError`) where
    /// the failure has a known cause.
    fn from(msg: String) -> Self {
        Ym2149Error::Other(msg)
    }
}

impl From<&str> for Ym2149Error {
    fn from(msg: &str) -> Self {
        Ym2149Error::Other(msg.to_string())
    }
}

impl From<hound::Error> for Ym2149Error {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(io) => Ym2149Error::Io(io),
            other => Ym2149Error::AudioFileError(other.to_string()),
        }
    }
}

/// Result type for emulator operations
pub type Result<T> = std::result::Result<T, Ym2149Error>;

// Public API exports
pub use backend::Ym2149Backend;
pub use config::ChipConfig;
pub use export::{render_to_wav, write_wav};
pub use shared::SharedYm2149;
pub use ym2149::{
    Cycles, EnvelopeShape, GeneratorId, MixerFlags, Register, StereoMix, Ym2149,
    ENVELOPE_SHAPE_UNCHANGED,
};
