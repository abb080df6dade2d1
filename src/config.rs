//! Chip configuration
//!
//! Clock, output rate, stereo wiring and master volume, loadable from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ym2149::chip::cycles_per_sample;
use crate::ym2149::StereoMix;
use crate::{Result, Ym2149Error};

/// Atari ST PSG clock
pub const DEFAULT_CLOCK_HZ: u32 = 2_000_000;

/// Default host output rate
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Construction parameters for [`Ym2149`](crate::Ym2149)
///
/// Missing JSON fields fall back to the defaults:
///
/// ```
/// use ym2149_psg::{ChipConfig, StereoMix};
///
/// let config = ChipConfig::from_json(r#"{ "clock_hz": 1773400, "stereo": "acb" }"#).unwrap();
/// assert_eq!(config.clock_hz, 1_773_400);
/// assert_eq!(config.sample_rate, 44_100);
/// assert_eq!(config.stereo, StereoMix::Acb);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChipConfig {
    /// Master clock in Hz
    pub clock_hz: u32,
    /// Host sample rate in Hz
    pub sample_rate: u32,
    /// Channel-to-ear wiring
    pub stereo: StereoMix,
    /// Master volume in `[-1.0, 1.0]`; negative inverts polarity
    pub volume: f32,
}

impl Default for ChipConfig {
    fn default() -> Self {
        Self {
            clock_hz: DEFAULT_CLOCK_HZ,
            sample_rate: DEFAULT_SAMPLE_RATE,
            stereo: StereoMix::default(),
            volume: 1.0,
        }
    }
}

impl ChipConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ChipConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that the clock and rate are representable and the volume is in range
    pub fn validate(&self) -> Result<()> {
        cycles_per_sample(self.clock_hz, self.sample_rate)?;
        if !(-1.0..=1.0).contains(&self.volume) {
            return Err(Ym2149Error::ConfigError(format!(
                "volume {} outside [-1.0, 1.0]",
                self.volume
            )));
        }
        Ok(())
    }
}
