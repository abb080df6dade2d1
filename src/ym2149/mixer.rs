//! Output stage
//!
//! Combines the three channels according to the mixer control register (R7)
//! and the selected stereo wiring, using a logarithmic volume law.
//!
//! The per-channel levels are pre-scaled by the stereo weights and by
//! `2^OUTPUT_SHIFT / cycles_per_sample`. Integrating a level over a sample's
//! worth of chip time therefore yields the output sample shifted left by
//! [`OUTPUT_SHIFT`], and the render loop only multiplies and adds.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::cycles::Cycles;
use super::generators::NUM_CHANNELS;
use crate::Ym2149Error;

/// Fractional bits carried by the sample accumulator
pub const OUTPUT_SHIFT: u32 = 24;

/// Attenuation between two consecutive volume steps (about 2.5 dB)
pub const STEP_ATTENUATION: f64 = 0.75;

/// Number of volume steps
pub const VOLUME_STEPS: usize = 16;

/// Denominator of the channel-to-ear weights
const WEIGHT_SCALE: f64 = 12.0;

bitflags! {
    /// Mixer Control Register (R7) bitflags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MixerFlags: u8 {
        /// Channel A tone enable (1 = disable, 0 = enable)
        const CH_A_TONE = 0x01;
        /// Channel B tone enable
        const CH_B_TONE = 0x02;
        /// Channel C tone enable
        const CH_C_TONE = 0x04;
        /// Channel A noise enable (1 = disable, 0 = enable)
        const CH_A_NOISE = 0x08;
        /// Channel B noise enable
        const CH_B_NOISE = 0x10;
        /// Channel C noise enable
        const CH_C_NOISE = 0x20;
    }
}

impl MixerFlags {
    /// Create mixer flags from raw register value
    pub fn from_register(value: u8) -> Self {
        MixerFlags::from_bits_truncate(value)
    }

    /// Check if tone is routed to a channel (inverted register logic)
    pub fn tone_enabled(&self, channel: usize) -> bool {
        !self.contains(MixerFlags::from_bits_truncate(1 << channel))
    }

    /// Check if noise is routed to a channel (inverted register logic)
    pub fn noise_enabled(&self, channel: usize) -> bool {
        !self.contains(MixerFlags::from_bits_truncate(8 << channel))
    }
}

/// Channel-to-ear wiring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StereoMix {
    /// All three channels summed into one output
    #[default]
    Mono,
    /// A left, B centre, C right
    Abc,
    /// A left, C centre, B right
    Acb,
}

impl StereoMix {
    /// Interleaved output values per sample
    pub fn channels(self) -> usize {
        match self {
            StereoMix::Mono => 1,
            StereoMix::Abc | StereoMix::Acb => 2,
        }
    }

    /// (left, right) weights in twelfths for each channel
    fn weights(self) -> [[u8; 2]; NUM_CHANNELS] {
        match self {
            StereoMix::Mono => [[4, 4], [4, 4], [4, 4]],
            StereoMix::Abc => [[6, 2], [4, 4], [2, 6]],
            StereoMix::Acb => [[6, 2], [2, 6], [4, 4]],
        }
    }

    /// Lowercase name as used in configuration files
    pub fn as_str(self) -> &'static str {
        match self {
            StereoMix::Mono => "mono",
            StereoMix::Abc => "abc",
            StereoMix::Acb => "acb",
        }
    }
}

impl fmt::Display for StereoMix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StereoMix {
    type Err = Ym2149Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "mono" => Ok(StereoMix::Mono),
            "abc" => Ok(StereoMix::Abc),
            "acb" => Ok(StereoMix::Acb),
            other => Err(Ym2149Error::ConfigError(format!(
                "unknown stereo mode '{other}' (expected mono, abc or acb)"
            ))),
        }
    }
}

/// Logarithmic volume law relative to full scale.
///
/// Each step attenuates the one above it, starting from full scale, so step 15
/// sits at 0.75 and step 1 at 0.75^15 (about 1.34%). Step 0 is silent.
pub fn log_volume_curve() -> [f64; VOLUME_STEPS] {
    let mut curve = [0.0; VOLUME_STEPS];
    let mut level = 1.0;
    for slot in curve.iter_mut().skip(1).rev() {
        level *= STEP_ATTENUATION;
        *slot = level;
    }
    curve
}

/// Pre-scaled levels indexed by `[ear][channel][volume step]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeTable {
    levels: [[[i64; VOLUME_STEPS]; NUM_CHANNELS]; 2],
}

impl VolumeTable {
    /// Build the table for a master volume, wiring and sample width
    pub fn build(volume: f32, stereo: StereoMix, cycles_per_sample: Cycles) -> Self {
        debug_assert!(cycles_per_sample.raw() > 0);
        let curve = log_volume_curve();
        let full_scale = f64::from(volume) * f64::from(i16::MAX);
        let per_cycle = (1i64 << OUTPUT_SHIFT) as f64 / cycles_per_sample.raw() as f64;

        let mut levels = [[[0i64; VOLUME_STEPS]; NUM_CHANNELS]; 2];
        for (channel, ears) in stereo.weights().iter().enumerate() {
            for (ear, &weight) in ears.iter().enumerate() {
                let gain = full_scale * f64::from(weight) / WEIGHT_SCALE * per_cycle;
                for (step, &amplitude) in curve.iter().enumerate() {
                    levels[ear][channel][step] = (amplitude * gain).round() as i64;
                }
            }
        }
        Self { levels }
    }

    /// Pre-scaled level of one channel at one volume step
    #[inline]
    pub fn level(&self, ear: usize, channel: usize, step: usize) -> i64 {
        self.levels[ear][channel][step]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mixer_flags() {
        let flags = MixerFlags::from_register(0x00);
        for channel in 0..NUM_CHANNELS {
            assert!(flags.tone_enabled(channel));
            assert!(flags.noise_enabled(channel));
        }
    }

    #[test]
    fn test_mixer_flags_disabled() {
        let flags = MixerFlags::from_register(0xFF);
        for channel in 0..NUM_CHANNELS {
            assert!(!flags.tone_enabled(channel));
            assert!(!flags.noise_enabled(channel));
        }
    }

    #[test]
    fn test_mixer_flags_mixed() {
        // Tone A and noise C on
        let flags = MixerFlags::from_register(0b01_1110);
        assert!(flags.tone_enabled(0));
        assert!(!flags.tone_enabled(1));
        assert!(!flags.noise_enabled(0));
        assert!(flags.noise_enabled(2));
    }

    #[test]
    fn test_volume_curve() {
        let curve = log_volume_curve();
        assert_eq!(curve[0], 0.0);
        assert_relative_eq!(curve[15], 0.75);
        assert_relative_eq!(curve[14], 0.75 * 0.75);
        assert_relative_eq!(curve[1], 0.75f64.powi(15), epsilon = 1e-12);
        for i in 2..VOLUME_STEPS {
            assert!(curve[i] > curve[i - 1]);
        }
    }

    #[test]
    fn test_lowest_step_is_about_one_percent() {
        let curve = log_volume_curve();
        let percent = curve[1] * 100.0;
        assert!((1.30..1.40).contains(&percent), "step 1 at {percent}%");
    }

    #[test]
    fn test_full_sample_integrates_to_top_step() {
        let cps = Cycles::from_clocks(20);
        let table = VolumeTable::build(1.0, StereoMix::Mono, cps);
        let sum: i64 = (0..NUM_CHANNELS).map(|ch| table.level(0, ch, 15)).sum();
        let sample = (sum * cps.raw()) >> OUTPUT_SHIFT;
        let expected = (f64::from(i16::MAX) * STEP_ATTENUATION).round() as i64;
        assert!((sample - expected).abs() <= 1, "sample {sample}");
    }

    #[test]
    fn test_stereo_weights_sum_to_full_scale_per_ear() {
        for stereo in [StereoMix::Mono, StereoMix::Abc, StereoMix::Acb] {
            for ears in [0usize, 1] {
                let total: u32 = stereo.weights().iter().map(|w| u32::from(w[ears])).sum();
                assert_eq!(total, 12, "{stereo} ear {ears}");
            }
        }
    }

    #[test]
    fn test_negative_volume_inverts() {
        let cps = Cycles::from_clocks(40);
        let positive = VolumeTable::build(0.5, StereoMix::Abc, cps);
        let negative = VolumeTable::build(-0.5, StereoMix::Abc, cps);
        assert_eq!(positive.level(1, 2, 9), -negative.level(1, 2, 9));
    }

    #[test]
    fn test_stereo_parse() {
        assert_eq!("ABC".parse::<StereoMix>().unwrap(), StereoMix::Abc);
        assert_eq!("mono".parse::<StereoMix>().unwrap(), StereoMix::Mono);
        assert!("left".parse::<StereoMix>().is_err());
        assert_eq!(StereoMix::Acb.channels(), 2);
    }
}
