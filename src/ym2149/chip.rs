//! YM2149 / AY-3-8912 chip facade
//!
//! Owns the register file, the five generators, the clock configuration and
//! the output stage. Register writes take effect at the current chip time;
//! [`Ym2149::render`] then advances chip time by exactly the requested number
//! of host samples.

use log::{debug, trace};

use super::cycles::{Cycles, ONE_CLOCK};
use super::envelope::EnvelopeShape;
use super::generators::NUM_CHANNELS;
use super::mixer::{MixerFlags, StereoMix, VolumeTable};
use super::registers::{Register, RegisterBank, NUM_REGISTERS, NUM_SOUND_REGISTERS};
use super::scheduler::{GeneratorId, Generators, Resampler, SampleSink};
use crate::config::ChipConfig;
use crate::{Result, Ym2149Error};

/// R13 value in a bulk load meaning "leave the envelope alone"
pub const ENVELOPE_SHAPE_UNCHANGED: u8 = 0xFF;

/// Largest cycles-per-sample value (24 integer bits)
pub const MAX_CYCLES_PER_SAMPLE: i64 = (1 << 24) * ONE_CLOCK;

/// Chip time beyond which a render first rebases the time axis to zero
const REBASE_THRESHOLD: Cycles = Cycles::from_clocks(1 << 40);

/// Width of one host sample in chip time, rounded up so the emulated clock
/// is never slower than requested
pub fn cycles_per_sample(clock_hz: u32, sample_rate: u32) -> Result<Cycles> {
    if clock_hz == 0 {
        return Err(Ym2149Error::ConfigError(
            "chip clock must be non-zero".to_string(),
        ));
    }
    if sample_rate == 0 {
        return Err(Ym2149Error::ConfigError(
            "sample rate must be non-zero".to_string(),
        ));
    }
    let scaled = u64::from(clock_hz) * ONE_CLOCK as u64;
    let raw = scaled.div_ceil(u64::from(sample_rate)) as i64;
    if raw > MAX_CYCLES_PER_SAMPLE {
        return Err(Ym2149Error::ConfigError(format!(
            "{clock_hz} Hz clock at {sample_rate} Hz exceeds the cycle counter range"
        )));
    }
    Ok(Cycles::from_raw(raw))
}

/// YM2149 Programmable Sound Generator emulator
///
/// # Example
///
/// ```
/// use ym2149_psg::{ChipConfig, Ym2149};
///
/// let mut chip = Ym2149::new(ChipConfig::default()).unwrap();
/// chip.write_register(0, 0x1C); // Tone A period low
/// chip.write_register(1, 0x01); // Tone A period high
/// chip.write_register(8, 0x0F); // Volume A
/// chip.write_register(7, 0x3E); // Mixer: tone A on
///
/// let mut buffer = [0i16; 882];
/// assert_eq!(chip.render(&mut buffer, 882), 882);
/// ```
#[derive(Clone)]
pub struct Ym2149 {
    // Clock and output configuration
    clock_hz: u32,
    sample_rate: u32,
    stereo: StereoMix,
    volume: f32,

    // Hardware registers
    registers: RegisterBank,

    // Generators and their shared time axis
    generators: Generators,
    chip_time: Cycles,

    // Output processing
    resampler: Resampler,
    table: VolumeTable,
}

impl Ym2149 {
    /// Create a chip from a validated configuration, in its power-up state
    pub fn new(config: ChipConfig) -> Result<Self> {
        config.validate()?;
        let cps = cycles_per_sample(config.clock_hz, config.sample_rate)?;
        let mut chip = Self {
            clock_hz: config.clock_hz,
            sample_rate: config.sample_rate,
            stereo: config.stereo,
            volume: config.volume,
            registers: RegisterBank::new(),
            generators: Generators::default(),
            chip_time: Cycles::ZERO,
            resampler: Resampler::new(cps),
            table: VolumeTable::build(config.volume, config.stereo, cps),
        };
        chip.reset();
        debug!(
            "ym2149: {} Hz clock, {} Hz output, {} stereo, volume {}, {} per sample",
            chip.clock_hz,
            chip.sample_rate,
            chip.stereo,
            chip.volume,
            cps
        );
        Ok(chip)
    }

    /// Restore power-up registers and generator state; chip time restarts at 0
    pub fn reset(&mut self) {
        self.chip_time = Cycles::ZERO;
        self.registers.reset();
        self.generators.reset(self.chip_time);
        self.resampler.begin(self.chip_time);
        debug!("ym2149: reset");
    }

    /// Write a register.
    ///
    /// The address wraps modulo 16 and the value is masked to the register's
    /// width. Repeating the stored value is ignored, except for R13 which
    /// restarts the envelope on every write.
    pub fn write_register(&mut self, addr: u8, value: u8) {
        let register = Register::from_addr(addr);
        let now = self.chip_time;
        trace!("ym2149: {register} <- {value:#04x} at {now}");

        if register == Register::EnvelopeShape {
            let value = value & register.mask();
            self.registers.write(register, value);
            self.generators.envelope.set_shape(now, value);
            return;
        }

        let Some(value) = self.registers.write(register, value) else {
            return;
        };

        match (register, register.channel()) {
            (Register::ChAVolume | Register::ChBVolume | Register::ChCVolume, Some(channel)) => {
                self.generators.tones[channel].set_volume(value);
            }
            (_, Some(channel)) => {
                let period = self.registers.tone_period(channel);
                self.generators.tones[channel].set_period(now, period);
            }
            (Register::NoisePeriod, None) => {
                self.generators.noise.set_period(now, value);
            }
            (Register::MixerCtrl, None) => {
                let flags = MixerFlags::from_register(value);
                for (channel, tone) in self.generators.tones.iter_mut().enumerate() {
                    tone.set_mixer(flags.tone_enabled(channel), flags.noise_enabled(channel));
                }
            }
            (Register::EnvelopePeriodLo | Register::EnvelopePeriodHi, None) => {
                let period = self.registers.envelope_period();
                self.generators.envelope.set_period(now, period);
            }
            // I/O ports only latch their value
            _ => {}
        }
    }

    /// Read a register (address wraps modulo 16)
    pub fn read_register(&self, addr: u8) -> u8 {
        self.registers.read(Register::from_addr(addr))
    }

    /// Snapshot of all 16 registers
    pub fn dump_registers(&self) -> [u8; NUM_REGISTERS] {
        *self.registers.as_slice()
    }

    /// Set a channel's 12-bit period through R0-R5 in one step.
    ///
    /// The channel index wraps modulo 3, like register addresses wrap
    /// modulo 16.
    pub fn set_tone_period(&mut self, channel: usize, period: u16) {
        let channel = channel % NUM_CHANNELS;
        let lo = Register::from_addr((channel * 2) as u8);
        let hi = Register::from_addr((channel * 2 + 1) as u8);
        let lo_changed = self.registers.write(lo, period as u8).is_some();
        let hi_changed = self.registers.write(hi, (period >> 8) as u8).is_some();
        if lo_changed || hi_changed {
            let period = self.registers.tone_period(channel);
            self.generators.tones[channel].set_period(self.chip_time, period);
        }
    }

    /// Set the 5-bit noise period (R6)
    pub fn set_noise_period(&mut self, period: u8) {
        self.write_register(Register::NoisePeriod.addr(), period);
    }

    /// Set the 16-bit envelope period through R11/R12 in one step
    pub fn set_envelope_period(&mut self, period: u16) {
        let lo_changed = self
            .registers
            .write(Register::EnvelopePeriodLo, period as u8)
            .is_some();
        let hi_changed = self
            .registers
            .write(Register::EnvelopePeriodHi, (period >> 8) as u8)
            .is_some();
        if lo_changed || hi_changed {
            let period = self.registers.envelope_period();
            self.generators.envelope.set_period(self.chip_time, period);
        }
    }

    /// Load R0-R13 in one call.
    ///
    /// R13 is only written when it differs from [`ENVELOPE_SHAPE_UNCHANGED`],
    /// so a frame can update everything else without retriggering the
    /// envelope.
    pub fn load_registers(&mut self, regs: &[u8; NUM_SOUND_REGISTERS]) {
        for channel in 0..NUM_CHANNELS {
            let period = u16::from_le_bytes([regs[channel * 2], regs[channel * 2 + 1]]);
            self.set_tone_period(channel, period);
        }
        for addr in Register::NoisePeriod.addr()..=Register::ChCVolume.addr() {
            self.write_register(addr, regs[addr as usize]);
        }
        self.set_envelope_period(u16::from_le_bytes([regs[11], regs[12]]));
        if regs[13] != ENVELOPE_SHAPE_UNCHANGED {
            self.write_register(Register::EnvelopeShape.addr(), regs[13]);
        }
    }

    /// Render `sample_count` host samples into `buffer`.
    ///
    /// Stereo output is interleaved left/right. The count is clamped to what
    /// `buffer` can hold; the number of samples written is returned.
    pub fn render(&mut self, buffer: &mut [i16], sample_count: usize) -> usize {
        let channels = self.stereo.channels();
        let count = sample_count.min(buffer.len() / channels);

        if self.chip_time >= REBASE_THRESHOLD {
            self.rebase();
        }

        let start = self.chip_time;
        let target = start + self.resampler.cycles_per_sample() * count as i64;
        self.resampler.begin(start);

        let mut sink = SampleSink::new(&mut buffer[..count * channels], channels);
        let mut now = start;
        self.generators.advance_to(
            &mut now,
            target,
            &self.table,
            &mut self.resampler,
            &mut sink,
        );
        debug_assert_eq!(now, target);
        debug_assert_eq!(sink.written(), count);
        self.chip_time = now;
        count
    }

    /// Move the time axis so the current chip time becomes zero
    pub fn rebase(&mut self) {
        let offset = self.chip_time;
        self.generators.rebase(offset);
        self.chip_time = Cycles::ZERO;
        self.resampler.begin(self.chip_time);
        debug!("ym2149: time axis rebased by {offset}");
    }

    /// Change the chip clock
    pub fn set_clock(&mut self, clock_hz: u32) -> Result<()> {
        let cps = cycles_per_sample(clock_hz, self.sample_rate)?;
        self.clock_hz = clock_hz;
        self.apply_timing(cps);
        Ok(())
    }

    /// Change the host sample rate
    pub fn set_sample_rate(&mut self, sample_rate: u32) -> Result<()> {
        let cps = cycles_per_sample(self.clock_hz, sample_rate)?;
        self.sample_rate = sample_rate;
        self.apply_timing(cps);
        Ok(())
    }

    fn apply_timing(&mut self, cps: Cycles) {
        self.resampler.set_cycles_per_sample(cps);
        self.table = VolumeTable::build(self.volume, self.stereo, cps);
        debug!(
            "ym2149: {} Hz clock at {} Hz output, actual clock {} Hz",
            self.clock_hz,
            self.sample_rate,
            self.actual_clock()
        );
    }

    /// Change the channel-to-ear wiring for subsequently rendered samples
    pub fn set_stereo(&mut self, stereo: StereoMix) {
        self.stereo = stereo;
        self.table = VolumeTable::build(self.volume, stereo, self.resampler.cycles_per_sample());
        debug!("ym2149: stereo mode {stereo}");
    }

    /// Set the master volume in `[-1.0, 1.0]` (negative inverts polarity)
    pub fn set_volume(&mut self, volume: f32) -> Result<()> {
        if !(-1.0..=1.0).contains(&volume) {
            return Err(Ym2149Error::ConfigError(format!(
                "volume {volume} outside [-1.0, 1.0]"
            )));
        }
        self.volume = volume;
        self.table = VolumeTable::build(volume, self.stereo, self.resampler.cycles_per_sample());
        debug!("ym2149: master volume {volume}");
        Ok(())
    }

    /// Effective chip clock implied by the rounded cycles-per-sample value.
    ///
    /// Never below [`clock_hz`](Ym2149::clock_hz).
    pub fn actual_clock(&self) -> u64 {
        let cps = self.resampler.cycles_per_sample().raw() as u64;
        cps * u64::from(self.sample_rate) / ONE_CLOCK as u64
    }

    /// Requested chip clock in Hz
    pub fn clock_hz(&self) -> u32 {
        self.clock_hz
    }

    /// Host sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Current stereo wiring
    pub fn stereo(&self) -> StereoMix {
        self.stereo
    }

    /// Current master volume
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Interleaved values per rendered sample
    pub fn channel_count(&self) -> usize {
        self.stereo.channels()
    }

    /// Current chip time
    pub fn chip_time(&self) -> Cycles {
        self.chip_time
    }

    /// Width of one host sample in chip time
    pub fn cycles_per_sample(&self) -> Cycles {
        self.resampler.cycles_per_sample()
    }

    /// Next scheduled event of a generator (tone channel index wraps modulo 3)
    pub fn next_event(&self, id: GeneratorId) -> Cycles {
        let id = match id {
            GeneratorId::Tone(channel) => GeneratorId::Tone(channel % NUM_CHANNELS),
            other => other,
        };
        self.generators.next_event(id)
    }

    /// Canonical shape selected by R13
    pub fn envelope_shape(&self) -> EnvelopeShape {
        EnvelopeShape::from_register(self.registers.read(Register::EnvelopeShape))
    }

    /// Current envelope level (0-15)
    pub fn envelope_level(&self) -> u8 {
        self.generators.envelope.level()
    }

    /// Current noise shift register.
    ///
    /// Diagnostic only: while no channel listens to noise the register is
    /// not clocked, only its schedule moves.
    pub fn noise_lfsr(&self) -> u32 {
        self.generators.noise.lfsr()
    }
}

impl std::fmt::Debug for Ym2149 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ym2149")
            .field("registers", self.registers.as_slice())
            .field("clock_hz", &self.clock_hz)
            .field("sample_rate", &self.sample_rate)
            .field("stereo", &self.stereo)
            .field("chip_time", &self.chip_time)
            .finish_non_exhaustive()
    }
}
