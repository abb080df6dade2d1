//! Thread-safe chip handle
//!
//! Lets a producer (sequencer, tracker, UI) write registers while an audio
//! callback renders, with every operation serialized by one lock.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::backend::Ym2149Backend;
use crate::ym2149::{StereoMix, Ym2149, NUM_REGISTERS, NUM_SOUND_REGISTERS};
use crate::Result;

/// Cloneable handle to one shared [`Ym2149`]
#[derive(Clone)]
pub struct SharedYm2149 {
    inner: Arc<Mutex<Ym2149>>,
}

impl SharedYm2149 {
    /// Wrap a chip for sharing
    pub fn new(chip: Ym2149) -> Self {
        Self {
            inner: Arc::new(Mutex::new(chip)),
        }
    }

    /// Lock the chip for a sequence of operations that must not interleave
    /// with a render
    pub fn lock(&self) -> MutexGuard<'_, Ym2149> {
        self.inner.lock()
    }

    /// Set a channel's tone period
    pub fn set_tone_period(&self, channel: usize, period: u16) {
        self.inner.lock().set_tone_period(channel, period);
    }

    /// Set the noise period
    pub fn set_noise_period(&self, period: u8) {
        self.inner.lock().set_noise_period(period);
    }

    /// Set the envelope period
    pub fn set_envelope_period(&self, period: u16) {
        self.inner.lock().set_envelope_period(period);
    }

    /// Change the chip clock
    pub fn set_clock(&self, clock_hz: u32) -> Result<()> {
        self.inner.lock().set_clock(clock_hz)
    }

    /// Change the host sample rate
    pub fn set_sample_rate(&self, sample_rate: u32) -> Result<()> {
        self.inner.lock().set_sample_rate(sample_rate)
    }

    /// Change the stereo wiring
    pub fn set_stereo(&self, stereo: StereoMix) {
        self.inner.lock().set_stereo(stereo);
    }

    /// Change the master volume
    pub fn set_volume(&self, volume: f32) -> Result<()> {
        self.inner.lock().set_volume(volume)
    }
}

impl From<Ym2149> for SharedYm2149 {
    fn from(chip: Ym2149) -> Self {
        Self::new(chip)
    }
}

impl Ym2149Backend for SharedYm2149 {
    fn reset(&mut self) {
        self.inner.lock().reset();
    }

    fn write_register(&mut self, addr: u8, value: u8) {
        self.inner.lock().write_register(addr, value);
    }

    fn read_register(&self, addr: u8) -> u8 {
        self.inner.lock().read_register(addr)
    }

    fn load_registers(&mut self, regs: &[u8; NUM_SOUND_REGISTERS]) {
        self.inner.lock().load_registers(regs);
    }

    fn dump_registers(&self) -> [u8; NUM_REGISTERS] {
        self.inner.lock().dump_registers()
    }

    fn channel_count(&self) -> usize {
        self.inner.lock().channel_count()
    }

    fn sample_rate(&self) -> u32 {
        self.inner.lock().sample_rate()
    }

    fn render(&mut self, buffer: &mut [i16], sample_count: usize) -> usize {
        self.inner.lock().render(buffer, sample_count)
    }

    fn render_vec(&mut self, sample_count: usize) -> Vec<i16> {
        let mut chip = self.inner.lock();
        let mut samples = vec![0; sample_count * chip.channel_count()];
        chip.render(&mut samples, sample_count);
        samples
    }
}
