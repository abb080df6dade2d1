//! Backend trait abstraction for YM2149 chip implementations
//!
//! Both the owned [`Ym2149`](crate::Ym2149) and the thread-safe
//! [`SharedYm2149`](crate::SharedYm2149) implement this interface, so code
//! that only pokes registers and pulls samples can take either.

use crate::ym2149::{NUM_REGISTERS, NUM_SOUND_REGISTERS};

/// Common interface for YM2149 chip backends
///
/// # Example
///
/// ```
/// use ym2149_psg::{ChipConfig, Ym2149, Ym2149Backend};
///
/// fn play_note<B: Ym2149Backend>(chip: &mut B) -> Vec<i16> {
///     chip.write_register(0x00, 0xF0); // Channel A period low
///     chip.write_register(0x01, 0x01); // Channel A period high
///     chip.write_register(0x08, 0x0F); // Channel A volume
///     chip.write_register(0x07, 0x3E); // Mixer: enable tone A
///
///     chip.render_vec(441)
/// }
///
/// let mut chip = Ym2149::new(ChipConfig::default()).unwrap();
/// assert_eq!(play_note(&mut chip).len(), 441);
/// ```
pub trait Ym2149Backend: Send {
    /// Reset registers and generators to the power-up state
    fn reset(&mut self);

    /// Write a register (address wraps modulo 16)
    fn write_register(&mut self, addr: u8, value: u8);

    /// Read a register (address wraps modulo 16)
    fn read_register(&self, addr: u8) -> u8;

    /// Load the 14 sound registers at once
    ///
    /// An R13 value of `0xFF` leaves the envelope running.
    fn load_registers(&mut self, regs: &[u8; NUM_SOUND_REGISTERS]);

    /// Dump all 16 registers
    fn dump_registers(&self) -> [u8; NUM_REGISTERS];

    /// Interleaved output values per sample (1 or 2)
    fn channel_count(&self) -> usize;

    /// Host sample rate in Hz
    fn sample_rate(&self) -> u32;

    /// Render up to `sample_count` samples into `buffer`, returning the
    /// number actually written
    fn render(&mut self, buffer: &mut [i16], sample_count: usize) -> usize;

    /// Render `sample_count` samples into a fresh buffer
    fn render_vec(&mut self, sample_count: usize) -> Vec<i16> {
        let mut samples = vec![0; sample_count * self.channel_count()];
        self.render(&mut samples, sample_count);
        samples
    }
}

impl Ym2149Backend for crate::Ym2149 {
    fn reset(&mut self) {
        crate::Ym2149::reset(self);
    }

    fn write_register(&mut self, addr: u8, value: u8) {
        crate::Ym2149::write_register(self, addr, value);
    }

    fn read_register(&self, addr: u8) -> u8 {
        crate::Ym2149::read_register(self, addr)
    }

    fn load_registers(&mut self, regs: &[u8; NUM_SOUND_REGISTERS]) {
        crate::Ym2149::load_registers(self, regs);
    }

    fn dump_registers(&self) -> [u8; NUM_REGISTERS] {
        crate::Ym2149::dump_registers(self)
    }

    fn channel_count(&self) -> usize {
        crate::Ym2149::channel_count(self)
    }

    fn sample_rate(&self) -> u32 {
        crate::Ym2149::sample_rate(self)
    }

    fn render(&mut self, buffer: &mut [i16], sample_count: usize) -> usize {
        crate::Ym2149::render(self, buffer, sample_count)
    }
}
