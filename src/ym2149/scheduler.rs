//! Event scheduler and box-filter resampler
//!
//! The five generators run at unrelated rates. Rather than ticking every
//! master clock, [`Generators::advance_to`] repeatedly:
//!
//! 1. picks the earliest pending event among the generators that can change
//!    the output (the others are fast-forwarded past the target),
//! 2. integrates the current mixed level up to that event into the sample
//!    being assembled, emitting samples whose span has been covered,
//! 3. services the event and loops.
//!
//! Work is proportional to audible state changes, and every output sample is
//! the exact average of the level over its span of chip time.

use super::cycles::Cycles;
use super::envelope::EnvelopeGenerator;
use super::generators::{NoiseGenerator, ToneChannel, NUM_CHANNELS};
use super::mixer::{VolumeTable, OUTPUT_SHIFT};

/// Uniform capability of the event-driven generators
pub trait Oscillator {
    /// Chip time of the next state change
    fn next_event(&self) -> Cycles;

    /// Service the event due at [`next_event`](Oscillator::next_event)
    fn step(&mut self);

    /// Jump over every event due at or before `now` without replaying the
    /// intermediate states one by one
    fn skip_ahead(&mut self, now: Cycles);
}

/// Identifies one of the five generators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeneratorId {
    /// Tone channel 0-2
    Tone(usize),
    /// Shared noise generator
    Noise,
    /// Shared envelope generator
    Envelope,
}

impl GeneratorId {
    /// Every generator, in scheduling priority order for simultaneous events
    pub const ALL: [GeneratorId; 5] = [
        GeneratorId::Tone(0),
        GeneratorId::Tone(1),
        GeneratorId::Tone(2),
        GeneratorId::Noise,
        GeneratorId::Envelope,
    ];
}

/// The generator set of one chip
#[derive(Debug, Clone, Default)]
pub struct Generators {
    /// Tone channels A, B, C
    pub tones: [ToneChannel; NUM_CHANNELS],
    /// Shared noise generator
    pub noise: NoiseGenerator,
    /// Shared envelope generator
    pub envelope: EnvelopeGenerator,
}

impl Generators {
    /// Next event of one generator
    #[inline]
    pub fn next_event(&self, id: GeneratorId) -> Cycles {
        match id {
            GeneratorId::Tone(channel) => self.tones[channel].next_event(),
            GeneratorId::Noise => self.noise.next_event(),
            GeneratorId::Envelope => self.envelope.next_event(),
        }
    }

    /// Service one generator's pending event
    #[inline]
    pub fn step(&mut self, id: GeneratorId) {
        match id {
            GeneratorId::Tone(channel) => self.tones[channel].step(),
            GeneratorId::Noise => self.noise.step(),
            GeneratorId::Envelope => self.envelope.step(),
        }
    }

    /// Fast-forward one generator past `now`
    #[inline]
    pub fn skip_ahead(&mut self, id: GeneratorId, now: Cycles) {
        match id {
            GeneratorId::Tone(channel) => self.tones[channel].skip_ahead(now),
            GeneratorId::Noise => self.noise.skip_ahead(now),
            GeneratorId::Envelope => self.envelope.skip_ahead(now),
        }
    }

    /// Whether a generator's state can currently affect the mixed output
    pub fn is_relevant(&self, id: GeneratorId) -> bool {
        match id {
            GeneratorId::Tone(channel) => self.tones[channel].tone_enabled(),
            GeneratorId::Noise => self.tones.iter().any(ToneChannel::noise_enabled),
            GeneratorId::Envelope => self.tones.iter().any(ToneChannel::uses_envelope),
        }
    }

    /// Instantaneous (left, right) level; both ears are equal in mono
    #[inline]
    pub fn mixed_levels(&self, table: &VolumeTable) -> [i64; 2] {
        let noise = self.noise.output();
        let envelope = self.envelope.level();
        let mut levels = [0i64; 2];
        for (channel, tone) in self.tones.iter().enumerate() {
            if tone.gate(noise) {
                let step = tone.level_index(envelope);
                levels[0] += table.level(0, channel, step);
                levels[1] += table.level(1, channel, step);
            }
        }
        levels
    }

    /// Reset every generator to its power-up state at `now`
    pub fn reset(&mut self, now: Cycles) {
        for tone in &mut self.tones {
            tone.reset(now);
        }
        self.noise.reset(now);
        self.envelope.reset();
    }

    /// Shift every pending event back by `offset`
    pub(crate) fn rebase(&mut self, offset: Cycles) {
        for tone in &mut self.tones {
            tone.rebase(offset);
        }
        self.noise.rebase(offset);
        self.envelope.rebase(offset);
    }

    /// Run chip time from `*now` to `target`, writing finished samples
    pub fn advance_to(
        &mut self,
        now: &mut Cycles,
        target: Cycles,
        table: &VolumeTable,
        resampler: &mut Resampler,
        sink: &mut SampleSink<'_>,
    ) {
        debug_assert!(target >= *now, "chip time must never run backwards");

        // Relevance only changes on register writes, never inside a render
        let mut relevant = [None; 5];
        let mut relevant_count = 0;
        for id in GeneratorId::ALL {
            if self.is_relevant(id) {
                relevant[relevant_count] = Some(id);
                relevant_count += 1;
            } else {
                self.skip_ahead(id, target);
            }
        }
        let relevant = &relevant[..relevant_count];

        // An event due exactly at the target stays pending for the next call
        loop {
            let mut boundary = target;
            let mut due = None;
            for id in relevant.iter().flatten() {
                let event = self.next_event(*id);
                if event < boundary {
                    boundary = event;
                    due = Some(*id);
                }
            }

            let levels = self.mixed_levels(table);
            resampler.integrate(levels, *now, boundary, sink);
            *now = boundary;

            match due {
                Some(id) => {
                    self.step(id);
                    debug_assert!(self.next_event(id) > *now);
                }
                None => break,
            }
        }
    }
}

/// Cursor over the caller's interleaved output buffer
#[derive(Debug)]
pub struct SampleSink<'a> {
    buffer: &'a mut [i16],
    position: usize,
    channels: usize,
}

impl<'a> SampleSink<'a> {
    /// Wrap an output buffer for `channels` interleaved values per sample
    pub fn new(buffer: &'a mut [i16], channels: usize) -> Self {
        debug_assert!(channels == 1 || channels == 2);
        Self {
            buffer,
            position: 0,
            channels,
        }
    }

    /// Number of complete samples written so far
    #[inline]
    pub fn written(&self) -> usize {
        self.position / self.channels
    }

    #[inline]
    fn push(&mut self, frame: [i16; 2]) {
        debug_assert!(self.position + self.channels <= self.buffer.len());
        self.buffer[self.position..self.position + self.channels]
            .copy_from_slice(&frame[..self.channels]);
        self.position += self.channels;
    }
}

/// Box-filter state: the sample currently being assembled
#[derive(Debug, Clone)]
pub struct Resampler {
    cycles_per_sample: Cycles,
    sample_end: Cycles,
    accumulator: [i64; 2],
}

impl Resampler {
    /// Create a resampler for the given sample width
    pub fn new(cycles_per_sample: Cycles) -> Self {
        Self {
            cycles_per_sample,
            sample_end: cycles_per_sample,
            accumulator: [0; 2],
        }
    }

    /// Width of one output sample in chip time
    #[inline]
    pub fn cycles_per_sample(&self) -> Cycles {
        self.cycles_per_sample
    }

    /// Change the sample width; takes effect at the next [`begin`](Resampler::begin)
    pub fn set_cycles_per_sample(&mut self, cycles_per_sample: Cycles) {
        debug_assert!(cycles_per_sample.raw() > 0);
        self.cycles_per_sample = cycles_per_sample;
    }

    /// Start a new sample grid at `start`
    #[inline]
    pub fn begin(&mut self, start: Cycles) {
        self.sample_end = start + self.cycles_per_sample;
        self.accumulator = [0; 2];
    }

    /// Integrate a constant level over `[from, to)`
    #[inline]
    pub fn integrate(&mut self, levels: [i64; 2], from: Cycles, to: Cycles, sink: &mut SampleSink<'_>) {
        debug_assert!(to >= from);
        if to < self.sample_end {
            let span = (to - from).raw();
            self.accumulator[0] += levels[0] * span;
            self.accumulator[1] += levels[1] * span;
            return;
        }

        // Finish the sample in progress
        let head = (self.sample_end - from).raw();
        self.accumulator[0] += levels[0] * head;
        self.accumulator[1] += levels[1] * head;
        sink.push([finish(self.accumulator[0]), finish(self.accumulator[1])]);

        let width = self.cycles_per_sample;
        let mut cursor = self.sample_end;
        self.sample_end += width;

        // Whole samples covered by the span share one value
        let whole = (to - cursor).raw() / width.raw();
        if whole > 0 {
            let steady = [
                finish(levels[0] * width.raw()),
                finish(levels[1] * width.raw()),
            ];
            for _ in 0..whole {
                sink.push(steady);
            }
            cursor += width * whole;
            self.sample_end += width * whole;
        }

        let tail = (to - cursor).raw();
        self.accumulator = [levels[0] * tail, levels[1] * tail];
    }
}

/// Round an accumulated sample back to 16 bits
#[inline]
fn finish(accumulator: i64) -> i16 {
    let value = (accumulator + (1 << (OUTPUT_SHIFT - 1))) >> OUTPUT_SHIFT;
    value.clamp(i64::from(i16::MIN), i64::from(i16::MAX)) as i16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ym2149::mixer::StereoMix;

    const LEVEL: i64 = 1 << OUTPUT_SHIFT;

    #[test]
    fn test_integrate_within_one_sample() {
        let mut buffer = [0i16; 2];
        let mut sink = SampleSink::new(&mut buffer, 1);
        let mut resampler = Resampler::new(Cycles::from_raw(64));
        resampler.begin(Cycles::ZERO);

        let per_unit = LEVEL / 64;
        resampler.integrate([per_unit * 10, 0], Cycles::ZERO, Cycles::from_raw(32), &mut sink);
        assert_eq!(sink.written(), 0);
        resampler.integrate(
            [per_unit * 30, 0],
            Cycles::from_raw(32),
            Cycles::from_raw(64),
            &mut sink,
        );
        assert_eq!(sink.written(), 1);
        drop(sink);
        // Half the sample at 10, half at 30
        assert_eq!(buffer[0], 20);
    }

    #[test]
    fn test_integrate_fills_whole_samples() {
        let mut buffer = [0i16; 10];
        let mut sink = SampleSink::new(&mut buffer, 2);
        let mut resampler = Resampler::new(Cycles::from_raw(64));
        resampler.begin(Cycles::ZERO);

        resampler.integrate(
            [LEVEL / 64 * 7, -LEVEL / 64 * 3],
            Cycles::ZERO,
            Cycles::from_raw(64 * 5),
            &mut sink,
        );
        assert_eq!(sink.written(), 5);
        drop(sink);
        assert_eq!(buffer, [7, -3, 7, -3, 7, -3, 7, -3, 7, -3]);
    }

    #[test]
    fn test_finish_clamps() {
        assert_eq!(finish(i64::from(i16::MAX) * 4 * LEVEL), i16::MAX);
        assert_eq!(finish(i64::from(i16::MIN) * 4 * LEVEL), i16::MIN);
        assert_eq!(finish(LEVEL / 2), 1);
        assert_eq!(finish(LEVEL / 2 - 1), 0);
    }

    #[test]
    fn test_relevance() {
        let mut generators = Generators::default();
        for id in GeneratorId::ALL {
            assert!(!generators.is_relevant(id), "{id:?} relevant after reset");
        }

        generators.tones[1].set_mixer(true, false);
        generators.tones[2].set_volume(0x10);
        assert!(generators.is_relevant(GeneratorId::Tone(1)));
        assert!(!generators.is_relevant(GeneratorId::Tone(0)));
        assert!(!generators.is_relevant(GeneratorId::Noise));
        assert!(generators.is_relevant(GeneratorId::Envelope));
    }

    #[test]
    fn test_advance_skips_irrelevant_generators() {
        let mut generators = Generators::default();
        let table = VolumeTable::build(1.0, StereoMix::Mono, Cycles::from_clocks(20));
        let mut resampler = Resampler::new(Cycles::from_clocks(20));
        let mut buffer = [0i16; 4000];
        let mut sink = SampleSink::new(&mut buffer, 1);

        let mut now = Cycles::ZERO;
        let target = Cycles::from_clocks(80_000);
        resampler.begin(now);
        generators.advance_to(&mut now, target, &table, &mut resampler, &mut sink);

        assert_eq!(now, target);
        assert_eq!(sink.written(), 4000);
        for id in GeneratorId::ALL {
            assert!(generators.next_event(id) > target);
        }
    }
}
