//! WAV file export functionality

use std::path::Path;

use log::debug;

use crate::backend::Ym2149Backend;
use crate::{Result, Ym2149Error};

/// Write interleaved 16-bit samples to a PCM WAV file
///
/// # Examples
///
/// ```no_run
/// use ym2149_psg::write_wav;
///
/// # fn main() -> ym2149_psg::Result<()> {
/// let silence = vec![0i16; 44_100];
/// write_wav("silence.wav", &silence, 44_100, 1)?;
/// # Ok(())
/// # }
/// ```
pub fn write_wav<P: AsRef<Path>>(
    path: P,
    samples: &[i16],
    sample_rate: u32,
    channels: u16,
) -> Result<()> {
    if channels == 0 || samples.len() % usize::from(channels) != 0 {
        return Err(Ym2149Error::AudioFileError(format!(
            "{} samples cannot be split into {} channels",
            samples.len(),
            channels
        )));
    }

    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path.as_ref(), spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    debug!(
        "wrote {} frames to {}",
        samples.len() / usize::from(channels),
        path.as_ref().display()
    );
    Ok(())
}

/// Render `sample_count` samples from a backend and write them to a WAV file
///
/// The channel count and rate follow the backend's current configuration.
pub fn render_to_wav<B, P>(chip: &mut B, path: P, sample_count: usize) -> Result<()>
where
    B: Ym2149Backend + ?Sized,
    P: AsRef<Path>,
{
    let channels = chip.channel_count();
    let mut samples = vec![0i16; sample_count * channels];
    let written = chip.render(&mut samples, sample_count);
    samples.truncate(written * channels);
    write_wav(path, &samples, chip.sample_rate(), channels as u16)
}
