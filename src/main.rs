//! `psg-render`: render a static PSG register image to a WAV file.

use anyhow::{bail, Context, Result};
use log::info;

use ym2149_psg::ym2149::{NUM_SOUND_REGISTERS, POWER_UP_REGISTERS};
use ym2149_psg::{render_to_wav, ChipConfig, StereoMix, Ym2149, ENVELOPE_SHAPE_UNCHANGED};

mod args {
    //! Command-line argument parsing.

    use std::env;

    use anyhow::{anyhow, Context, Result};
    use ym2149_psg::StereoMix;

    /// Parsed command-line arguments.
    #[derive(Debug, Default)]
    pub struct CliArgs {
        /// Output WAV path
        pub output_path: Option<String>,
        /// JSON chip configuration file
        pub config_path: Option<String>,
        /// Comma-separated hex register values, R0 first
        pub registers: Option<String>,
        /// Render length in seconds
        pub seconds: Option<f64>,
        /// Stereo wiring override
        pub stereo: Option<StereoMix>,
        /// Chip clock override
        pub clock_hz: Option<u32>,
        /// Sample rate override
        pub sample_rate: Option<u32>,
        /// Whether help was requested
        pub show_help: bool,
    }

    impl CliArgs {
        /// Parse arguments from command line.
        pub fn parse() -> Result<Self> {
            Self::parse_from(env::args().skip(1))
        }

        /// Parse an argument list (without the program name).
        pub fn parse_from<I>(argv: I) -> Result<Self>
        where
            I: IntoIterator<Item = String>,
        {
            let mut args = Self::default();
            let mut iter = argv.into_iter();

            while let Some(arg) = iter.next() {
                let (flag, inline) = match arg.split_once('=') {
                    Some((flag, value)) if flag.starts_with("--") => {
                        (flag.to_string(), Some(value.to_string()))
                    }
                    _ => (arg.clone(), None),
                };
                let mut value = |name: &str| {
                    inline
                        .clone()
                        .or_else(|| iter.next())
                        .ok_or_else(|| anyhow!("{name} requires an argument"))
                };

                match flag.as_str() {
                    "--help" | "-h" => args.show_help = true,
                    "--config" => args.config_path = Some(value("--config")?),
                    "--regs" => args.registers = Some(value("--regs")?),
                    "--seconds" => {
                        let raw = value("--seconds")?;
                        let seconds: f64 = raw
                            .parse()
                            .with_context(|| format!("invalid --seconds value '{raw}'"))?;
                        args.seconds = Some(seconds);
                    }
                    "--stereo" => args.stereo = Some(value("--stereo")?.parse()?),
                    "--clock" => {
                        let raw = value("--clock")?;
                        args.clock_hz = Some(
                            raw.parse()
                                .with_context(|| format!("invalid --clock value '{raw}'"))?,
                        );
                    }
                    "--rate" => {
                        let raw = value("--rate")?;
                        args.sample_rate = Some(
                            raw.parse()
                                .with_context(|| format!("invalid --rate value '{raw}'"))?,
                        );
                    }
                    _ if flag.starts_with('-') => {
                        eprintln!("Unknown flag: {}", arg);
                        args.show_help = true;
                    }
                    _ => args.output_path = Some(arg),
                }
            }

            Ok(args)
        }

        /// Print help text to stderr.
        pub fn print_help() {
            eprintln!(
                "Usage:\n  psg-render [options] <output.wav>\n\n\
                 Options:\n\
                 \x20 --config <file.json>   Chip configuration (clock_hz, sample_rate, stereo, volume)\n\
                 \x20 --regs <hex,...>       Register image R0..R13 (missing R13 leaves the envelope idle)\n\
                 \x20 --seconds <n>          Render length (default 2)\n\
                 \x20 --stereo <mode>        mono, abc or acb\n\
                 \x20 --clock <hz>           Chip clock override\n\
                 \x20 --rate <hz>            Output sample rate override\n\
                 \x20 -h, --help             Show this help\n\n\
                 Examples:\n\
                 \x20 psg-render --regs 1C,01,00,00,00,00,00,3E,0F a4.wav\n\
                 \x20 psg-render --stereo abc --regs 00,01,80,01,00,02,00,38,10,0C,0A,00,10,0E buzz.wav\n"
            );
        }
    }
}

const DEFAULT_SECONDS: f64 = 2.0;

/// Parse a comma-separated list of hex bytes into a sound register frame.
///
/// Registers not listed keep their power-up values; an omitted R13 becomes
/// the "leave the envelope alone" marker.
fn parse_register_frame(text: &str) -> Result<[u8; NUM_SOUND_REGISTERS]> {
    let mut frame = [0u8; NUM_SOUND_REGISTERS];
    frame.copy_from_slice(&POWER_UP_REGISTERS[..NUM_SOUND_REGISTERS]);
    frame[NUM_SOUND_REGISTERS - 1] = ENVELOPE_SHAPE_UNCHANGED;

    let values: Vec<&str> = text
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if values.len() > NUM_SOUND_REGISTERS {
        bail!(
            "expected at most {NUM_SOUND_REGISTERS} register values, got {}",
            values.len()
        );
    }
    for (slot, value) in frame.iter_mut().zip(&values) {
        let digits = value.trim_start_matches("0x").trim_start_matches("0X");
        *slot = u8::from_str_radix(digits, 16)
            .with_context(|| format!("invalid register value '{value}'"))?;
    }
    Ok(frame)
}

fn run(args: args::CliArgs) -> Result<()> {
    let Some(output_path) = args.output_path else {
        args::CliArgs::print_help();
        bail!("missing output path");
    };

    let mut config = match &args.config_path {
        Some(path) => ChipConfig::load(path)
            .with_context(|| format!("failed to load chip configuration from {path}"))?,
        None => ChipConfig::default(),
    };
    if let Some(clock_hz) = args.clock_hz {
        config.clock_hz = clock_hz;
    }
    if let Some(sample_rate) = args.sample_rate {
        config.sample_rate = sample_rate;
    }
    if let Some(stereo) = args.stereo {
        config.stereo = stereo;
    }

    let seconds = args.seconds.unwrap_or(DEFAULT_SECONDS);
    if !seconds.is_finite() || seconds < 0.0 {
        bail!("render length must be a non-negative number of seconds");
    }

    let mut chip = Ym2149::new(config).context("failed to configure chip")?;
    if let Some(text) = &args.registers {
        chip.load_registers(&parse_register_frame(text)?);
    }

    let sample_count = (seconds * f64::from(config.sample_rate)).round() as usize;
    info!(
        "rendering {sample_count} samples at {} Hz (actual chip clock {} Hz, {})",
        config.sample_rate,
        chip.actual_clock(),
        config.stereo
    );
    render_to_wav(&mut chip, &output_path, sample_count)
        .with_context(|| format!("failed to write {output_path}"))?;

    let layout = if config.stereo == StereoMix::Mono {
        "mono"
    } else {
        "stereo"
    };
    println!("Wrote {seconds:.2}s of {layout} audio to {output_path}");
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = args::CliArgs::parse()?;
    if args.show_help {
        args::CliArgs::print_help();
        return Ok(());
    }
    run(args)
}
