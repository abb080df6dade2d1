use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ym2149_psg::{ChipConfig, Cycles, GeneratorId, StereoMix, Ym2149};

fn chip_with(clock_hz: u32, sample_rate: u32, stereo: StereoMix) -> Ym2149 {
    Ym2149::new(ChipConfig {
        clock_hz,
        sample_rate,
        stereo,
        volume: 1.0,
    })
    .unwrap()
}

fn render(chip: &mut Ym2149, count: usize) -> Vec<i16> {
    let mut buffer = vec![0i16; count * chip.channel_count()];
    assert_eq!(chip.render(&mut buffer, count), count);
    buffer
}

#[test]
fn zero_period_behaves_as_one() {
    // Tone
    let mut a = chip_with(2_000_000, 44_100, StereoMix::Mono);
    let mut b = chip_with(2_000_000, 44_100, StereoMix::Mono);
    for (chip, period) in [(&mut a, 0u16), (&mut b, 1)] {
        chip.write_register(7, 0x3E);
        chip.write_register(8, 0x0F);
        chip.set_tone_period(0, period);
    }
    assert_eq!(render(&mut a, 300), render(&mut b, 300));

    // Noise
    let mut a = chip_with(2_000_000, 44_100, StereoMix::Mono);
    let mut b = chip_with(2_000_000, 44_100, StereoMix::Mono);
    for (chip, period) in [(&mut a, 0u8), (&mut b, 1)] {
        chip.write_register(7, 0x37);
        chip.write_register(8, 0x0F);
        chip.set_noise_period(period);
    }
    assert_eq!(render(&mut a, 300), render(&mut b, 300));

    // Envelope
    let mut a = chip_with(2_000_000, 44_100, StereoMix::Mono);
    let mut b = chip_with(2_000_000, 44_100, StereoMix::Mono);
    for (chip, period) in [(&mut a, 0u16), (&mut b, 1)] {
        chip.write_register(8, 0x10);
        chip.set_envelope_period(period);
        chip.write_register(13, 0x0E);
    }
    assert_eq!(render(&mut a, 300), render(&mut b, 300));
}

#[test]
fn noise_register_never_locks_up() {
    let mut chip = chip_with(2_000_000, 44_100, StereoMix::Mono);
    chip.set_noise_period(1);
    chip.write_register(7, 0x37);
    chip.write_register(8, 0x0F);

    let mut seen = std::collections::HashSet::new();
    for _ in 0..2_000 {
        render(&mut chip, 3);
        assert_ne!(chip.noise_lfsr(), 0);
        assert!(chip.noise_lfsr() <= 0x1_FFFF);
        seen.insert(chip.noise_lfsr());
    }
    assert!(seen.len() > 1_000, "LFSR barely moved: {} states", seen.len());
}

#[test]
fn actual_clock_never_below_requested() {
    let clocks = [1_000_000, 1_750_000, 1_773_400, 1_789_772, 2_000_000, 3_579_545];
    let rates = [8_000, 11_025, 22_050, 44_100, 48_000, 96_000, 192_000];
    for &clock in &clocks {
        for &rate in &rates {
            let mut chip = chip_with(clock, rate, StereoMix::Mono);
            let actual = chip.actual_clock();
            assert!(actual >= u64::from(clock), "{clock} Hz at {rate} Hz gave {actual}");

            chip.set_sample_rate(rate).unwrap();
            chip.set_sample_rate(rate).unwrap();
            assert_eq!(chip.actual_clock(), actual);
        }
    }
}

#[test]
fn steady_state_is_bit_identical() {
    for stereo in [StereoMix::Mono, StereoMix::Abc, StereoMix::Acb] {
        let mut chip = chip_with(2_000_000, 44_100, stereo);
        // Tone and noise disabled: each channel holds its fixed level
        chip.write_register(8, 0x0F);
        chip.write_register(9, 0x0A);
        chip.write_register(10, 0x05);

        let samples = render(&mut chip, 1_000);
        let channels = chip.channel_count();
        let first = &samples[..channels];
        assert!(first.iter().all(|&s| s > 0));
        for frame in samples.chunks(channels) {
            assert_eq!(frame, first, "{stereo}");
        }
    }
}

#[test]
fn toggle_mid_sample_averages_high_and_low() {
    // 1 MHz at 100 kHz: 10 clocks per sample
    let mut chip = chip_with(1_000_000, 100_000, StereoMix::Mono);
    chip.write_register(7, 0x3E);
    chip.write_register(8, 0x0F);
    chip.set_tone_period(0, 5); // First toggle 40 clocks from now
    assert_eq!(
        chip.next_event(GeneratorId::Tone(0)),
        Cycles::from_clocks(40)
    );

    assert_eq!(render(&mut chip, 1), vec![0]);

    // 50 kHz from t = 10: samples cover [10, 30) and [30, 50)
    chip.set_sample_rate(50_000).unwrap();
    let samples = render(&mut chip, 2);
    assert_eq!(samples[0], 0);

    // Level of a permanently high channel A at 50 kHz
    let mut reference = chip_with(1_000_000, 50_000, StereoMix::Mono);
    reference.write_register(8, 0x0F);
    let high = i32::from(render(&mut reference, 1)[0]);
    assert!(high > 0);

    let mid = i32::from(samples[1]);
    assert!(
        (2 * mid - high).abs() <= 2,
        "mid-sample toggle gave {mid}, expected half of {high}"
    );
}

#[test]
fn register_churn_keeps_schedule_ahead_of_chip_time() {
    let mut chip = chip_with(1_773_400, 48_000, StereoMix::Abc);
    let mut rng = StdRng::seed_from_u64(0x9E37_79B9_7F4A_7C15);
    let mut buffer = vec![0i16; 128];

    for round in 0..5_000 {
        for _ in 0..rng.random_range(0..4) {
            let addr: u8 = rng.random();
            let value = match addr & 0x0F {
                // Favour short periods so plenty of events land inside renders
                0 | 2 | 4 | 11 => rng.random_range(0..0x10),
                1 | 3 | 5 | 12 => 0,
                _ => rng.random(),
            };
            chip.write_register(addr, value);
        }
        if round % 97 == 0 {
            let stereo = [StereoMix::Mono, StereoMix::Abc, StereoMix::Acb][round % 3];
            chip.set_stereo(stereo);
        }
        if round % 389 == 0 {
            chip.set_volume(-chip.volume()).unwrap();
        }

        let count = rng.random_range(0..40);
        let written = chip.render(&mut buffer, count);
        assert_eq!(written, count);

        let now = chip.chip_time();
        for id in GeneratorId::ALL {
            assert!(
                chip.next_event(id) >= now,
                "{id:?} left behind at {now} in round {round}"
            );
        }
        assert!(chip.envelope_level() <= 15);
        assert_ne!(chip.noise_lfsr(), 0);
    }
}

#[test]
fn stereo_switch_keeps_earlier_output_and_timeline() {
    let setup = |chip: &mut Ym2149| {
        // Channel B only: centred in ABC, so both ears match mono
        chip.write_register(7, 0x3D);
        chip.set_tone_period(1, 0x07F);
        chip.write_register(9, 0x0D);
    };

    let mut switched = chip_with(2_000_000, 44_100, StereoMix::Mono);
    let mut reference = chip_with(2_000_000, 44_100, StereoMix::Mono);
    setup(&mut switched);
    setup(&mut reference);

    let before = render(&mut switched, 100);
    let kept = before.clone();
    switched.set_stereo(StereoMix::Abc);
    let after = render(&mut switched, 100);

    assert_eq!(before, kept);
    assert_eq!(switched.chip_time(), reference.cycles_per_sample() * 200);

    let expected = render(&mut reference, 200);
    assert_eq!(before, expected[..100]);
    for (frame, &mono) in after.chunks(2).zip(&expected[100..]) {
        assert_eq!(frame, [mono, mono]);
    }
}

#[test]
fn stereo_wiring_places_each_channel() {
    // (left, right) weights in twelfths for channels A, B and C
    let layouts = [
        (StereoMix::Abc, [(6, 2), (4, 4), (2, 6)]),
        (StereoMix::Acb, [(6, 2), (2, 6), (4, 4)]),
    ];
    let top_step = f64::from(i16::MAX) * 0.75;

    for (stereo, weights) in layouts {
        for (channel, (left_w, right_w)) in weights.into_iter().enumerate() {
            let mut chip = chip_with(1_000_000, 50_000, stereo);
            chip.write_register(8 + channel as u8, 0x0F);
            let frame = render(&mut chip, 4);
            let (left, right) = (i32::from(frame[6]), i32::from(frame[7]));

            let expected_left = (top_step * f64::from(left_w) / 12.0).round() as i32;
            let expected_right = (top_step * f64::from(right_w) / 12.0).round() as i32;
            assert!(
                (left - expected_left).abs() <= 1 && (right - expected_right).abs() <= 1,
                "{stereo} channel {channel}: L={left} R={right}, \
                 expected L={expected_left} R={expected_right}"
            );
        }
    }
}

#[test]
fn envelope_shape_rewrite_restarts_but_other_repeats_do_not() {
    let mut chip = chip_with(2_000_000, 44_100, StereoMix::Mono);
    chip.set_envelope_period(1);
    chip.write_register(8, 0x10);
    chip.write_register(13, 0x0C);
    render(&mut chip, 5);
    assert_ne!(chip.envelope_level(), 0);

    chip.write_register(13, 0x0C);
    assert_eq!(chip.envelope_level(), 0);
    assert_eq!(
        chip.next_event(GeneratorId::Envelope),
        chip.chip_time() + Cycles::from_clocks(16)
    );

    chip.write_register(7, 0x3E);
    chip.set_tone_period(0, 0x200);
    render(&mut chip, 7);
    let pending = chip.next_event(GeneratorId::Tone(0));
    chip.write_register(0, 0x00);
    chip.write_register(1, 0x02);
    assert_eq!(chip.next_event(GeneratorId::Tone(0)), pending);

    // A shorter period pulls the pending toggle in
    chip.write_register(1, 0x00);
    assert_eq!(
        chip.next_event(GeneratorId::Tone(0)),
        chip.chip_time() + Cycles::from_clocks(8)
    );
}

#[test]
fn register_index_wraps_modulo_sixteen() {
    let mut chip = chip_with(2_000_000, 44_100, StereoMix::Mono);
    chip.write_register(0x18, 0x0F);
    assert_eq!(chip.read_register(8), 0x0F);
    assert_eq!(chip.read_register(0xF8), 0x0F);

    chip.write_register(0xFD, 0x0E);
    assert_eq!(chip.read_register(13), 0x0E);
    assert_eq!(chip.dump_registers()[13], 0x0E);
}

#[test]
fn inaudible_generators_catch_up_exactly() {
    let mut audible = chip_with(2_000_000, 44_100, StereoMix::Mono);
    let mut silent = chip_with(2_000_000, 44_100, StereoMix::Mono);
    for chip in [&mut audible, &mut silent] {
        chip.set_tone_period(0, 0x023);
        chip.set_envelope_period(3);
        chip.write_register(13, 0x0A);
    }
    // Only `audible` routes the tone and the envelope to the output. With
    // 45.35 clocks per sample neither schedule lands on a render boundary.
    audible.write_register(7, 0x3E);
    audible.write_register(8, 0x10);

    for count in [1usize, 17, 250, 3] {
        render(&mut audible, count);
        render(&mut silent, count);
        assert_eq!(
            audible.next_event(GeneratorId::Tone(0)),
            silent.next_event(GeneratorId::Tone(0))
        );
        assert_eq!(
            audible.next_event(GeneratorId::Envelope),
            silent.next_event(GeneratorId::Envelope)
        );
        assert_eq!(audible.envelope_level(), silent.envelope_level());
    }
}

#[test]
fn rebase_does_not_disturb_output() {
    let mut plain = chip_with(2_000_000, 44_100, StereoMix::Abc);
    let mut rebased = chip_with(2_000_000, 44_100, StereoMix::Abc);
    for chip in [&mut plain, &mut rebased] {
        chip.write_register(7, 0x30);
        chip.set_tone_period(0, 0x0FE);
        chip.set_tone_period(1, 0x17B);
        chip.set_tone_period(2, 0x2A1);
        chip.write_register(8, 0x0F);
        chip.write_register(9, 0x0B);
        chip.write_register(10, 0x10);
        chip.set_envelope_period(0x40);
        chip.write_register(13, 0x0E);
    }

    assert_eq!(render(&mut plain, 500), render(&mut rebased, 500));
    rebased.rebase();
    assert_eq!(rebased.chip_time(), Cycles::ZERO);
    assert_eq!(render(&mut plain, 500), render(&mut rebased, 500));
}
