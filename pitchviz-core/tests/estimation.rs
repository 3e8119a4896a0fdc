use std::f32::consts::PI;

use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use pitchviz_core::color::{Rgb, hue_from_frequency};
use pitchviz_core::pitch::{PitchEstimate, estimate};
use pitchviz_core::tuning::note_from_frequency;
use pitchviz_core::{AnalysisError, VisualizerConfig, analyze_frame};

fn sine(frequency: f32, sample_rate: u32, len: usize, amplitude: f32) -> Vec<f32> {
    (0..len)
        .map(|i| amplitude * (2.0 * PI * frequency * i as f32 / sample_rate as f32).sin())
        .collect()
}

fn noise(seed: u64, len: usize, amplitude: f32) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len)
        .map(|_| amplitude * rng.random_range(-1.0f32..1.0))
        .collect()
}

fn detected(signal: &[f32], sample_rate: u32) -> f32 {
    match estimate(signal, sample_rate, &VisualizerConfig::default()).unwrap() {
        PitchEstimate::Detected(frequency) => frequency,
        PitchEstimate::NoPitch => panic!("no pitch detected"),
    }
}

#[test]
fn sine_signals_within_two_percent() {
    for sample_rate in [44100, 48000] {
        for frequency in [110.0, 220.0, 330.0, 440.0, 587.33, 880.0, 1000.0] {
            let signal = sine(frequency, sample_rate, 2048, 0.5);
            let found = detected(&signal, sample_rate);
            assert_relative_eq!(found, frequency, max_relative = 0.02);
        }
    }
}

#[test]
fn sine_in_short_buffer() {
    let signal = sine(440.0, 44100, 1024, 0.7);
    assert_relative_eq!(detected(&signal, 44100), 440.0, max_relative = 0.02);
}

#[test]
fn strict_correlation_threshold_still_locks_on() {
    let config = VisualizerConfig {
        silence_rms_threshold: 0.05,
        correlation_quality_threshold: 0.9,
        ..Default::default()
    };
    let signal = sine(261.63, 44100, 2048, 0.5);
    let found = estimate(&signal, 44100, &config).unwrap().frequency().unwrap();
    assert_relative_eq!(found, 261.63, max_relative = 0.02);
}

#[test]
fn silence_is_never_a_pitch() {
    let silence = vec![0.0f32; 2048];
    for sample_rate in [8000, 22050, 44100, 48000, 96000, 1] {
        assert_eq!(
            estimate(&silence, sample_rate, &VisualizerConfig::default()),
            Ok(PitchEstimate::NoPitch)
        );
    }
}

#[test]
fn loud_white_noise_has_no_pitch() {
    for seed in 0..8 {
        let signal = noise(seed, 2048, 1.0);
        assert_eq!(
            estimate(&signal, 44100, &VisualizerConfig::default()),
            Ok(PitchEstimate::NoPitch),
            "seed {seed}"
        );
    }
}

#[test]
fn quiet_noise_never_reports_implausible_frequencies() {
    let sample_rate = 44100;
    let nyquist = sample_rate as f32 / 2.0;
    for amplitude in [0.05, 0.1, 0.2] {
        for seed in 0..64 {
            let signal = noise(seed, 2048, amplitude);
            match estimate(&signal, sample_rate, &VisualizerConfig::default()).unwrap() {
                PitchEstimate::NoPitch => {}
                PitchEstimate::Detected(frequency) => {
                    assert!(frequency.is_finite() && frequency > 0.0);
                    assert!(
                        frequency < nyquist,
                        "seed {seed}, amplitude {amplitude}: {frequency}"
                    );
                }
            }
        }
    }
}

#[test]
fn bad_buffers_are_rejected() {
    let config = VisualizerConfig::default();
    assert_eq!(estimate(&[], 44100, &config), Err(AnalysisError::EmptyBuffer));
    assert!(matches!(
        estimate(&vec![0.5; 2047], 44100, &config),
        Err(AnalysisError::BufferLength { len: 2047, .. })
    ));
    assert!(matches!(
        estimate(&[0.5, -0.5], 44100, &config),
        Err(AnalysisError::BufferLength { len: 2, .. })
    ));
    assert_eq!(
        estimate(&vec![0.5; 2048], 0, &config),
        Err(AnalysisError::InvalidSampleRate(0))
    );
}

#[test]
fn odd_buffers_are_rejected_even_when_silent() {
    let result = estimate(&vec![0.0; 1023], 44100, &VisualizerConfig::default());
    assert!(matches!(result, Err(AnalysisError::BufferLength { .. })));
}

#[test]
fn a440_maps_to_note_a() {
    let note = note_from_frequency(440.0).unwrap();
    assert_eq!(note.number, 69);
    assert_eq!(note.name.as_str(), "A");
}

#[test]
fn hue_is_total_and_in_range() {
    let config = VisualizerConfig::default();
    let mut frequency = 0.0f32;
    while frequency <= 50_000.0 {
        // channels are u8, so range is guaranteed; this checks termination and idle handling
        let color = hue_from_frequency(frequency, &config);
        if frequency < 2.0 {
            assert_eq!(color, Rgb::WHITE);
        }
        frequency += 7.3;
    }
    for frequency in [-1.0, -50_000.0, f32::NAN, f32::NEG_INFINITY] {
        assert_eq!(hue_from_frequency(frequency, &config), Rgb::WHITE, "f = {frequency}");
    }
    // past one full trip the wheel is back at red
    for frequency in [f32::MAX, f32::INFINITY] {
        assert_eq!(hue_from_frequency(frequency, &config), Rgb::RED, "f = {frequency}");
    }
}

#[test]
fn detected_pitch_maps_deterministically() {
    let config = VisualizerConfig::default();
    let signal = sine(329.63, 48000, 2048, 0.5);
    let first = analyze_frame(&signal, 48000, &config).unwrap();
    let second = analyze_frame(&signal, 48000, &config).unwrap();
    assert_eq!(first, second);

    let frequency = first.frequency().unwrap();
    assert_eq!(first.note, note_from_frequency(frequency).ok());
    assert_eq!(first.note.unwrap().to_string(), "E4");
    assert_eq!(first.color, hue_from_frequency(frequency, &config));
    assert_ne!(first.color, Rgb::WHITE);
}
