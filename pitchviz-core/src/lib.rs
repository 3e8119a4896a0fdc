// pitchviz-core/src/lib.rs

//! The core logic for the audio-reactive visualizer.
//! This crate estimates pitch and loudness from microphone snapshots and
//! maps them to note names and colors. It is completely headless
//! and contains no drawing code.

pub mod audio;
pub mod color;
pub mod config;
pub mod error;
pub mod pitch;
pub mod tuning;

pub use color::Rgb;
pub use config::VisualizerConfig;
pub use error::{AnalysisError, AnalysisResult};
pub use pitch::PitchEstimate;
pub use tuning::{Note, NoteName};

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReading {
    /// RMS level of the snapshot; drives line length.
    pub rms: f32,
    /// Estimated fundamental.
    pub estimate: PitchEstimate,
    /// Nearest note, when a pitch was found and lies on the note scale.
    pub note: Option<Note>,
    /// Line color: hue for a detected pitch, white otherwise.
    pub color: Rgb,
}

impl FrameReading {
    pub fn frequency(&self) -> Option<f32> {
        self.estimate.frequency()
    }
}

/// Analyzes a single snapshot of audio.
///
/// Runs the estimator, then the note and color mappers on its result.
/// A pitch too low to name still gets a color; the note is simply left out.
///
/// # Arguments
/// * `snapshot` - Latest block of samples (typically `config.buffer_size` long)
/// * `sample_rate` - Sample rate in Hz
/// * `config` - Estimator and color tunables
pub fn analyze_frame(
    snapshot: &[f32],
    sample_rate: u32,
    config: &VisualizerConfig,
) -> AnalysisResult<FrameReading> {
    let estimate = pitch::estimate(snapshot, sample_rate, config)?;
    let rms = pitch::rms(snapshot);

    let (note, color) = match estimate {
        PitchEstimate::Detected(frequency) => {
            let note = tuning::note_from_frequency(frequency).ok();
            (note, color::hue_from_frequency(frequency, config))
        }
        PitchEstimate::NoPitch => (None, Rgb::WHITE),
    };

    Ok(FrameReading {
        rms,
        estimate,
        note,
        color,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn silent_frame_is_white_and_unnamed() {
        let reading = analyze_frame(&[0.0; 1024], 48000, &VisualizerConfig::default()).unwrap();
        assert_eq!(reading.estimate, PitchEstimate::NoPitch);
        assert_eq!(reading.note, None);
        assert_eq!(reading.color, Rgb::WHITE);
        assert_eq!(reading.rms, 0.0);
    }

    #[test]
    fn tone_frame_carries_note_and_color() {
        let config = VisualizerConfig::default();
        let snapshot: Vec<f32> = (0..config.buffer_size)
            .map(|i| 0.6 * (2.0 * PI * 441.0 * i as f32 / 44100.0).sin())
            .collect();
        let reading = analyze_frame(&snapshot, 44100, &config).unwrap();

        let frequency = reading.frequency().unwrap();
        assert_eq!(reading.note.map(|n| n.name), Some(NoteName::A));
        assert_eq!(reading.color, color::hue_from_frequency(frequency, &config));
        assert!(reading.rms > 0.4);
    }

    #[test]
    fn invalid_snapshot_is_an_error() {
        let result = analyze_frame(&[0.1; 7], 44100, &VisualizerConfig::default());
        assert!(matches!(result, Err(AnalysisError::BufferLength { len: 7, .. })));
    }
}
