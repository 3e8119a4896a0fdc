//! # Pitch Detection Module
//!
//! This module estimates the fundamental frequency of a block of audio using
//! plain time-domain autocorrelation. No windowing function is applied.
//!
//! ## Features
//! - RMS amplitude gate to skip silence and low-level noise
//! - Normalized absolute-difference correlation over half the buffer
//! - Hysteresis peak selection: the first local maximum past the quality
//!   threshold wins, later harmonic peaks are ignored
//! - Neighbour-based sub-sample refinement
//! - Input validation before any indexing

use crate::config::VisualizerConfig;
use crate::error::{AnalysisError, AnalysisResult};

/// Shortest buffer that still leaves room for a peak and both neighbours.
pub const MIN_BUFFER_LEN: usize = 4;

/// Outcome of a single estimation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PitchEstimate {
    /// Signal too quiet, or no usable periodicity.
    NoPitch,
    /// Estimated fundamental in Hz: finite, positive and below Nyquist.
    Detected(f32),
}

impl PitchEstimate {
    /// The detected frequency, if any.
    pub fn frequency(&self) -> Option<f32> {
        match *self {
            PitchEstimate::Detected(frequency) => Some(frequency),
            PitchEstimate::NoPitch => None,
        }
    }

    pub fn is_detected(&self) -> bool {
        matches!(self, PitchEstimate::Detected(_))
    }

    /// Wraps a raw frequency. Anything non-finite, non-positive or at or
    /// above Nyquist (`sample_rate / 2`) collapses to `NoPitch`.
    fn from_frequency(frequency: f32, sample_rate: u32) -> Self {
        let nyquist = sample_rate as f32 / 2.0;
        if frequency.is_finite() && frequency > 0.0 && frequency < nyquist {
            PitchEstimate::Detected(frequency)
        } else {
            PitchEstimate::NoPitch
        }
    }
}

/// Where the hysteresis sweep stopped.
#[derive(Debug, Clone, Copy, PartialEq)]
enum PeakSearch {
    /// Never entered a good region.
    NotFound,
    /// Correlation stopped rising inside a good region.
    Closed { best_offset: usize, best_correlation: f32 },
    /// Still rising when the lags ran out.
    Open { best_offset: usize, best_correlation: f32 },
}

/// Root-mean-square level of a signal. Empty input has level 0.
pub fn rms(signal: &[f32]) -> f32 {
    if signal.is_empty() {
        return 0.0;
    }
    (signal.iter().map(|&s| s * s).sum::<f32>() / signal.len() as f32).sqrt()
}

/// Estimates the fundamental frequency of `signal`.
///
/// The correlation window is half the buffer, so the longest detectable
/// period is `signal.len() / 2 - 1` samples.
///
/// # Arguments
/// * `signal` - Snapshot of the most recent samples, values in [-1, 1]
/// * `sample_rate` - Sample rate in Hz
/// * `config` - Gate, quality threshold and refinement tunables
///
/// # Returns
/// * `Ok(PitchEstimate::Detected(hz))` - A periodic signal was found
/// * `Ok(PitchEstimate::NoPitch)` - Silence, or no qualifying correlation peak
/// * `Err(_)` - Empty or badly sized buffer, or a zero sample rate
pub fn estimate(
    signal: &[f32],
    sample_rate: u32,
    config: &VisualizerConfig,
) -> AnalysisResult<PitchEstimate> {
    let window = correlation_window(signal)?;
    if sample_rate == 0 {
        return Err(AnalysisError::InvalidSampleRate(sample_rate));
    }

    // --- Amplitude gate ---
    let level = rms(signal);
    if level < config.silence_rms_threshold {
        log::trace!("rms {level:.4} below gate {}", config.silence_rms_threshold);
        return Ok(PitchEstimate::NoPitch);
    }

    // --- Correlation sweep with hysteresis ---
    let threshold = config.correlation_quality_threshold;
    let (correlations, search) =
        select_peak(window, threshold, |offset| correlation_at(signal, window, offset));

    let estimate = match search {
        PeakSearch::Closed { best_offset, .. } => refine_peak(
            &correlations,
            Some(best_offset),
            sample_rate,
            config.refinement_scale,
        ),
        // Still rising when the sweep ran out: use the lag unrefined.
        PeakSearch::Open {
            best_offset,
            best_correlation,
        } if best_offset > 0 && best_correlation > config.weak_correlation_floor => {
            PitchEstimate::from_frequency(sample_rate as f32 / best_offset as f32, sample_rate)
        }
        _ => PitchEstimate::NoPitch,
    };
    log::trace!("{search:?} -> {estimate:?}");
    Ok(estimate)
}

/// Sweeps lags `[0, window)` and stops at the first local maximum above
/// `threshold`. Later peaks, even stronger ones, are never looked at.
///
/// Returns the correlations computed so far (including the lag that ended
/// the region) and where the search stopped.
fn select_peak(
    window: usize,
    threshold: f32,
    mut correlation_at: impl FnMut(usize) -> f32,
) -> (Vec<f32>, PeakSearch) {
    let mut correlations = Vec::with_capacity(window);
    let mut best: Option<(usize, f32)> = None;
    let mut last_correlation = 1.0f32;

    for offset in 0..window {
        let correlation = correlation_at(offset);
        correlations.push(correlation);

        if correlation > threshold && correlation > last_correlation {
            if best.is_none_or(|(_, best_correlation)| correlation > best_correlation) {
                best = Some((offset, correlation));
            }
        } else if let Some((best_offset, best_correlation)) = best {
            return (
                correlations,
                PeakSearch::Closed {
                    best_offset,
                    best_correlation,
                },
            );
        }
        last_correlation = correlation;
    }

    let search = match best {
        Some((best_offset, best_correlation)) => PeakSearch::Open {
            best_offset,
            best_correlation,
        },
        None => PeakSearch::NotFound,
    };
    (correlations, search)
}

/// Returns the normalized correlation for every lag in `[0, len / 2)`.
///
/// Useful for inspecting why a frame did or did not lock on.
pub fn correlation_curve(signal: &[f32]) -> AnalysisResult<Vec<f32>> {
    let window = correlation_window(signal)?;
    Ok((0..window)
        .map(|offset| correlation_at(signal, window, offset))
        .collect())
}

/// Validates the buffer length and returns the correlation window `M`.
///
/// The sweep reads up to index `2M - 2`, so the buffer must be even and
/// hold at least `2M - 1` samples.
fn correlation_window(signal: &[f32]) -> AnalysisResult<usize> {
    let len = signal.len();
    if len == 0 {
        return Err(AnalysisError::EmptyBuffer);
    }
    if len % 2 != 0 || len < MIN_BUFFER_LEN {
        return Err(AnalysisError::BufferLength {
            len,
            min: MIN_BUFFER_LEN,
        });
    }
    let window = len / 2;
    debug_assert!(2 * window - 1 <= len, "sweep would read past the buffer");
    Ok(window)
}

/// `1 - mean(|x[i] - x[i + offset]|)` over the first `window` samples.
fn correlation_at(signal: &[f32], window: usize, offset: usize) -> f32 {
    let distance: f32 = signal[..window]
        .iter()
        .zip(&signal[offset..offset + window])
        .map(|(a, b)| (a - b).abs())
        .sum();
    1.0 - distance / window as f32
}

/// Shifts the peak lag using its neighbours and converts it to Hz.
fn refine_peak(
    correlations: &[f32],
    best_offset: Option<usize>,
    sample_rate: u32,
    refinement_scale: f32,
) -> PitchEstimate {
    let best = match best_offset {
        Some(best) if best >= 1 => best,
        _ => return PitchEstimate::NoPitch,
    };
    if best + 1 >= correlations.len() {
        return PitchEstimate::from_frequency(sample_rate as f32 / best as f32, sample_rate);
    }

    let shift = (correlations[best + 1] - correlations[best - 1]) / correlations[best];
    let period = best as f32 + refinement_scale * shift;
    PitchEstimate::from_frequency(sample_rate as f32 / period, sample_rate)
}
