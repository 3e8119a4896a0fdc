//! # Configuration Module
//!
//! All tunables of the estimator and the color mapper live in
//! [`VisualizerConfig`]. The struct is serializable so a session can be
//! reproduced from a JSON file; missing fields fall back to their defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::{AnalysisError, AnalysisResult};

/// Smallest and largest analysis window accepted by [`VisualizerConfig::validate`].
pub const MIN_BUFFER_SIZE: usize = 256;
pub const MAX_BUFFER_SIZE: usize = 8192;

/// Tunables for pitch estimation and color mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizerConfig {
    /// Number of samples per analysis window. Also bounds the longest
    /// detectable period to `buffer_size / 2` samples.
    pub buffer_size: usize,
    /// RMS level below which a frame counts as silence.
    pub silence_rms_threshold: f32,
    /// Minimum normalized correlation for a lag to enter the peak region.
    pub correlation_quality_threshold: f32,
    /// Multiplier applied to the neighbour shift during sub-sample refinement.
    pub refinement_scale: f32,
    /// Best correlation needed for the unrefined fallback estimate.
    pub weak_correlation_floor: f32,
    /// Upper end of the hue sweep, in Hz.
    pub max_audible_hz: f32,
    /// Divides `max_audible_hz` into the span covered by one channel ramp.
    pub color_stage_span: f32,
    /// Frequencies below this map to the idle color.
    pub idle_below_hz: f32,
    /// Sample rate requested from the capture device.
    pub target_sample_rate: u32,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            buffer_size: 2048,
            silence_rms_threshold: 0.02,
            correlation_quality_threshold: 0.7,
            refinement_scale: 8.0,
            weak_correlation_floor: 0.01,
            max_audible_hz: 6000.0,
            color_stage_span: 5.0,
            idle_below_hz: 2.0,
            target_sample_rate: 44100,
        }
    }
}

impl VisualizerConfig {
    /// Checks every field against its accepted range.
    pub fn validate(&self) -> AnalysisResult<()> {
        if !self.buffer_size.is_power_of_two()
            || !(MIN_BUFFER_SIZE..=MAX_BUFFER_SIZE).contains(&self.buffer_size)
        {
            return Err(invalid(format!(
                "buffer_size must be a power of two in [{MIN_BUFFER_SIZE}, {MAX_BUFFER_SIZE}], got {}",
                self.buffer_size
            )));
        }
        if !(self.silence_rms_threshold.is_finite() && self.silence_rms_threshold >= 0.0) {
            return Err(invalid(format!(
                "silence_rms_threshold must be non-negative, got {}",
                self.silence_rms_threshold
            )));
        }
        if !(self.correlation_quality_threshold > 0.0 && self.correlation_quality_threshold <= 1.0) {
            return Err(invalid(format!(
                "correlation_quality_threshold must be in (0, 1], got {}",
                self.correlation_quality_threshold
            )));
        }
        if !self.refinement_scale.is_finite() {
            return Err(invalid(format!(
                "refinement_scale must be finite, got {}",
                self.refinement_scale
            )));
        }
        if !(self.weak_correlation_floor >= 0.0 && self.weak_correlation_floor < 1.0) {
            return Err(invalid(format!(
                "weak_correlation_floor must be in [0, 1), got {}",
                self.weak_correlation_floor
            )));
        }
        for (name, value) in [
            ("max_audible_hz", self.max_audible_hz),
            ("color_stage_span", self.color_stage_span),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(format!("{name} must be positive, got {value}")));
            }
        }
        if !(self.idle_below_hz.is_finite() && self.idle_below_hz >= 0.0) {
            return Err(invalid(format!(
                "idle_below_hz must be non-negative, got {}",
                self.idle_below_hz
            )));
        }
        if self.target_sample_rate == 0 {
            return Err(AnalysisError::InvalidSampleRate(0));
        }
        Ok(())
    }

    /// Loads and validates a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path)
            .with_context(|| format!("opening config {}", path.display()))?;
        let mut data = String::new();
        file.read_to_string(&mut data)?;
        let config: Self = serde_json::from_str(&data)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Writes the configuration as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json_string = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)
            .with_context(|| format!("creating config {}", path.display()))?;
        file.write_all(json_string.as_bytes())?;
        Ok(())
    }
}

fn invalid(message: String) -> AnalysisError {
    AnalysisError::InvalidConfig(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(VisualizerConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_non_power_of_two_buffer() {
        let config = VisualizerConfig {
            buffer_size: 1000,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(AnalysisError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_zero_stage_span() {
        let config = VisualizerConfig {
            color_stage_span: 0.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(AnalysisError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_threshold_above_one() {
        let config = VisualizerConfig {
            correlation_quality_threshold: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_fields_use_defaults() {
        let config: VisualizerConfig =
            serde_json::from_str(r#"{ "buffer_size": 1024, "silence_rms_threshold": 0.05 }"#)
                .unwrap();
        assert_eq!(config.buffer_size, 1024);
        assert_eq!(config.silence_rms_threshold, 0.05);
        assert_eq!(config.correlation_quality_threshold, 0.7);
    }

    #[test]
    fn save_then_load() {
        let path = std::env::temp_dir().join(format!("pitchviz-config-{}.json", std::process::id()));
        let config = VisualizerConfig {
            buffer_size: 1024,
            correlation_quality_threshold: 0.9,
            ..Default::default()
        };
        config.save(&path).unwrap();
        let loaded = VisualizerConfig::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, config);
    }
}
