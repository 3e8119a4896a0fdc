//! Error types for the analysis core

use thiserror::Error;

/// Errors raised by the estimator and the frequency mapper.
///
/// Silence and missing periodicity are not errors; they come back as
/// [`crate::pitch::PitchEstimate::NoPitch`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// The sample buffer holds no samples
    #[error("Sample buffer is empty")]
    EmptyBuffer,

    /// Sample rate must be positive
    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(u32),

    /// Buffer length cannot hold the correlation window
    #[error("Invalid buffer length {len}: need an even length of at least {min} samples")]
    BufferLength { len: usize, min: usize },

    /// Frequency is not a finite positive value
    #[error("Invalid frequency: {0} Hz")]
    InvalidFrequency(f32),

    /// Note number below the bottom of the note table
    #[error("Note number {0} is out of range")]
    NoteOutOfRange(i32),

    /// Configuration value outside its accepted range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for analysis operations
pub type AnalysisResult<T> = Result<T, AnalysisError>;
