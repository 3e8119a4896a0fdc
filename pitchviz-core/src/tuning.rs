//! # Musical Tuning Module
//!
//! Converts frequencies to the nearest equal-tempered note, A4 = 440 Hz.
//! Notes are numbered MIDI-style: A4 is 69, C4 is 60, C-1 is 0.
//!
//! ## Features
//! - Nearest-semitone note numbers and chromatic pitch-class names
//! - Note number to frequency lookup from a precomputed table
//! - Cent deviation between a measured and a target frequency

use once_cell::sync::Lazy;
use std::fmt;

use crate::error::{AnalysisError, AnalysisResult};

/// Reference pitch for note 69 (A4).
pub const A4_FREQUENCY: f32 = 440.0;
/// MIDI-style number of A4.
pub const A4_NOTE_NUMBER: i32 = 69;
/// Highest note number covered by the frequency table.
pub const MAX_TABLE_NOTE: i32 = 127;

/// One of the twelve chromatic pitch classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteName {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl NoteName {
    /// Pitch classes in table order, starting at C.
    pub const ALL: [NoteName; 12] = [
        NoteName::C,
        NoteName::CSharp,
        NoteName::D,
        NoteName::DSharp,
        NoteName::E,
        NoteName::F,
        NoteName::FSharp,
        NoteName::G,
        NoteName::GSharp,
        NoteName::A,
        NoteName::ASharp,
        NoteName::B,
    ];

    /// Pitch class of any note number. Negative numbers wrap with
    /// Euclidean remainder, so this never fails.
    pub fn from_note_number(number: i32) -> Self {
        Self::ALL[number.rem_euclid(12) as usize]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NoteName::C => "C",
            NoteName::CSharp => "C#",
            NoteName::D => "D",
            NoteName::DSharp => "D#",
            NoteName::E => "E",
            NoteName::F => "F",
            NoteName::FSharp => "F#",
            NoteName::G => "G",
            NoteName::GSharp => "G#",
            NoteName::A => "A",
            NoteName::ASharp => "A#",
            NoteName::B => "B",
        }
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A note on the MIDI-style scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Note {
    /// Note number (A4 = 69), never negative
    pub number: i32,
    /// Pitch class
    pub name: NoteName,
}

impl Note {
    /// Builds a note from its number, rejecting negative numbers.
    pub fn from_number(number: i32) -> AnalysisResult<Self> {
        if number < 0 {
            return Err(AnalysisError::NoteOutOfRange(number));
        }
        Ok(Self {
            number,
            name: NoteName::from_note_number(number),
        })
    }

    /// Scientific octave number: C4 is middle C.
    pub fn octave(&self) -> i32 {
        self.number.div_euclid(12) - 1
    }

    /// Equal-tempered frequency of this note.
    pub fn frequency(&self) -> f32 {
        frequency_from_note_number(self.number)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.octave())
    }
}

/// Equal-tempered frequencies for note numbers 0..=127, computed once.
static NOTE_FREQUENCIES: Lazy<Vec<f32>> = Lazy::new(|| {
    (0..=MAX_TABLE_NOTE)
        .map(|n| A4_FREQUENCY * 2.0_f32.powf((n - A4_NOTE_NUMBER) as f32 / 12.0))
        .collect()
});

/// Nearest note number for a frequency: `round(12 * log2(f / 440)) + 69`.
///
/// # Returns
/// * `Ok(number)` - Note number, possibly above the table range
/// * `Err(InvalidFrequency)` - `freq` is not finite and positive
/// * `Err(NoteOutOfRange)` - `freq` lies below note 0 (about 8.18 Hz)
pub fn note_number_from_frequency(freq: f32) -> AnalysisResult<i32> {
    if !(freq.is_finite() && freq > 0.0) {
        return Err(AnalysisError::InvalidFrequency(freq));
    }
    let semitones = 12.0 * (freq / A4_FREQUENCY).log2();
    let number = semitones.round() as i32 + A4_NOTE_NUMBER;
    if number < 0 {
        return Err(AnalysisError::NoteOutOfRange(number));
    }
    Ok(number)
}

/// Nearest note to a frequency.
pub fn note_from_frequency(freq: f32) -> AnalysisResult<Note> {
    Note::from_number(note_number_from_frequency(freq)?)
}

/// Equal-tempered frequency of a note number.
///
/// Numbers inside 0..=127 come from the precomputed table; anything else
/// is computed directly.
pub fn frequency_from_note_number(number: i32) -> f32 {
    match usize::try_from(number) {
        Ok(index) if index < NOTE_FREQUENCIES.len() => NOTE_FREQUENCIES[index],
        _ => A4_FREQUENCY * 2.0_f32.powf((number - A4_NOTE_NUMBER) as f32 / 12.0),
    }
}

/// Calculates the deviation from a target frequency in cents.
///
/// 100 cents = 1 semitone; positive values are sharp, negative flat.
pub fn cents_deviation(freq: f32, target_freq: f32) -> f32 {
    1200.0 * (freq / target_freq).log2()
}
