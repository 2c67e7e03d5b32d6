//! Pitch classes and their frequencies.

use crate::error::Error;
use std::fmt;
use std::str::FromStr;

/// Octave number in scientific pitch notation (C4 = middle C).
pub type Octave = i32;

/// The octave whose frequencies are listed in the base table.
pub const REFERENCE_OCTAVE: Octave = 4;

/// One of the twelve pitch classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
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
    /// All pitch classes in ascending chromatic order starting from C.
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

    /// The seven natural (white-key) pitch classes.
    pub const NATURALS: [NoteName; 7] = [
        NoteName::C,
        NoteName::D,
        NoteName::E,
        NoteName::F,
        NoteName::G,
        NoteName::A,
        NoteName::B,
    ];

    /// Frequency in Hz of this pitch class in octave 4.
    pub fn base_frequency(self) -> f64 {
        match self {
            NoteName::C => 261.63,
            NoteName::CSharp => 277.18,
            NoteName::D => 293.66,
            NoteName::DSharp => 311.13,
            NoteName::E => 329.63,
            NoteName::F => 349.23,
            NoteName::FSharp => 369.99,
            NoteName::G => 392.00,
            NoteName::GSharp => 415.30,
            NoteName::A => 440.00,
            NoteName::ASharp => 466.16,
            NoteName::B => 493.88,
        }
    }

    /// Canonical token used for answers and display ("C", "F#", ...).
    pub fn as_str(self) -> &'static str {
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

    /// Frequency of this pitch class in the given octave.
    pub fn frequency(self, octave: Octave) -> f64 {
        frequency(self, octave)
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteName {
    type Err = Error;

    /// Parses a canonical note token. Sharps only; matching is exact.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NoteName::ALL
            .iter()
            .copied()
            .find(|n| n.as_str() == s)
            .ok_or_else(|| Error::InvalidNote(s.to_string()))
    }
}

/// Computes the frequency of a note: `base(note) * 2^(octave - 4)`.
///
/// # Examples
///
/// ```
/// use soundmaster::theory::{frequency, NoteName};
///
/// assert_eq!(frequency(NoteName::A, 4), 440.0);
/// assert_eq!(frequency(NoteName::A, 5), 880.0);
/// ```
pub fn frequency(note: NoteName, octave: Octave) -> f64 {
    note.base_frequency() * 2f64.powi(octave - REFERENCE_OCTAVE)
}
