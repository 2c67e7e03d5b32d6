//! Chord types as ordered semitone offsets from the root.

use super::{frequency, transpose, NoteName, Octave};
use crate::error::Error;
use std::fmt;
use std::str::FromStr;

/// A chord quality, identified by its short token ("maj", "min7"...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChordId {
    Major,
    Minor,
    Diminished,
    Augmented,
    Sus4,
    Sus2,
    Dominant7,
    Major7,
}

impl ChordId {
    pub const ALL: [ChordId; 8] = [
        ChordId::Major,
        ChordId::Minor,
        ChordId::Diminished,
        ChordId::Augmented,
        ChordId::Sus4,
        ChordId::Sus2,
        ChordId::Dominant7,
        ChordId::Major7,
    ];

    /// Semitone offsets from the root, root first, ascending.
    pub fn offsets(self) -> &'static [i32] {
        match self {
            ChordId::Major => &[0, 4, 7],
            ChordId::Minor => &[0, 3, 7],
            ChordId::Diminished => &[0, 3, 6],
            ChordId::Augmented => &[0, 4, 8],
            ChordId::Sus4 => &[0, 5, 7],
            ChordId::Sus2 => &[0, 2, 7],
            ChordId::Dominant7 => &[0, 4, 7, 10],
            ChordId::Major7 => &[0, 4, 7, 11],
        }
    }

    /// Canonical answer token.
    pub fn as_str(self) -> &'static str {
        match self {
            ChordId::Major => "maj",
            ChordId::Minor => "min",
            ChordId::Diminished => "dim",
            ChordId::Augmented => "aug",
            ChordId::Sus4 => "sus4",
            ChordId::Sus2 => "sus2",
            ChordId::Dominant7 => "7",
            ChordId::Major7 => "maj7",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ChordId::Major => "major",
            ChordId::Minor => "minor",
            ChordId::Diminished => "diminished",
            ChordId::Augmented => "augmented",
            ChordId::Sus4 => "suspended fourth",
            ChordId::Sus2 => "suspended second",
            ChordId::Dominant7 => "dominant seventh",
            ChordId::Major7 => "major seventh",
        }
    }

    /// Frequencies of every chord tone, in offset order (root first).
    pub fn frequencies(self, root: NoteName, octave: Octave) -> Vec<f64> {
        let root_freq = frequency(root, octave);
        self.offsets()
            .iter()
            .map(|&semitones| transpose(root_freq, semitones))
            .collect()
    }
}

impl fmt::Display for ChordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChordId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChordId::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| Error::InvalidChord(s.to_string()))
    }
}
