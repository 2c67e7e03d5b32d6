//! Interval identifiers and their semitone sizes.

use super::{frequency, transpose, NoteName, Octave};
use crate::error::Error;
use std::fmt;
use std::str::FromStr;

/// An interval between two notes, identified by its short token
/// ("3M" = major third, "5" = perfect fifth, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IntervalId {
    Unison,
    MinorSecond,
    MajorSecond,
    MinorThird,
    MajorThird,
    PerfectFourth,
    PerfectFifth,
    MinorSixth,
    MajorSixth,
    MinorSeventh,
    MajorSeventh,
    Octave,
}

impl IntervalId {
    /// Every known interval, smallest first.
    pub const ALL: [IntervalId; 12] = [
        IntervalId::Unison,
        IntervalId::MinorSecond,
        IntervalId::MajorSecond,
        IntervalId::MinorThird,
        IntervalId::MajorThird,
        IntervalId::PerfectFourth,
        IntervalId::PerfectFifth,
        IntervalId::MinorSixth,
        IntervalId::MajorSixth,
        IntervalId::MinorSeventh,
        IntervalId::MajorSeventh,
        IntervalId::Octave,
    ];

    /// Size of the interval in semitones (0-12).
    pub fn semitones(self) -> i32 {
        match self {
            IntervalId::Unison => 0,
            IntervalId::MinorSecond => 1,
            IntervalId::MajorSecond => 2,
            IntervalId::MinorThird => 3,
            IntervalId::MajorThird => 4,
            IntervalId::PerfectFourth => 5,
            IntervalId::PerfectFifth => 7,
            IntervalId::MinorSixth => 8,
            IntervalId::MajorSixth => 9,
            IntervalId::MinorSeventh => 10,
            IntervalId::MajorSeventh => 11,
            IntervalId::Octave => 12,
        }
    }

    /// Canonical answer token.
    pub fn as_str(self) -> &'static str {
        match self {
            IntervalId::Unison => "1",
            IntervalId::MinorSecond => "2m",
            IntervalId::MajorSecond => "2M",
            IntervalId::MinorThird => "3m",
            IntervalId::MajorThird => "3M",
            IntervalId::PerfectFourth => "4",
            IntervalId::PerfectFifth => "5",
            IntervalId::MinorSixth => "6m",
            IntervalId::MajorSixth => "6M",
            IntervalId::MinorSeventh => "7m",
            IntervalId::MajorSeventh => "7M",
            IntervalId::Octave => "8",
        }
    }

    /// Human-readable name for feedback display.
    pub fn name(self) -> &'static str {
        match self {
            IntervalId::Unison => "perfect unison",
            IntervalId::MinorSecond => "minor second",
            IntervalId::MajorSecond => "major second",
            IntervalId::MinorThird => "minor third",
            IntervalId::MajorThird => "major third",
            IntervalId::PerfectFourth => "perfect fourth",
            IntervalId::PerfectFifth => "perfect fifth",
            IntervalId::MinorSixth => "minor sixth",
            IntervalId::MajorSixth => "major sixth",
            IntervalId::MinorSeventh => "minor seventh",
            IntervalId::MajorSeventh => "major seventh",
            IntervalId::Octave => "octave",
        }
    }

    /// Returns the (lower, upper) frequencies of this interval above `base`.
    pub fn frequencies(self, base: NoteName, octave: Octave) -> (f64, f64) {
        let lower = frequency(base, octave);
        (lower, transpose(lower, self.semitones()))
    }
}

impl fmt::Display for IntervalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntervalId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IntervalId::ALL
            .iter()
            .copied()
            .find(|i| i.as_str() == s)
            .ok_or_else(|| Error::InvalidInterval(s.to_string()))
    }
}
