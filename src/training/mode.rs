//! Training modes and difficulty tiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error for an unrecognized mode or difficulty name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} {value:?} (expected one of: {expected})")]
pub struct ParseSettingError {
    kind: &'static str,
    value: String,
    expected: String,
}

impl ParseSettingError {
    fn new(kind: &'static str, value: &str, expected: &[&str]) -> Self {
        Self {
            kind,
            value: value.to_string(),
            expected: expected.join(", "),
        }
    }
}

/// What kind of stimulus is asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    SingleNote,
    Interval,
    Chord,
    Melody,
    Rhythm,
}

impl Mode {
    pub const ALL: [Mode; 5] = [
        Mode::SingleNote,
        Mode::Interval,
        Mode::Chord,
        Mode::Melody,
        Mode::Rhythm,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::SingleNote => "single-note",
            Mode::Interval => "interval",
            Mode::Chord => "chord",
            Mode::Melody => "melody",
            Mode::Rhythm => "rhythm",
        }
    }

    /// Points for a correct answer at multiplier 1.0.
    pub fn base_score(self) -> u32 {
        match self {
            Mode::SingleNote => 10,
            Mode::Interval => 15,
            Mode::Chord => 20,
            Mode::Melody => 25,
            Mode::Rhythm => 20,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ParseSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = Mode::ALL.iter().map(|m| m.as_str()).collect();
                ParseSettingError::new("mode", s, &names)
            })
    }
}

/// Difficulty tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [
        Difficulty::Beginner,
        Difficulty::Intermediate,
        Difficulty::Advanced,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }

    /// Score multiplier applied to a mode's base score.
    pub fn multiplier(self) -> f64 {
        match self {
            Difficulty::Beginner => 1.0,
            Difficulty::Intermediate => 1.5,
            Difficulty::Advanced => 2.0,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ParseSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Difficulty::ALL
            .iter()
            .copied()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = Difficulty::ALL.iter().map(|d| d.as_str()).collect();
                ParseSettingError::new("difficulty", s, &names)
            })
    }
}
