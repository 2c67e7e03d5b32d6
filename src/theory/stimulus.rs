//! The musical question posed to the learner.

use super::{ChordId, IntervalId, MelodyStep, NoteName, Octave};
use std::fmt;

/// How long a generated stimulus sounds, in seconds.
pub const STIMULUS_DURATION_SECS: f64 = 1.0;

/// A generated question. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub enum Stimulus {
    SingleNote {
        note: NoteName,
        octave: Octave,
    },
    Interval {
        base: NoteName,
        octave: Octave,
        interval: IntervalId,
        /// Play the two notes one after the other instead of together.
        sequential: bool,
    },
    Chord {
        root: NoteName,
        octave: Octave,
        chord: ChordId,
        /// Play the chord tones one by one, root first.
        arpeggio: bool,
    },
    Melody {
        steps: Vec<MelodyStep>,
        tempo_bpm: f64,
    },
}

impl Stimulus {
    /// The canonical answer token the learner must reproduce.
    ///
    /// For intervals and chords only the type is asked for; the base or
    /// root note is not part of the answer.
    pub fn answer_key(&self) -> String {
        match self {
            Stimulus::SingleNote { note, .. } => note.as_str().to_string(),
            Stimulus::Interval { interval, .. } => interval.as_str().to_string(),
            Stimulus::Chord { chord, .. } => chord.as_str().to_string(),
            Stimulus::Melody { steps, .. } => steps
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    /// Display label for an answer token in the context of this stimulus.
    pub fn answer_label(&self, token: &str) -> String {
        let name = match self {
            Stimulus::Interval { .. } => token.parse::<IntervalId>().ok().map(|i| i.name()),
            Stimulus::Chord { .. } => token.parse::<ChordId>().ok().map(|c| c.name()),
            _ => None,
        };
        match name {
            Some(name) => format!("{} ({})", name, token),
            None => token.to_string(),
        }
    }

    /// Returns true if `candidate` exactly matches the canonical answer.
    pub fn is_correct(&self, candidate: &str) -> bool {
        self.answer_key() == candidate
    }
}

impl fmt::Display for Stimulus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stimulus::SingleNote { note, octave } => write!(f, "{}{}", note, octave),
            Stimulus::Interval {
                base,
                octave,
                interval,
                ..
            } => write!(f, "{}{} + {}", base, octave, interval.name()),
            Stimulus::Chord {
                root,
                octave,
                chord,
                ..
            } => write!(f, "{}{} {}", root, octave, chord.name()),
            Stimulus::Melody { tempo_bpm, .. } => {
                write!(f, "{} @ {} bpm", self.answer_key(), tempo_bpm)
            }
        }
    }
}
