//! Melody steps: notes and rests measured in beats.

use super::{NoteName, Octave};
use std::fmt;

/// Tempo used when a caller does not specify one.
pub const DEFAULT_TEMPO_BPM: f64 = 100.0;

/// One entry in a melody.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MelodyStep {
    /// A sounded note lasting `beats` beats.
    Note {
        note: NoteName,
        octave: Octave,
        beats: f64,
    },
    /// Silence lasting `beats` beats.
    Rest { beats: f64 },
}

impl MelodyStep {
    pub fn note(note: NoteName, octave: Octave, beats: f64) -> Self {
        MelodyStep::Note {
            note,
            octave,
            beats,
        }
    }

    pub fn rest(beats: f64) -> Self {
        MelodyStep::Rest { beats }
    }

    /// Length of the step in beats.
    pub fn beats(&self) -> f64 {
        match *self {
            MelodyStep::Note { beats, .. } | MelodyStep::Rest { beats } => beats,
        }
    }

    /// Length of the step in seconds at the given beat duration.
    pub fn seconds(&self, beat_secs: f64) -> f64 {
        self.beats() * beat_secs
    }
}

impl fmt::Display for MelodyStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MelodyStep::Note { note, octave, .. } => write!(f, "{}{}", note, octave),
            MelodyStep::Rest { .. } => f.write_str("rest"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_seconds() {
        // At 60 BPM one beat is one second.
        let beat = 60.0 / 60.0;
        assert_eq!(MelodyStep::note(NoteName::C, 4, 1.0).seconds(beat), 1.0);
        assert_eq!(MelodyStep::rest(2.0).seconds(0.5), 1.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(MelodyStep::note(NoteName::FSharp, 5, 1.0).to_string(), "F#5");
        assert_eq!(MelodyStep::rest(1.0).to_string(), "rest");
    }
}
