//! Music theory primitives for the trainer.
//!
//! This module maps pitch classes to frequencies (12-tone equal temperament,
//! anchored on a fixed octave-4 table with A4 = 440 Hz), intervals and chord
//! types to semitone offsets, and defines the stimulus data model that the
//! question generator produces and the playback orchestrator consumes.

mod chord;
mod interval;
mod melody;
mod note;
mod stimulus;

pub use chord::ChordId;
pub use interval::IntervalId;
pub use melody::{MelodyStep, DEFAULT_TEMPO_BPM};
pub use note::{frequency, NoteName, Octave, REFERENCE_OCTAVE};
pub use stimulus::{Stimulus, STIMULUS_DURATION_SECS};

/// Number of semitones in one octave.
pub const SEMITONES_PER_OCTAVE: i32 = 12;

/// Shifts a frequency by a number of equal-tempered semitones.
///
/// # Arguments
///
/// * `frequency` - Base frequency in Hz
/// * `semitones` - Offset in semitones (can be negative)
///
/// # Returns
///
/// `frequency * 2^(semitones / 12)`
pub fn transpose(frequency: f64, semitones: i32) -> f64 {
    frequency * 2f64.powf(semitones as f64 / SEMITONES_PER_OCTAVE as f64)
}
