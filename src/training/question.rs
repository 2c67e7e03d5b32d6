//! Random question generation within a difficulty tier's vocabulary.

use super::mode::{Difficulty, Mode};
use crate::theory::{ChordId, IntervalId, NoteName, Octave, Stimulus, REFERENCE_OCTAVE};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

use ChordId::*;
use NoteName::*;

/// The legal values a tier may ask about, per mode.
#[derive(Debug)]
pub struct TierVocabulary {
    /// Single-note pitch classes.
    pub notes: &'static [NoteName],
    /// Candidate octaves for single notes (one entry means a fixed octave).
    pub note_octaves: &'static [Octave],
    pub intervals: &'static [IntervalId],
    pub interval_bases: &'static [NoteName],
    pub chords: &'static [ChordId],
    pub chord_roots: &'static [NoteName],
    /// Intervals sound one note after the other, chords as arpeggios.
    pub broken: bool,
}

const CHROMATIC: &[NoteName] = &NoteName::ALL;
const NATURALS: &[NoteName] = &NoteName::NATURALS;

static BEGINNER: TierVocabulary = TierVocabulary {
    notes: NATURALS,
    note_octaves: &[REFERENCE_OCTAVE],
    intervals: &[IntervalId::MajorThird, IntervalId::PerfectFifth, IntervalId::Octave],
    interval_bases: &[C, F, G],
    chords: &[Major, Minor],
    chord_roots: &[C, F, G],
    broken: true,
};

static INTERMEDIATE: TierVocabulary = TierVocabulary {
    notes: CHROMATIC,
    note_octaves: &[REFERENCE_OCTAVE],
    intervals: &[
        IntervalId::MajorSecond,
        IntervalId::MinorThird,
        IntervalId::MajorThird,
        IntervalId::PerfectFourth,
        IntervalId::PerfectFifth,
        IntervalId::MajorSixth,
        IntervalId::Octave,
    ],
    interval_bases: NATURALS,
    chords: &[Major, Minor, Diminished, Augmented],
    chord_roots: NATURALS,
    broken: false,
};

static ADVANCED: TierVocabulary = TierVocabulary {
    notes: CHROMATIC,
    note_octaves: &[3, 4, 5],
    intervals: &[
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
    ],
    interval_bases: CHROMATIC,
    chords: &ChordId::ALL,
    chord_roots: CHROMATIC,
    broken: false,
};

impl TierVocabulary {
    pub fn for_difficulty(difficulty: Difficulty) -> &'static TierVocabulary {
        match difficulty {
            Difficulty::Beginner => &BEGINNER,
            Difficulty::Intermediate => &INTERMEDIATE,
            Difficulty::Advanced => &ADVANCED,
        }
    }

    /// Answer tokens the learner can choose from in `mode`.
    ///
    /// Empty for modes without question support.
    pub fn answer_tokens(&self, mode: Mode) -> Vec<&'static str> {
        match mode {
            Mode::SingleNote => self.notes.iter().map(|n| n.as_str()).collect(),
            Mode::Interval => self.intervals.iter().map(|i| i.as_str()).collect(),
            Mode::Chord => self.chords.iter().map(|c| c.as_str()).collect(),
            Mode::Melody | Mode::Rhythm => Vec::new(),
        }
    }
}

/// Octave used for interval bases and chord roots.
const HARMONY_OCTAVE: Octave = REFERENCE_OCTAVE;

/// Draws random stimuli, uniformly over a tier's vocabulary.
pub struct QuestionGenerator {
    rng: StdRng,
}

impl QuestionGenerator {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic generator for reproducible sessions.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Produces a stimulus for `(mode, difficulty)`.
    ///
    /// # Returns
    ///
    /// `None` for modes that have no question support yet (melody, rhythm).
    pub fn generate(&mut self, mode: Mode, difficulty: Difficulty) -> Option<Stimulus> {
        let vocab = TierVocabulary::for_difficulty(difficulty);
        let stimulus = match mode {
            Mode::SingleNote => Stimulus::SingleNote {
                note: *vocab.notes.choose(&mut self.rng)?,
                octave: *vocab.note_octaves.choose(&mut self.rng)?,
            },
            Mode::Interval => Stimulus::Interval {
                base: *vocab.interval_bases.choose(&mut self.rng)?,
                octave: HARMONY_OCTAVE,
                interval: *vocab.intervals.choose(&mut self.rng)?,
                sequential: vocab.broken,
            },
            Mode::Chord => Stimulus::Chord {
                root: *vocab.chord_roots.choose(&mut self.rng)?,
                octave: HARMONY_OCTAVE,
                chord: *vocab.chords.choose(&mut self.rng)?,
                arpeggio: vocab.broken,
            },
            Mode::Melody | Mode::Rhythm => {
                debug!(%mode, "No question support for mode");
                return None;
            }
        };
        Some(stimulus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_never_leaves_tier_vocabulary() {
        let mut generator = QuestionGenerator::with_seed(7);
        for difficulty in Difficulty::ALL {
            let vocab = TierVocabulary::for_difficulty(difficulty);
            for _ in 0..200 {
                match generator.generate(Mode::SingleNote, difficulty).unwrap() {
                    Stimulus::SingleNote { note, octave } => {
                        assert!(vocab.notes.contains(&note));
                        assert!(vocab.note_octaves.contains(&octave));
                    }
                    other => panic!("unexpected stimulus {:?}", other),
                }
                match generator.generate(Mode::Interval, difficulty).unwrap() {
                    Stimulus::Interval { base, interval, .. } => {
                        assert!(vocab.interval_bases.contains(&base));
                        assert!(vocab.intervals.contains(&interval));
                    }
                    other => panic!("unexpected stimulus {:?}", other),
                }
                match generator.generate(Mode::Chord, difficulty).unwrap() {
                    Stimulus::Chord { root, chord, .. } => {
                        assert!(vocab.chord_roots.contains(&root));
                        assert!(vocab.chords.contains(&chord));
                    }
                    other => panic!("unexpected stimulus {:?}", other),
                }
            }
        }
    }

    #[test]
    fn test_covers_whole_vocabulary() {
        let mut generator = QuestionGenerator::with_seed(42);
        let seen: HashSet<String> = (0..500)
            .filter_map(|_| generator.generate(Mode::Chord, Difficulty::Advanced))
            .map(|s| s.answer_key())
            .collect();
        assert_eq!(seen.len(), ChordId::ALL.len());

        let octaves: HashSet<Octave> = (0..300)
            .filter_map(|_| generator.generate(Mode::SingleNote, Difficulty::Advanced))
            .map(|s| match s {
                Stimulus::SingleNote { octave, .. } => octave,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(octaves, HashSet::from([3, 4, 5]));
    }

    #[test]
    fn test_beginner_plays_broken_forms() {
        let mut generator = QuestionGenerator::with_seed(1);
        assert!(matches!(
            generator.generate(Mode::Interval, Difficulty::Beginner),
            Some(Stimulus::Interval { sequential: true, octave: 4, .. })
        ));
        assert!(matches!(
            generator.generate(Mode::Chord, Difficulty::Beginner),
            Some(Stimulus::Chord { arpeggio: true, .. })
        ));
        assert!(matches!(
            generator.generate(Mode::Chord, Difficulty::Intermediate),
            Some(Stimulus::Chord { arpeggio: false, .. })
        ));
    }

    #[test]
    fn test_unsupported_modes_yield_nothing() {
        let mut generator = QuestionGenerator::with_seed(3);
        for difficulty in Difficulty::ALL {
            assert!(generator.generate(Mode::Melody, difficulty).is_none());
            assert!(generator.generate(Mode::Rhythm, difficulty).is_none());
        }
    }

    #[test]
    fn test_same_seed_same_questions() {
        let mut a = QuestionGenerator::with_seed(99);
        let mut b = QuestionGenerator::with_seed(99);
        for _ in 0..20 {
            assert_eq!(
                a.generate(Mode::Interval, Difficulty::Advanced),
                b.generate(Mode::Interval, Difficulty::Advanced)
            );
        }
    }

    #[test]
    fn test_answer_tokens() {
        let beginner = TierVocabulary::for_difficulty(Difficulty::Beginner);
        assert_eq!(beginner.answer_tokens(Mode::Interval), vec!["3M", "5", "8"]);
        assert_eq!(beginner.answer_tokens(Mode::Chord), vec!["maj", "min"]);
        assert_eq!(beginner.answer_tokens(Mode::SingleNote).len(), 7);
        assert!(beginner.answer_tokens(Mode::Melody).is_empty());

        let advanced = TierVocabulary::for_difficulty(Difficulty::Advanced);
        assert_eq!(advanced.answer_tokens(Mode::Interval).len(), 11);
        assert!(!advanced.answer_tokens(Mode::Interval).contains(&"1"));
    }
}
