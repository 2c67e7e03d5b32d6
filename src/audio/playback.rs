//! Playback orchestration: musical requests in, scheduled tones out.
//!
//! Sequential forms (melodies, sequential intervals, arpeggios) strictly
//! serialize their steps: step N+1 is only scheduled after step N's
//! completion was awaited. A `Stopped` step ends the whole sequence.

use super::engine::ToneSynthesizer;
use super::voice::VoiceOutcome;
use crate::error::Result;
use crate::theory::{
    frequency, ChordId, IntervalId, MelodyStep, NoteName, Octave, Stimulus, DEFAULT_TEMPO_BPM,
    STIMULUS_DURATION_SECS,
};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use tracing::{debug, warn};

/// A playback in flight, detached from the orchestrator that started it.
pub type Playback = Pin<Box<dyn Future<Output = Result<VoiceOutcome>>>>;

/// One step of a serialized sequence.
#[derive(Debug, Clone, Copy)]
enum Step {
    Tone { frequency: f64, secs: f64 },
    Rest { secs: f64 },
}

/// Turns notes, intervals, chords and melodies into synthesizer calls.
#[derive(Clone)]
pub struct PlaybackOrchestrator {
    synth: Rc<ToneSynthesizer>,
}

impl PlaybackOrchestrator {
    pub fn new(synth: Rc<ToneSynthesizer>) -> Self {
        Self { synth }
    }

    pub fn synth(&self) -> &ToneSynthesizer {
        &self.synth
    }

    /// Plays a single note.
    ///
    /// # Arguments
    ///
    /// * `note` - Pitch class
    /// * `octave` - Octave number (4 holds middle C)
    /// * `duration` - Length in seconds
    pub async fn play_note(
        &self,
        note: NoteName,
        octave: Octave,
        duration: f64,
    ) -> Result<VoiceOutcome> {
        self.synth.ensure_ready()?;
        let done = self.synth.play_tone(frequency(note, octave), duration)?;
        Ok(done.await)
    }

    /// Plays an interval above `base`.
    ///
    /// Sequential playback sounds base then upper note for the full
    /// `duration` each; otherwise both sound together for `duration`.
    pub async fn play_interval(
        &self,
        base: NoteName,
        interval: IntervalId,
        octave: Octave,
        duration: f64,
        sequential: bool,
    ) -> Result<VoiceOutcome> {
        self.synth.ensure_ready()?;
        let (low, high) = interval.frequencies(base, octave);
        if sequential {
            self.play_sequence(vec![
                Step::Tone {
                    frequency: low,
                    secs: duration,
                },
                Step::Tone {
                    frequency: high,
                    secs: duration,
                },
            ])
            .await
        } else {
            let done = self.synth.play_chord_tones(&[low, high], duration)?;
            Ok(done.await)
        }
    }

    /// Plays a chord on `root`.
    ///
    /// An arpeggio plays the tones root first, splitting `duration` evenly
    /// between them; a block chord sounds every tone for the full `duration`.
    pub async fn play_chord(
        &self,
        root: NoteName,
        chord: ChordId,
        octave: Octave,
        duration: f64,
        arpeggio: bool,
    ) -> Result<VoiceOutcome> {
        self.synth.ensure_ready()?;
        let frequencies = chord.frequencies(root, octave);
        if arpeggio {
            let secs = duration / frequencies.len().max(1) as f64;
            self.play_sequence(
                frequencies
                    .into_iter()
                    .map(|frequency| Step::Tone { frequency, secs })
                    .collect(),
            )
            .await
        } else {
            let done = self.synth.play_chord_tones(&frequencies, duration)?;
            Ok(done.await)
        }
    }

    /// Plays a melody, one step after the other.
    ///
    /// # Arguments
    ///
    /// * `steps` - Notes and rests, lengths in beats
    /// * `tempo_bpm` - Beats per minute; non-positive or non-finite values
    ///   fall back to [`DEFAULT_TEMPO_BPM`]
    pub async fn play_melody(&self, steps: &[MelodyStep], tempo_bpm: f64) -> Result<VoiceOutcome> {
        self.synth.ensure_ready()?;
        let tempo_bpm = if tempo_bpm.is_finite() && tempo_bpm > 0.0 {
            tempo_bpm
        } else {
            warn!(tempo_bpm, "Invalid tempo, using default");
            DEFAULT_TEMPO_BPM
        };
        let beat_secs = 60.0 / tempo_bpm;

        let sequence = steps
            .iter()
            .map(|step| match *step {
                MelodyStep::Note { note, octave, .. } => Step::Tone {
                    frequency: frequency(note, octave),
                    secs: step.seconds(beat_secs),
                },
                MelodyStep::Rest { .. } => Step::Rest {
                    secs: step.seconds(beat_secs),
                },
            })
            .collect();
        self.play_sequence(sequence).await
    }

    /// Plays a generated question with its own playback flags.
    pub async fn play_stimulus(&self, stimulus: &Stimulus) -> Result<VoiceOutcome> {
        debug!(%stimulus, "Playing stimulus");
        match stimulus {
            Stimulus::SingleNote { note, octave } => {
                self.play_note(*note, *octave, STIMULUS_DURATION_SECS).await
            }
            Stimulus::Interval {
                base,
                octave,
                interval,
                sequential,
            } => {
                self.play_interval(*base, *interval, *octave, STIMULUS_DURATION_SECS, *sequential)
                    .await
            }
            Stimulus::Chord {
                root,
                octave,
                chord,
                arpeggio,
            } => {
                self.play_chord(*root, *chord, *octave, STIMULUS_DURATION_SECS, *arpeggio)
                    .await
            }
            Stimulus::Melody { steps, tempo_bpm } => self.play_melody(steps, *tempo_bpm).await,
        }
    }

    /// Starts playing `stimulus` as a detached future.
    pub fn start(&self, stimulus: Stimulus) -> Playback {
        let orchestrator = self.clone();
        Box::pin(async move { orchestrator.play_stimulus(&stimulus).await })
    }

    async fn play_sequence(&self, steps: Vec<Step>) -> Result<VoiceOutcome> {
        let generation = self.synth.stop_generation();
        for step in steps {
            if self.synth.stop_generation() != generation {
                debug!("Sequence stopped between steps");
                return Ok(VoiceOutcome::Stopped);
            }
            let outcome = match step {
                Step::Tone { frequency, secs } => self.synth.play_tone(frequency, secs)?.await,
                Step::Rest { secs } => self.synth.rest(secs).await?,
            };
            if !outcome.is_completed() {
                debug!("Sequence stopped early");
                return Ok(outcome);
            }
        }
        Ok(VoiceOutcome::Completed)
    }
}
