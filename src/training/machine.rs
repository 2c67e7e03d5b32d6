//! The question/answer cycle.
//!
//! ```text
//! Idle --play--> Playing --completed--> AwaitingAnswer --answer--> Scored
//!  ^               |                        |                        |
//!  |               +--failed / stopped------+--replay--> Playing     |
//!  +-------------------- 2 s later, next question -------------------+
//! ```
//!
//! Playback and answering exclude each other: answers are only accepted in
//! `AwaitingAnswer`, and no new question is drawn while `Playing`.

use super::mode::{Difficulty, Mode};
use super::question::{QuestionGenerator, TierVocabulary};
use crate::audio::{Playback, PlaybackOrchestrator, VoiceOutcome};
use crate::error::{Error, Result};
use crate::stats::{Attempt, StatsAggregator};
use crate::theory::Stimulus;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Pause between scoring an answer and the next question.
pub const ADVANCE_DELAY: Duration = Duration::from_secs(2);

/// Where the cycle currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Playing,
    AwaitingAnswer,
    Scored,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Idle => "idle",
            Phase::Playing => "playing",
            Phase::AwaitingAnswer => "awaiting answer",
            Phase::Scored => "scored",
        })
    }
}

/// Message for the learner about the last action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    Correct { expected: String, points: u64 },
    Incorrect { expected: String, given: String },
    /// The question could not be played; no answer is accepted for it.
    PlaybackFailed { reason: String },
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feedback::Correct { expected, points } => {
                write!(f, "Correct! It was {} (+{} points)", expected, points)
            }
            Feedback::Incorrect { expected, given } => {
                write!(f, "Incorrect. It was {}, you answered {}", expected, given)
            }
            Feedback::PlaybackFailed { reason } => write!(f, "Cannot play audio: {}", reason),
        }
    }
}

/// Result of scoring one answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub correct: bool,
    pub feedback: Feedback,
    /// When the next question will be drawn.
    pub advance_at: Instant,
}

/// Result of asking for a new question.
#[derive(Debug, Clone, PartialEq)]
pub enum QuestionOutcome {
    Ready(Stimulus),
    /// The mode has no question support; nothing is current.
    Unavailable,
    /// Playback is in flight, so the request was dropped.
    Ignored,
}

/// Drives generate → play → answer → score → next.
pub struct TrainingStateMachine {
    orchestrator: PlaybackOrchestrator,
    generator: QuestionGenerator,
    stats: StatsAggregator,
    mode: Mode,
    difficulty: Difficulty,
    phase: Phase,
    current: Option<Stimulus>,
    feedback: Option<Feedback>,
    advance_at: Option<Instant>,
}

impl TrainingStateMachine {
    pub fn new(
        orchestrator: PlaybackOrchestrator,
        generator: QuestionGenerator,
        stats: StatsAggregator,
        mode: Mode,
        difficulty: Difficulty,
    ) -> Self {
        Self {
            orchestrator,
            generator,
            stats,
            mode,
            difficulty,
            phase: Phase::Idle,
            current: None,
            feedback: None,
            advance_at: None,
        }
    }

    /// Draws the next question and makes it current.
    ///
    /// Ignored while playing. From any other phase the current question
    /// (answered or not) is replaced and feedback is cleared.
    pub fn generate_new_question(&mut self) -> QuestionOutcome {
        if self.phase == Phase::Playing {
            debug!("Ignoring new question request during playback");
            return QuestionOutcome::Ignored;
        }
        self.phase = Phase::Idle;
        self.feedback = None;
        self.advance_at = None;
        self.current = self.generator.generate(self.mode, self.difficulty);

        match &self.current {
            Some(stimulus) => {
                info!(mode = %self.mode, difficulty = %self.difficulty, %stimulus, "New question");
                QuestionOutcome::Ready(stimulus.clone())
            }
            None => {
                warn!(mode = %self.mode, "No questions available for mode");
                QuestionOutcome::Unavailable
            }
        }
    }

    /// Starts playing the current question.
    ///
    /// Allowed from `Idle` and, as a replay, from `AwaitingAnswer`. Answers
    /// are refused until [`finish_playback`](Self::finish_playback) reports
    /// the result.
    ///
    /// # Returns
    ///
    /// The playback to drive, or `None` if nothing may be played right now.
    pub fn play_current_sound(&mut self) -> Option<Playback> {
        if !matches!(self.phase, Phase::Idle | Phase::AwaitingAnswer) {
            debug!(phase = %self.phase, "Play request ignored");
            return None;
        }
        let stimulus = self.current.clone()?;
        self.phase = Phase::Playing;
        self.feedback = None;
        Some(self.orchestrator.start(stimulus))
    }

    /// Applies the result of the playback started by
    /// [`play_current_sound`](Self::play_current_sound).
    ///
    /// A completed playback opens the answer window. A stopped one returns
    /// to `Idle`. A failed one also returns to `Idle`, keeps the question
    /// for another try and records [`Feedback::PlaybackFailed`].
    pub fn finish_playback(&mut self, result: Result<VoiceOutcome>) -> Phase {
        if self.phase != Phase::Playing {
            debug!(phase = %self.phase, "Stale playback result dropped");
            return self.phase;
        }
        self.phase = match result {
            Ok(VoiceOutcome::Completed) => Phase::AwaitingAnswer,
            Ok(VoiceOutcome::Stopped) => Phase::Idle,
            Err(e) => {
                error!(error = %e, "Playback failed");
                self.feedback = Some(Feedback::PlaybackFailed {
                    reason: e.to_string(),
                });
                Phase::Idle
            }
        };
        self.phase
    }

    /// Scores an answer for the current question.
    ///
    /// # Arguments
    ///
    /// * `candidate` - The learner's answer token, compared exactly
    /// * `now` - Scoring time; the next question is due `ADVANCE_DELAY` later
    ///
    /// # Returns
    ///
    /// `None` when no answer is accepted (wrong phase, or already scored).
    pub fn check_answer(&mut self, candidate: &str, now: Instant) -> Option<Verdict> {
        if self.phase != Phase::AwaitingAnswer {
            debug!(phase = %self.phase, candidate, "Answer ignored");
            return None;
        }
        let stimulus = self.current.as_ref()?;
        let correct = stimulus.is_correct(candidate);
        let expected = stimulus.answer_label(&stimulus.answer_key());

        let points = self.stats.record(Attempt {
            mode: self.mode,
            difficulty: self.difficulty,
            correct,
        });
        let feedback = if correct {
            Feedback::Correct { expected, points }
        } else {
            Feedback::Incorrect {
                expected,
                given: stimulus.answer_label(candidate),
            }
        };
        info!(correct, candidate, score = self.stats.state().current_score, "Answer scored");

        let advance_at = now + ADVANCE_DELAY;
        self.phase = Phase::Scored;
        self.feedback = Some(feedback.clone());
        self.advance_at = Some(advance_at);
        Some(Verdict {
            correct,
            feedback,
            advance_at,
        })
    }

    /// When the scored question gives way to the next one, if pending.
    pub fn advance_deadline(&self) -> Option<Instant> {
        match self.phase {
            Phase::Scored => self.advance_at,
            _ => None,
        }
    }

    /// Moves on to the next question once the post-answer delay has passed.
    pub fn advance_if_due(&mut self, now: Instant) -> Option<QuestionOutcome> {
        match self.advance_deadline() {
            Some(at) if now >= at => {
                self.phase = Phase::Idle;
                Some(self.generate_new_question())
            }
            _ => None,
        }
    }

    /// Switches mode, abandoning the current question and any playback.
    pub fn set_mode(&mut self, mode: Mode) -> QuestionOutcome {
        self.mode = mode;
        self.abandon_current();
        self.generate_new_question()
    }

    /// Switches difficulty, abandoning the current question and any playback.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) -> QuestionOutcome {
        self.difficulty = difficulty;
        self.abandon_current();
        self.generate_new_question()
    }

    fn abandon_current(&mut self) {
        match self.orchestrator.synth().stop_all() {
            Ok(_) | Err(Error::NotInitialized) => {}
            Err(e) => warn!(error = %e, "Failed to stop playback"),
        }
        self.phase = Phase::Idle;
        self.current = None;
    }

    /// Answer tokens the current tier offers for the current mode.
    pub fn answer_choices(&self) -> Vec<&'static str> {
        TierVocabulary::for_difficulty(self.difficulty).answer_tokens(self.mode)
    }

    pub fn accepts_answers(&self) -> bool {
        self.phase == Phase::AwaitingAnswer
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current(&self) -> Option<&Stimulus> {
        self.current.as_ref()
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn stats(&self) -> &StatsAggregator {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut StatsAggregator {
        &mut self.stats
    }

    pub fn orchestrator(&self) -> &PlaybackOrchestrator {
        &self.orchestrator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::testing::{NoDeviceHost, RecordingHost};
    use crate::audio::{AudioHost, ToneSynthesizer, DEFAULT_VOLUME};
    use std::rc::Rc;

    fn machine_with(host: Box<dyn AudioHost>, mode: Mode) -> TrainingStateMachine {
        let synth = Rc::new(ToneSynthesizer::new(host, DEFAULT_VOLUME));
        TrainingStateMachine::new(
            PlaybackOrchestrator::new(synth),
            QuestionGenerator::with_seed(11),
            StatsAggregator::new(),
            mode,
            Difficulty::Beginner,
        )
    }

    fn machine(mode: Mode) -> TrainingStateMachine {
        machine_with(Box::new(RecordingHost::new()), mode)
    }

    /// Generates a question, plays it through and returns its answer key.
    async fn ready_for_answer(machine: &mut TrainingStateMachine) -> String {
        machine.generate_new_question();
        let playback = machine.play_current_sound().unwrap();
        let result = playback.await;
        assert_eq!(machine.finish_playback(result), Phase::AwaitingAnswer);
        machine.current().unwrap().answer_key()
    }

    #[test]
    fn test_starts_idle_without_question() {
        let machine = machine(Mode::SingleNote);
        assert_eq!(machine.phase(), Phase::Idle);
        assert!(machine.current().is_none());
        assert!(!machine.accepts_answers());
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_without_question_does_nothing() {
        let mut machine = machine(Mode::SingleNote);
        assert!(machine.play_current_sound().is_none());
        assert_eq!(machine.phase(), Phase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_playback_excludes_answers_and_new_questions() {
        let mut machine = machine(Mode::Chord);
        let QuestionOutcome::Ready(question) = machine.generate_new_question() else {
            panic!("expected a question");
        };

        let playback = machine.play_current_sound().unwrap();
        assert_eq!(machine.phase(), Phase::Playing);
        assert!(machine.play_current_sound().is_none());
        assert_eq!(machine.generate_new_question(), QuestionOutcome::Ignored);
        assert!(machine
            .check_answer(&question.answer_key(), Instant::now())
            .is_none());
        assert_eq!(machine.current(), Some(&question));

        let result = playback.await;
        assert_eq!(machine.finish_playback(result), Phase::AwaitingAnswer);
        assert!(machine.accepts_answers());
    }

    #[tokio::test(start_paused = true)]
    async fn test_correct_answer_scores_once() {
        let mut machine = machine(Mode::SingleNote);
        let answer = ready_for_answer(&mut machine).await;

        let verdict = machine.check_answer(&answer, Instant::now()).unwrap();
        assert!(verdict.correct);
        assert!(matches!(verdict.feedback, Feedback::Correct { points: 10, .. }));
        assert_eq!(machine.phase(), Phase::Scored);

        assert!(machine.check_answer(&answer, Instant::now()).is_none());
        assert_eq!(machine.stats().state().total_attempts, 1);
        assert_eq!(machine.stats().state().current_score, 10);
        assert_eq!(machine.stats().state().current_streak, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_answer_ignores_base_note() {
        let mut machine = machine(Mode::Interval);
        let answer = ready_for_answer(&mut machine).await;
        let base = match machine.current().unwrap() {
            Stimulus::Interval { base, .. } => base.to_string(),
            other => panic!("unexpected stimulus {:?}", other),
        };

        let verdict = machine
            .check_answer(&format!("{}{}", base, answer), Instant::now())
            .unwrap();
        assert!(!verdict.correct);
        match verdict.feedback {
            Feedback::Incorrect { expected, .. } => assert!(expected.contains(&answer)),
            other => panic!("unexpected feedback {:?}", other),
        }
        assert_eq!(machine.stats().state().current_streak, 0);
        assert_eq!(machine.stats().state().current_score, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_advances_after_delay() {
        let mut machine = machine(Mode::SingleNote);
        let answer = ready_for_answer(&mut machine).await;
        let scored_at = Instant::now();
        let verdict = machine.check_answer(&answer, scored_at).unwrap();
        assert_eq!(verdict.advance_at, scored_at + ADVANCE_DELAY);
        assert_eq!(machine.advance_deadline(), Some(scored_at + ADVANCE_DELAY));

        assert!(machine
            .advance_if_due(scored_at + Duration::from_secs(1))
            .is_none());
        assert_eq!(machine.phase(), Phase::Scored);

        let next = machine.advance_if_due(scored_at + ADVANCE_DELAY).unwrap();
        assert!(matches!(next, QuestionOutcome::Ready(_)));
        assert_eq!(machine.phase(), Phase::Idle);
        assert!(machine.feedback().is_none());
        assert!(machine.advance_deadline().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_while_awaiting_answer() {
        let mut machine = machine(Mode::SingleNote);
        ready_for_answer(&mut machine).await;
        let question = machine.current().cloned();

        let replay = machine.play_current_sound().unwrap();
        assert!(!machine.accepts_answers());
        let result = replay.await;
        assert_eq!(machine.finish_playback(result), Phase::AwaitingAnswer);
        assert_eq!(machine.current().cloned(), question);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_replay_after_scoring() {
        let mut machine = machine(Mode::SingleNote);
        let answer = ready_for_answer(&mut machine).await;
        machine.check_answer(&answer, Instant::now()).unwrap();
        assert!(machine.play_current_sound().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_playback_failure_blocks_answers() {
        let mut machine = machine_with(Box::new(NoDeviceHost), Mode::SingleNote);
        machine.generate_new_question();
        let playback = machine.play_current_sound().unwrap();
        let result = playback.await;

        assert_eq!(machine.finish_playback(result), Phase::Idle);
        assert!(matches!(
            machine.feedback(),
            Some(Feedback::PlaybackFailed { .. })
        ));
        assert!(!machine.accepts_answers());
        assert!(machine.current().is_some());
        assert!(machine.check_answer("C", Instant::now()).is_none());
        assert_eq!(machine.stats().state().total_attempts, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mode_change_stops_playback() {
        let mut machine = machine(Mode::Chord);
        machine.generate_new_question();
        let playback = machine.play_current_sound().unwrap();

        // Let the playback schedule its voices before switching.
        let mut playback = playback;
        tokio::select! {
            _ = &mut playback => panic!("playback finished too early"),
            _ = tokio::time::sleep(Duration::from_millis(100)) => {}
        }
        assert!(!machine.orchestrator().synth().active_voices().is_empty());

        let outcome = machine.set_mode(Mode::Interval);
        assert!(matches!(
            outcome,
            QuestionOutcome::Ready(Stimulus::Interval { .. })
        ));
        assert!(machine.orchestrator().synth().active_voices().is_empty());
        assert_eq!(playback.await.unwrap(), VoiceOutcome::Stopped);
        assert_eq!(machine.phase(), Phase::Idle);
        assert_eq!(machine.mode(), Mode::Interval);
    }

    #[test]
    fn test_mode_change_before_audio_init() {
        let mut machine = machine(Mode::SingleNote);
        assert!(matches!(
            machine.set_difficulty(Difficulty::Advanced),
            QuestionOutcome::Ready(_)
        ));
        assert_eq!(machine.answer_choices().len(), 12);
    }

    #[test]
    fn test_unsupported_mode_has_no_question() {
        let mut machine = machine(Mode::SingleNote);
        assert_eq!(machine.set_mode(Mode::Melody), QuestionOutcome::Unavailable);
        assert!(machine.current().is_none());
        assert!(machine.play_current_sound().is_none());
        assert!(machine.answer_choices().is_empty());
    }
}
