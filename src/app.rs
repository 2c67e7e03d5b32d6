//! The interactive trainer.
//!
//! `Trainer` maps user commands onto the training state machine and drives
//! everything that happens on its own: playback completion, answer cues and
//! the delayed move to the next question. All of it runs on one cooperative
//! timeline, so a command is never handled halfway through another event.

use crate::audio::{
    AudioHost, DeviceState, Playback, PlaybackOrchestrator, ToneSynthesizer, VoiceOutcome,
};
use crate::error::{Error, Result};
use crate::stats::{StatsAggregator, StatsStore, StatsSummary, DEFAULT_STATS_PATH};
use crate::theory::{MelodyStep, NoteName};
use crate::training::{
    Difficulty, Feedback, Mode, ParseSettingError, Phase, QuestionGenerator, QuestionOutcome,
    TrainingStateMachine,
};
use std::fmt;
use std::future::pending;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::rc::Rc;
use std::str::FromStr;
use thiserror::Error;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

/// Rising arpeggio played after a correct answer.
static CORRECT_CUE: [MelodyStep; 4] = [
    MelodyStep::Note {
        note: NoteName::C,
        octave: 4,
        beats: 0.2,
    },
    MelodyStep::Note {
        note: NoteName::E,
        octave: 4,
        beats: 0.2,
    },
    MelodyStep::Note {
        note: NoteName::G,
        octave: 4,
        beats: 0.2,
    },
    MelodyStep::Note {
        note: NoteName::C,
        octave: 5,
        beats: 0.4,
    },
];
const CORRECT_CUE_TEMPO: f64 = 200.0;

/// Falling figure played after a wrong answer.
static INCORRECT_CUE: [MelodyStep; 3] = [
    MelodyStep::Note {
        note: NoteName::G,
        octave: 4,
        beats: 0.3,
    },
    MelodyStep::Note {
        note: NoteName::F,
        octave: 4,
        beats: 0.3,
    },
    MelodyStep::Note {
        note: NoteName::E,
        octave: 4,
        beats: 0.6,
    },
];
const INCORRECT_CUE_TEMPO: f64 = 120.0;

/// Startup settings for a training session.
#[derive(Debug, Clone)]
pub struct TrainerConfig {
    pub mode: Mode,
    pub difficulty: Difficulty,
    /// Initial master volume (0.0-1.0).
    pub volume: f32,
    pub stats_path: PathBuf,
    /// Play a short jingle after each scored answer.
    pub cues: bool,
    /// Start from empty stats, overwriting the stored record.
    pub reset_stats: bool,
    /// Seed for a reproducible question sequence.
    pub seed: Option<u64>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            mode: Mode::SingleNote,
            difficulty: Difficulty::Beginner,
            volume: crate::audio::DEFAULT_VOLUME,
            stats_path: PathBuf::from(DEFAULT_STATS_PATH),
            cues: true,
            reset_stats: false,
            seed: None,
        }
    }
}

/// A discrete user action.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Play,
    Answer(String),
    Mode(Mode),
    Difficulty(Difficulty),
    Volume(f32),
    Stop,
    Stats,
    Reset,
    Choices,
    Help,
    Quit,
}

/// Error for a command line that could not be understood.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),
    #[error(transparent)]
    Setting(#[from] ParseSettingError),
    #[error("invalid volume {0:?} (expected a number from 0 to 1)")]
    InvalidVolume(String),
}

impl FromStr for Command {
    type Err = CommandError;

    /// Parses one input line. Anything that is not a command word is taken
    /// as an answer token.
    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let head = words.next().ok_or(CommandError::Empty)?;
        let arg = words.next();
        let command = match head {
            "play" | "replay" => Command::Play,
            "answer" => Command::Answer(required(arg, "answer")?.to_string()),
            "mode" => Command::Mode(required(arg, "mode")?.parse()?),
            "difficulty" => Command::Difficulty(required(arg, "difficulty")?.parse()?),
            "volume" => {
                let value = required(arg, "volume")?;
                Command::Volume(
                    value
                        .parse()
                        .map_err(|_| CommandError::InvalidVolume(value.to_string()))?,
                )
            }
            "stop" => Command::Stop,
            "stats" => Command::Stats,
            "reset" => Command::Reset,
            "choices" => Command::Choices,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            token => Command::Answer(token.to_string()),
        };
        Ok(command)
    }
}

/// One line of user input, parsed or not.
pub type Input = std::result::Result<Command, CommandError>;

fn required<'a>(
    arg: Option<&'a str>,
    command: &'static str,
) -> std::result::Result<&'a str, CommandError> {
    arg.ok_or(CommandError::MissingArgument(command))
}

/// Something the learner should be told.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    QuestionReady {
        mode: Mode,
        difficulty: Difficulty,
    },
    NoQuestion {
        mode: Mode,
    },
    Playing,
    AwaitingAnswer {
        choices: Vec<&'static str>,
    },
    PlaybackStopped,
    Feedback(Feedback),
    Choices(Vec<&'static str>),
    Stats {
        summary: StatsSummary,
        device: Option<DeviceState>,
    },
    StatsReset,
    Volume(f32),
    Stopped(usize),
    /// A command that does not apply in the current phase.
    Ignored(&'static str),
    Help,
    Error(String),
}

const HELP: &str = "\
Commands:
  play                 play (or replay) the current question
  answer <token>       answer; a bare token works too (C#, 3M, maj7...)
  choices              list the answers for this mode and difficulty
  mode <name>          single-note | interval | chord | melody | rhythm
  difficulty <tier>    beginner | intermediate | advanced
  volume <0..1>        set the master volume
  stop                 stop all sound
  stats                show your statistics
  reset                clear your statistics
  quit                 leave";

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::QuestionReady { mode, difficulty } => {
                write!(f, "New {} question ({}). Type `play` to hear it.", mode, difficulty)
            }
            Notice::NoQuestion { mode } => {
                write!(f, "No questions available for {} mode yet.", mode)
            }
            Notice::Playing => f.write_str("Playing..."),
            Notice::AwaitingAnswer { choices } => {
                write!(f, "Your answer? [{}]", choices.join(" "))
            }
            Notice::PlaybackStopped => {
                f.write_str("Playback stopped. Type `play` to hear it again.")
            }
            Notice::Feedback(feedback) => write!(f, "{}", feedback),
            Notice::Choices(choices) if choices.is_empty() => {
                f.write_str("No choices in this mode.")
            }
            Notice::Choices(choices) => write!(f, "Choices: {}", choices.join(" ")),
            Notice::Stats { summary, device } => {
                write!(f, "{}", summary)?;
                match device {
                    Some(state) => write!(f, "\nAudio:     {}", state),
                    None => write!(f, "\nAudio:     not initialized"),
                }
            }
            Notice::StatsReset => f.write_str("Statistics cleared."),
            Notice::Volume(volume) => write!(f, "Volume: {:.0}%", volume * 100.0),
            Notice::Stopped(count) => write!(f, "Stopped {} voice(s).", count),
            Notice::Ignored(reason) => f.write_str(reason),
            Notice::Help => f.write_str(HELP),
            Notice::Error(message) => write!(f, "Error: {}", message),
        }
    }
}

/// What finished while the trainer was waiting.
enum Event {
    PlaybackDone(Result<VoiceOutcome>),
    CueDone(Result<VoiceOutcome>),
    AdvanceDue,
}

/// Runs one training session.
pub struct Trainer {
    machine: TrainingStateMachine,
    store: StatsStore,
    cues: bool,
    /// Question playback in flight.
    playback: Option<Playback>,
    /// Answer cue in flight.
    cue: Option<Playback>,
    notices: UnboundedSender<Notice>,
}

impl Trainer {
    /// Creates a trainer and loads the stored stats.
    ///
    /// # Arguments
    ///
    /// * `config` - Session settings
    /// * `host` - Audio backend; no device is opened until the first playback
    /// * `notices` - Receives everything the learner should see
    pub fn new(
        config: TrainerConfig,
        host: Box<dyn AudioHost>,
        notices: UnboundedSender<Notice>,
    ) -> Self {
        let store = StatsStore::new(&config.stats_path);
        let stats = if config.reset_stats {
            let stats = StatsAggregator::new();
            save_stats(&store, &stats);
            stats
        } else {
            match store.load() {
                Ok(Some(state)) => StatsAggregator::restore(state),
                Ok(None) => StatsAggregator::new(),
                Err(e) => {
                    warn!("Failed to load stats, starting fresh: {}", e);
                    StatsAggregator::new()
                }
            }
        };

        let generator = match config.seed {
            Some(seed) => QuestionGenerator::with_seed(seed),
            None => QuestionGenerator::from_entropy(),
        };
        let synth = Rc::new(ToneSynthesizer::new(host, config.volume));
        let machine = TrainingStateMachine::new(
            PlaybackOrchestrator::new(synth),
            generator,
            stats,
            config.mode,
            config.difficulty,
        );

        Self {
            machine,
            store,
            cues: config.cues,
            playback: None,
            cue: None,
            notices,
        }
    }

    pub fn machine(&self) -> &TrainingStateMachine {
        &self.machine
    }

    /// Poses the first question.
    pub fn start(&mut self) {
        let outcome = self.machine.generate_new_question();
        self.announce(outcome);
    }

    /// Applies one user command.
    ///
    /// # Returns
    ///
    /// `ControlFlow::Break` when the session should end.
    pub fn handle(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::Play => match self.machine.play_current_sound() {
                Some(playback) => {
                    self.playback = Some(playback);
                    self.notify(Notice::Playing);
                }
                None => self.notify(Notice::Ignored("Nothing to play right now.")),
            },
            Command::Answer(token) => self.answer(&token),
            Command::Mode(mode) => {
                let outcome = self.machine.set_mode(mode);
                self.abandon_audio();
                self.announce(outcome);
            }
            Command::Difficulty(difficulty) => {
                let outcome = self.machine.set_difficulty(difficulty);
                self.abandon_audio();
                self.announce(outcome);
            }
            Command::Volume(volume) => {
                let synth = self.machine.orchestrator().synth();
                match synth.initialize().and_then(|_| synth.set_volume(volume)) {
                    Ok(applied) => self.notify(Notice::Volume(applied)),
                    Err(e) => self.notify(Notice::Error(e.to_string())),
                }
            }
            Command::Stop => match self.machine.orchestrator().synth().stop_all() {
                Ok(count) => self.notify(Notice::Stopped(count)),
                Err(Error::NotInitialized) => self.notify(Notice::Stopped(0)),
                Err(e) => self.notify(Notice::Error(e.to_string())),
            },
            Command::Stats => {
                let notice = Notice::Stats {
                    summary: self.machine.stats().summary(),
                    device: self.machine.orchestrator().synth().device_state(),
                };
                self.notify(notice);
            }
            Command::Reset => {
                self.machine.stats_mut().reset();
                save_stats(&self.store, self.machine.stats());
                self.notify(Notice::StatsReset);
            }
            Command::Choices => self.notify(Notice::Choices(self.machine.answer_choices())),
            Command::Help => self.notify(Notice::Help),
            Command::Quit => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    /// Waits for the next playback, cue or timer event and applies it.
    ///
    /// Never returns while nothing is pending. Cancel-safe: pending work
    /// stays with the trainer if the returned future is dropped.
    pub async fn step(&mut self) {
        let event = tokio::select! {
            result = settle(&mut self.playback) => Event::PlaybackDone(result),
            result = settle(&mut self.cue) => Event::CueDone(result),
            _ = until(self.machine.advance_deadline()) => Event::AdvanceDue,
        };

        match event {
            Event::PlaybackDone(result) => {
                let failed = result.is_err();
                match self.machine.finish_playback(result) {
                    Phase::AwaitingAnswer => {
                        let choices = self.machine.answer_choices();
                        self.notify(Notice::AwaitingAnswer { choices });
                    }
                    Phase::Idle if failed => {
                        if let Some(feedback) = self.machine.feedback().cloned() {
                            self.notify(Notice::Feedback(feedback));
                        }
                    }
                    Phase::Idle => self.notify(Notice::PlaybackStopped),
                    _ => {}
                }
            }
            Event::CueDone(Err(e)) => debug!("Skipped answer cue: {}", e),
            Event::CueDone(Ok(_)) => {}
            Event::AdvanceDue => {
                if let Some(outcome) = self.machine.advance_if_due(Instant::now()) {
                    self.announce(outcome);
                }
            }
        }
    }

    /// Runs the session until `Quit` or until the input channel closes.
    ///
    /// Lines that failed to parse are reported as [`Notice::Error`].
    pub async fn run(&mut self, mut inputs: UnboundedReceiver<Input>) {
        self.start();
        loop {
            tokio::select! {
                input = inputs.recv() => match input {
                    Some(Ok(command)) => {
                        if self.handle(command).is_break() {
                            break;
                        }
                    }
                    Some(Err(e)) => self.notify(Notice::Error(e.to_string())),
                    None => break,
                },
                _ = self.step() => {}
            }
        }
        self.shutdown();
    }

    /// Silences and releases the audio device.
    pub fn shutdown(&mut self) {
        self.playback = None;
        self.cue = None;
        self.machine.orchestrator().synth().close();
        info!("Session ended");
    }

    fn answer(&mut self, token: &str) {
        let Some(verdict) = self.machine.check_answer(token, Instant::now()) else {
            self.notify(Notice::Ignored("Not accepting answers right now."));
            return;
        };
        save_stats(&self.store, self.machine.stats());
        if self.cues {
            self.cue = Some(self.start_cue(verdict.correct));
        }
        self.notify(Notice::Feedback(verdict.feedback));
    }

    fn start_cue(&self, correct: bool) -> Playback {
        let (steps, tempo): (&'static [MelodyStep], f64) = if correct {
            (&CORRECT_CUE, CORRECT_CUE_TEMPO)
        } else {
            (&INCORRECT_CUE, INCORRECT_CUE_TEMPO)
        };
        let orchestrator = self.machine.orchestrator().clone();
        Box::pin(async move { orchestrator.play_melody(steps, tempo).await })
    }

    /// Drops playbacks the state machine has abandoned.
    fn abandon_audio(&mut self) {
        self.playback = None;
        self.cue = None;
    }

    fn announce(&self, outcome: QuestionOutcome) {
        let notice = match outcome {
            QuestionOutcome::Ready(_) => Notice::QuestionReady {
                mode: self.machine.mode(),
                difficulty: self.machine.difficulty(),
            },
            QuestionOutcome::Unavailable => Notice::NoQuestion {
                mode: self.machine.mode(),
            },
            QuestionOutcome::Ignored => return,
        };
        self.notify(notice);
    }

    fn notify(&self, notice: Notice) {
        // The receiver only goes away at shutdown.
        let _ = self.notices.send(notice);
    }
}

fn save_stats(store: &StatsStore, stats: &StatsAggregator) {
    if let Err(e) = store.save(stats.state()) {
        warn!("Failed to save stats: {}", e);
    }
}

/// Awaits the playback in `slot`, clearing it once finished.
/// Pending forever when the slot is empty.
async fn settle(slot: &mut Option<Playback>) -> Result<VoiceOutcome> {
    match slot {
        Some(playback) => {
            let result = playback.await;
            *slot = None;
            result
        }
        None => pending().await,
    }
}

async fn until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => time::sleep_until(at).await,
        None => pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::testing::{NoDeviceHost, RecordingHost};
    use crate::stats::StatsState;
    use std::time::Duration;
    use tempfile::{tempdir, TempDir};
    use tokio::sync::mpsc;

    struct Harness {
        trainer: Trainer,
        notices: UnboundedReceiver<Notice>,
        host: RecordingHost,
        dir: TempDir,
    }

    impl Harness {
        fn drain(&mut self) -> Vec<Notice> {
            let mut out = Vec::new();
            while let Ok(notice) = self.notices.try_recv() {
                out.push(notice);
            }
            out
        }

        fn answer_key(&self) -> String {
            self.trainer.machine().current().unwrap().answer_key()
        }
    }

    fn config(dir: &TempDir) -> TrainerConfig {
        TrainerConfig {
            stats_path: dir.path().join("stats.json"),
            cues: false,
            seed: Some(5),
            ..TrainerConfig::default()
        }
    }

    fn harness_with(config: TrainerConfig, dir: TempDir) -> Harness {
        let host = RecordingHost::new();
        let (tx, rx) = mpsc::unbounded_channel();
        let trainer = Trainer::new(config, Box::new(host.clone()), tx);
        Harness {
            trainer,
            notices: rx,
            host,
            dir,
        }
    }

    fn harness() -> Harness {
        let dir = tempdir().unwrap();
        let config = config(&dir);
        harness_with(config, dir)
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_round() {
        let mut h = harness();
        h.trainer.start();
        assert!(matches!(h.drain()[..], [Notice::QuestionReady { .. }]));

        let _ = h.trainer.handle(Command::Play);
        assert_eq!(h.drain(), vec![Notice::Playing]);
        h.trainer.step().await;
        assert!(matches!(h.drain()[..], [Notice::AwaitingAnswer { .. }]));
        assert_eq!(h.host.voices().len(), 1);

        let answer = h.answer_key();
        let _ = h.trainer.handle(Command::Answer(answer));
        assert!(matches!(
            h.drain()[..],
            [Notice::Feedback(Feedback::Correct { points: 10, .. })]
        ));

        let scored_at = Instant::now();
        h.trainer.step().await;
        let waited = scored_at.elapsed();
        assert!(waited >= Duration::from_secs(2) && waited < Duration::from_millis(2010));
        assert!(matches!(h.drain()[..], [Notice::QuestionReady { .. }]));
        assert_eq!(h.trainer.machine().phase(), Phase::Idle);

        let saved = StatsStore::new(h.dir.path().join("stats.json"))
            .load()
            .unwrap()
            .unwrap();
        assert_eq!(saved.current_score, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_answer_before_play_is_ignored() {
        let mut h = harness();
        h.trainer.start();
        h.drain();
        let _ = h.trainer.handle(Command::Answer("C".to_string()));
        assert_eq!(
            h.drain(),
            vec![Notice::Ignored("Not accepting answers right now.")]
        );
        assert_eq!(h.trainer.machine().stats().state().total_attempts, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cue_plays_after_answer() {
        let dir = tempdir().unwrap();
        let config = TrainerConfig {
            cues: true,
            ..config(&dir)
        };
        let mut h = harness_with(config, dir);
        h.trainer.start();
        let _ = h.trainer.handle(Command::Play);
        h.trainer.step().await;
        let _ = h.trainer.handle(Command::Answer("not-a-note".to_string()));

        // Cue finishes well before the next question is due.
        h.trainer.step().await;
        assert_eq!(h.host.voices().len(), 1 + INCORRECT_CUE.len());
        assert_eq!(h.trainer.machine().phase(), Phase::Scored);
        h.drain();

        h.trainer.step().await;
        assert!(matches!(h.drain()[..], [Notice::QuestionReady { .. }]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_interrupts_playback() {
        let mut h = harness();
        h.trainer.start();
        let _ = h.trainer.handle(Command::Play);
        h.drain();

        tokio::select! {
            _ = h.trainer.step() => panic!("playback ended too early"),
            _ = time::sleep(Duration::from_millis(300)) => {}
        }
        let _ = h.trainer.handle(Command::Stop);
        assert_eq!(h.drain(), vec![Notice::Stopped(1)]);

        h.trainer.step().await;
        assert_eq!(h.drain(), vec![Notice::PlaybackStopped]);
        assert_eq!(h.trainer.machine().phase(), Phase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mode_change_abandons_question() {
        let mut h = harness();
        h.trainer.start();
        let _ = h.trainer.handle(Command::Play);
        h.drain();

        let _ = h.trainer.handle(Command::Mode(Mode::Chord));
        assert_eq!(
            h.drain(),
            vec![Notice::QuestionReady {
                mode: Mode::Chord,
                difficulty: Difficulty::Beginner
            }]
        );
        assert_eq!(h.trainer.machine().phase(), Phase::Idle);

        let _ = h.trainer.handle(Command::Mode(Mode::Rhythm));
        assert_eq!(h.drain(), vec![Notice::NoQuestion { mode: Mode::Rhythm }]);
        let _ = h.trainer.handle(Command::Play);
        assert_eq!(h.drain(), vec![Notice::Ignored("Nothing to play right now.")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_playback_failure_is_reported() {
        let dir = tempdir().unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut trainer = Trainer::new(config(&dir), Box::new(NoDeviceHost), tx);
        trainer.start();
        let _ = trainer.handle(Command::Play);
        trainer.step().await;

        let notices: Vec<Notice> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        assert!(matches!(
            notices.last(),
            Some(Notice::Feedback(Feedback::PlaybackFailed { .. }))
        ));
        assert!(!trainer.machine().accepts_answers());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats_loaded_and_reset() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stats.json");
        let stored = StatsState {
            total_attempts: 9,
            correct_answers: 6,
            current_score: 150,
            ..StatsState::default()
        };
        StatsStore::new(&path).save(&stored).unwrap();

        let mut h = harness_with(config(&dir), dir);
        let _ = h.trainer.handle(Command::Stats);
        match h.drain().pop() {
            Some(Notice::Stats { summary, device }) => {
                assert_eq!(summary.score, 150);
                assert_eq!(summary.accuracy, 67);
                assert_eq!(device, None);
            }
            other => panic!("unexpected notice {:?}", other),
        }

        let _ = h.trainer.handle(Command::Reset);
        assert_eq!(h.drain(), vec![Notice::StatsReset]);
        let saved = StatsStore::new(&path).load().unwrap().unwrap();
        assert_eq!(saved, StatsState::default());
    }

    #[test]
    fn test_reset_flag_overwrites_stored_stats() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stats.json");
        let stored = StatsState {
            current_score: 900,
            ..StatsState::default()
        };
        StatsStore::new(&path).save(&stored).unwrap();

        let config = TrainerConfig {
            reset_stats: true,
            ..config(&dir)
        };
        let h = harness_with(config, dir);
        assert_eq!(h.trainer.machine().stats().state().current_score, 0);
        assert_eq!(StatsStore::new(&path).load().unwrap().unwrap().current_score, 0);
    }

    #[test]
    fn test_volume_opens_device() {
        let mut h = harness();
        let _ = h.trainer.handle(Command::Volume(1.7));
        assert_eq!(h.drain(), vec![Notice::Volume(1.0)]);
        assert_eq!(
            h.trainer.machine().orchestrator().synth().device_state(),
            Some(DeviceState::Running)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_until_quit() {
        let mut h = harness();
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(Ok(Command::Play)).unwrap();
        tx.send(Ok(Command::Choices)).unwrap();
        tx.send(Ok(Command::Quit)).unwrap();

        h.trainer.run(rx).await;
        let notices = h.drain();
        assert!(matches!(notices[0], Notice::QuestionReady { .. }));
        assert_eq!(notices[1], Notice::Playing);
        assert!(matches!(notices[2], Notice::Choices(ref c) if c.len() == 7));
        assert_eq!(h.trainer.machine().orchestrator().synth().device_state(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_quit_ends_notices_while_input_stays_open() {
        let dir = tempdir().unwrap();
        let (notice_tx, mut notice_rx) = mpsc::unbounded_channel();
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let mut trainer = Trainer::new(config(&dir), Box::new(RecordingHost::new()), notice_tx);

        let printer = tokio::spawn(async move {
            let mut seen = Vec::new();
            while let Some(notice) = notice_rx.recv().await {
                seen.push(notice);
            }
            seen
        });

        input_tx.send("mode polka".parse::<Command>()).unwrap();
        input_tx.send(Ok(Command::Quit)).unwrap();
        trainer.run(input_rx).await;
        drop(trainer);

        // The input side is still held, as by a reader blocked on stdin.
        let seen = time::timeout(Duration::from_secs(5), printer)
            .await
            .expect("notice stream did not end")
            .unwrap();
        assert!(matches!(seen.last(), Some(Notice::Error(_))));
        drop(input_tx);
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!("play".parse::<Command>().unwrap(), Command::Play);
        assert_eq!(
            "answer 3M".parse::<Command>().unwrap(),
            Command::Answer("3M".to_string())
        );
        assert_eq!(
            "  F# ".parse::<Command>().unwrap(),
            Command::Answer("F#".to_string())
        );
        assert_eq!(
            "mode chord".parse::<Command>().unwrap(),
            Command::Mode(Mode::Chord)
        );
        assert_eq!(
            "difficulty advanced".parse::<Command>().unwrap(),
            Command::Difficulty(Difficulty::Advanced)
        );
        assert_eq!("volume 0.5".parse::<Command>().unwrap(), Command::Volume(0.5));
        assert_eq!("quit".parse::<Command>().unwrap(), Command::Quit);

        assert_eq!("".parse::<Command>(), Err(CommandError::Empty));
        assert_eq!(
            "mode".parse::<Command>(),
            Err(CommandError::MissingArgument("mode"))
        );
        assert!(matches!(
            "mode polka".parse::<Command>(),
            Err(CommandError::Setting(_))
        ));
        assert!(matches!(
            "volume loud".parse::<Command>(),
            Err(CommandError::InvalidVolume(_))
        ));
    }
}
