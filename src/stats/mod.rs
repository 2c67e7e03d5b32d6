//! Attempt statistics: accuracy, streaks, score and rank.
//!
//! `StatsAggregator` is the single owner of the `StatsState` record. The
//! record serializes with the same field names it has always been stored
//! under, and missing fields fall back to defaults when loading.

mod store;

pub use store::{StatsStore, DEFAULT_STATS_PATH};

use crate::training::{Difficulty, Mode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::info;

/// Attempts and correct answers within one mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeStats {
    pub attempts: u32,
    pub correct: u32,
}

impl ModeStats {
    /// Rounded percentage of correct answers, 0 when there are no attempts.
    pub fn accuracy(&self) -> u32 {
        percentage(self.correct, self.attempts)
    }
}

/// The persisted statistics record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatsState {
    pub total_attempts: u32,
    pub correct_answers: u32,
    pub current_streak: u32,
    pub best_streak: u32,
    pub current_score: u64,
    pub modes: BTreeMap<Mode, ModeStats>,
}

impl Default for StatsState {
    fn default() -> Self {
        Self {
            total_attempts: 0,
            correct_answers: 0,
            current_streak: 0,
            best_streak: 0,
            current_score: 0,
            modes: Mode::ALL
                .iter()
                .map(|mode| (*mode, ModeStats::default()))
                .collect(),
        }
    }
}

impl StatsState {
    /// Adds zeroed entries for modes absent from a loaded record.
    pub fn fill_missing_modes(&mut self) {
        for mode in Mode::ALL {
            self.modes.entry(mode).or_default();
        }
    }
}

/// One scored answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    pub mode: Mode,
    pub difficulty: Difficulty,
    pub correct: bool,
}

impl Attempt {
    /// Points a correct attempt is worth: base score times tier multiplier, rounded.
    pub fn points(&self) -> u64 {
        (self.mode.base_score() as f64 * self.difficulty.multiplier()).round() as u64
    }
}

/// Rank tiers, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rank {
    Novice,
    Beginner,
    BeginnerPlus,
    Intermediate,
    Advanced,
    Expert,
    Master,
}

impl Rank {
    /// Minimum score for each rank, lowest first.
    const THRESHOLDS: [(u64, Rank); 7] = [
        (0, Rank::Novice),
        (100, Rank::Beginner),
        (500, Rank::BeginnerPlus),
        (1000, Rank::Intermediate),
        (2000, Rank::Advanced),
        (5000, Rank::Expert),
        (10000, Rank::Master),
    ];

    /// The highest rank whose threshold `score` reaches.
    pub fn for_score(score: u64) -> Rank {
        Self::THRESHOLDS
            .iter()
            .rev()
            .find(|(threshold, _)| score >= *threshold)
            .map(|(_, rank)| *rank)
            .unwrap_or(Rank::Novice)
    }

    pub fn label(self) -> &'static str {
        match self {
            Rank::Novice => "Novice",
            Rank::Beginner => "Beginner",
            Rank::BeginnerPlus => "Beginner+",
            Rank::Intermediate => "Intermediate",
            Rank::Advanced => "Advanced",
            Rank::Expert => "Expert",
            Rank::Master => "Master",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Folds attempts into the stats record.
#[derive(Debug, Clone, Default)]
pub struct StatsAggregator {
    state: StatsState,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from a loaded record.
    pub fn restore(mut state: StatsState) -> Self {
        state.fill_missing_modes();
        Self { state }
    }

    pub fn state(&self) -> &StatsState {
        &self.state
    }

    /// Records one scored attempt.
    ///
    /// # Returns
    ///
    /// Points added to the score (0 for an incorrect attempt).
    pub fn record(&mut self, attempt: Attempt) -> u64 {
        let state = &mut self.state;
        let mode = state.modes.entry(attempt.mode).or_default();
        state.total_attempts += 1;
        mode.attempts += 1;

        if !attempt.correct {
            state.current_streak = 0;
            return 0;
        }

        let points = attempt.points();
        mode.correct += 1;
        state.correct_answers += 1;
        state.current_streak += 1;
        state.current_score += points;
        state.best_streak = state.best_streak.max(state.current_streak);
        points
    }

    pub fn rank(&self) -> Rank {
        Rank::for_score(self.state.current_score)
    }

    /// Rounded overall percentage of correct answers, 0 with no attempts.
    pub fn accuracy(&self) -> u32 {
        percentage(self.state.correct_answers, self.state.total_attempts)
    }

    pub fn mode_accuracy(&self, mode: Mode) -> u32 {
        self.state
            .modes
            .get(&mode)
            .map(ModeStats::accuracy)
            .unwrap_or(0)
    }

    /// Clears every counter back to the default record.
    pub fn reset(&mut self) {
        self.state = StatsState::default();
        info!("Stats reset");
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary {
            score: self.state.current_score,
            accuracy: self.accuracy(),
            current_streak: self.state.current_streak,
            best_streak: self.state.best_streak,
            total_attempts: self.state.total_attempts,
            rank: self.rank(),
            modes: self
                .state
                .modes
                .iter()
                .filter(|(_, stats)| stats.attempts > 0)
                .map(|(mode, stats)| (*mode, *stats))
                .collect(),
        }
    }
}

/// Snapshot of the stats for display.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSummary {
    pub score: u64,
    pub accuracy: u32,
    pub current_streak: u32,
    pub best_streak: u32,
    pub total_attempts: u32,
    pub rank: Rank,
    /// Modes with at least one attempt.
    pub modes: Vec<(Mode, ModeStats)>,
}

impl fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Score:     {} ({})", self.score, self.rank)?;
        writeln!(f, "Accuracy:  {}% of {} attempts", self.accuracy, self.total_attempts)?;
        write!(
            f,
            "Streak:    {} (best {})",
            self.current_streak, self.best_streak
        )?;
        for (mode, stats) in &self.modes {
            write!(
                f,
                "\n  {:<12} {:>3}% ({}/{})",
                mode.as_str(),
                stats.accuracy(),
                stats.correct,
                stats.attempts
            )?;
        }
        Ok(())
    }
}

fn percentage(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        0
    } else {
        (part as f64 / whole as f64 * 100.0).round() as u32
    }
}
