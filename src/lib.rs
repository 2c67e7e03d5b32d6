//! soundmaster - An ear-training trainer.
//!
//! This library provides the core of the trainer: music theory lookups,
//! tone synthesis and playback scheduling, the question/answer state
//! machine and statistics.

pub mod app;
pub mod audio;
pub mod error;
pub mod stats;
pub mod theory;
pub mod training;

// Re-export commonly used types
pub use app::{Command, Input, Notice, Trainer, TrainerConfig};
pub use audio::{PlaybackOrchestrator, ToneSynthesizer, VoiceOutcome};
pub use error::{Error, Result};
pub use stats::{StatsAggregator, StatsState};
pub use training::{Difficulty, Mode, TrainingStateMachine};
