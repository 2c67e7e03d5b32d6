//! Training session logic: what is asked, when playback is allowed and how
//! answers are scored.

mod machine;
mod mode;
mod question;

pub use machine::{Feedback, Phase, QuestionOutcome, TrainingStateMachine, Verdict, ADVANCE_DELAY};
pub use mode::{Difficulty, Mode, ParseSettingError};
pub use question::{QuestionGenerator, TierVocabulary};
