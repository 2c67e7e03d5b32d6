//! Error types shared by the synthesis engine, music theory parsing
//! and stats persistence.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the trainer library.
#[derive(Error, Debug)]
pub enum Error {
    /// The platform offers no audio output device at all.
    #[error("audio output is not supported on this system")]
    AudioUnsupported,

    /// An output device exists but could not be opened.
    #[error("failed to initialize audio device: {0}")]
    DeviceInitFailed(String),

    /// A synthesizer operation was attempted before `initialize()` succeeded.
    #[error("audio engine is not initialized")]
    NotInitialized,

    /// The device is suspended or closed and could not be resumed.
    #[error("audio device is not ready: {0}")]
    NotReady(String),

    #[error("invalid note: {0:?}")]
    InvalidNote(String),

    #[error("invalid interval: {0:?}")]
    InvalidInterval(String),

    #[error("invalid chord: {0:?}")]
    InvalidChord(String),

    /// Loading or saving the stats record failed.
    #[error("stats persistence failed for {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Returns true for failures that mean "no sound can be produced right now".
    ///
    /// These are reported to the learner as a playback problem; the session
    /// itself keeps running.
    pub fn is_audio_unavailable(&self) -> bool {
        matches!(
            self,
            Error::AudioUnsupported
                | Error::DeviceInitFailed(_)
                | Error::NotInitialized
                | Error::NotReady(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
