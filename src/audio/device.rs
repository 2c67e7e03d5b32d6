//! The audio device seam.
//!
//! A host opens a device context; a device owns a clock, a master gain stage
//! and a set of running voices, and reports each voice's end through the
//! callback supplied when the voice was started.

use super::voice::{Voice, VoiceId, VoiceOutcome};
use crate::error::Result;
use std::fmt;

/// Invoked exactly once when a voice ends, either naturally or because it was stopped.
///
/// Devices may call this from their render thread.
pub type EndedCallback = Box<dyn FnOnce(VoiceOutcome) + Send>;

/// Power/policy state of a device context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    Running,
    /// Created but not yet allowed to produce sound (e.g. autoplay policy).
    Suspended,
    Closed,
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeviceState::Running => "running",
            DeviceState::Suspended => "suspended",
            DeviceState::Closed => "closed",
        })
    }
}

/// Factory for device contexts. Opening happens lazily on first use.
pub trait AudioHost {
    /// Opens a new device context.
    ///
    /// # Errors
    ///
    /// `Error::AudioUnsupported` when there is no output device at all,
    /// `Error::DeviceInitFailed` when one exists but cannot be opened.
    fn open(&self) -> Result<Box<dyn AudioDevice>>;
}

/// An open device context.
pub trait AudioDevice {
    /// Current device clock, in seconds since the context was opened.
    fn current_time(&self) -> f64;

    fn state(&self) -> DeviceState;

    /// Brings a suspended context back to `Running`.
    fn resume(&mut self) -> Result<()>;

    /// Sets the master output gain (0.0-1.0). Takes effect immediately.
    fn set_master_gain(&mut self, gain: f32);

    /// Schedules a voice. `on_ended` fires once the voice has stopped.
    fn start_voice(&mut self, voice: Voice, on_ended: EndedCallback);

    /// Truncates a voice so it stops at `at` (device clock seconds).
    ///
    /// Returns false if the voice has already ended or been stopped.
    fn stop_voice(&mut self, id: VoiceId, at: f64) -> bool;

    /// Stops every voice and releases the output.
    fn close(&mut self);
}
