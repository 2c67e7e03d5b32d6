//! Tone synthesis and playback.
//!
//! This module turns musical requests into scheduled sine voices:
//! - `voice` models one oscillator with its attack/hold/release envelope
//! - `device` is the seam to the audio backend (`output` plays through
//!   rodio, `silent` only keeps time)
//! - `engine` owns the device, tracks active voices and handles stop-all
//! - `playback` composes notes, intervals, chords and melodies

pub mod device;
pub mod engine;
pub mod output;
pub mod playback;
pub mod silent;
pub mod voice;

#[cfg(test)]
pub(crate) mod testing;

pub use device::{AudioDevice, AudioHost, DeviceState};
pub use engine::{Completion, ToneSynthesizer, DEFAULT_VOLUME};
pub use output::RodioHost;
pub use playback::{Playback, PlaybackOrchestrator};
pub use silent::SilentHost;
pub use voice::{Voice, VoiceId, VoiceOutcome};
