//! Voices: scheduled sine oscillators shaped by an attack/hold/release envelope.

use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for generating unique voice IDs.
static VOICE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Linear fade-in time applied to every voice.
pub const ATTACK_SECS: f64 = 0.02;

/// Linear fade-out time applied to every voice.
pub const RELEASE_SECS: f64 = 0.05;

/// Peak gain of a voice sounding on its own.
pub const SOLO_PEAK: f32 = 1.0;

/// Peak gain of each voice in a simultaneous group, leaving headroom for the sum.
pub const ENSEMBLE_PEAK: f32 = 0.8;

/// Unique identifier for a scheduled voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceId(u64);

impl VoiceId {
    /// Generates a new unique voice ID.
    pub fn new() -> Self {
        Self(VOICE_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for VoiceId {
    fn default() -> Self {
        Self::new()
    }
}

/// Gain curve of a voice. All times are seconds relative to the voice start.
///
/// The curve ramps linearly from 0 to `peak` until `attack_end`, holds until
/// `release_start`, then ramps back to 0 at `stop`. The release never starts
/// before the attack has finished, so very short notes still get both ramps
/// and simply lose their hold segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub attack_end: f64,
    pub release_start: f64,
    pub stop: f64,
    pub peak: f32,
}

impl Envelope {
    /// Builds the envelope for a note of the requested duration.
    ///
    /// Non-finite or negative durations are treated as zero; the resulting
    /// voice then lasts exactly `ATTACK_SECS + RELEASE_SECS`.
    pub fn new(duration: f64, peak: f32) -> Self {
        let duration = if duration.is_finite() {
            duration.max(0.0)
        } else {
            0.0
        };
        let attack_end = ATTACK_SECS;
        let release_start = (duration - RELEASE_SECS).max(attack_end);
        Self {
            attack_end,
            release_start,
            stop: release_start + RELEASE_SECS,
            peak: peak.clamp(0.0, 1.0),
        }
    }

    /// Length of the sustained segment.
    pub fn hold(&self) -> f64 {
        self.release_start - self.attack_end
    }

    /// Envelope gain `t` seconds after the voice started.
    pub fn gain_at(&self, t: f64) -> f32 {
        let level = if t <= 0.0 || t >= self.stop {
            0.0
        } else if t < self.attack_end {
            t / self.attack_end
        } else if t < self.release_start {
            1.0
        } else {
            (self.stop - t) / (self.stop - self.release_start)
        };
        self.peak * level as f32
    }
}

/// A single scheduled oscillator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Voice {
    pub id: VoiceId,
    /// Oscillator frequency in Hz.
    pub frequency: f64,
    /// Start time on the device clock, in seconds.
    pub start: f64,
    pub envelope: Envelope,
}

impl Voice {
    /// Creates a voice starting at `start` (device clock seconds).
    pub fn new(frequency: f64, start: f64, duration: f64, peak: f32) -> Self {
        let frequency = if frequency.is_finite() {
            frequency.max(0.0)
        } else {
            0.0
        };
        Self {
            id: VoiceId::new(),
            frequency,
            start: start.max(0.0),
            envelope: Envelope::new(duration, peak),
        }
    }

    /// Scheduled (natural) end time on the device clock.
    pub fn stop_time(&self) -> f64 {
        self.start + self.envelope.stop
    }
}

/// How a voice, or a group of voices, came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceOutcome {
    /// Played through its full envelope.
    Completed,
    /// Cut short by `stop_all` (or by the device going away).
    Stopped,
}

impl VoiceOutcome {
    /// Combines the outcomes of two voices in one group.
    pub fn merge(self, other: VoiceOutcome) -> VoiceOutcome {
        match (self, other) {
            (VoiceOutcome::Completed, VoiceOutcome::Completed) => VoiceOutcome::Completed,
            _ => VoiceOutcome::Stopped,
        }
    }

    pub fn is_completed(self) -> bool {
        self == VoiceOutcome::Completed
    }
}
