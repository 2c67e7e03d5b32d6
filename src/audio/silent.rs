//! A device that produces no sound.
//!
//! Voices still occupy their scheduled time: each one is backed by a tokio
//! timer on the device clock, so awaiting playback behaves exactly as with a
//! sound card. Under paused tokio time (tests) this makes timing exact.

use super::device::{AudioDevice, AudioHost, DeviceState, EndedCallback};
use super::voice::{Voice, VoiceId, VoiceOutcome};
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::warn;

/// Opens silent devices.
#[derive(Debug, Clone, Default)]
pub struct SilentHost {
    start_suspended: bool,
}

impl SilentHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Devices from this host start `Suspended` and need a `resume()`,
    /// like an output blocked by an autoplay policy.
    pub fn suspended() -> Self {
        Self {
            start_suspended: true,
        }
    }
}

impl AudioHost for SilentHost {
    fn open(&self) -> Result<Box<dyn AudioDevice>> {
        let state = if self.start_suspended {
            DeviceState::Suspended
        } else {
            DeviceState::Running
        };
        Ok(Box::new(SilentDevice::new(state)))
    }
}

struct PendingVoice {
    on_ended: EndedCallback,
    timer: Option<JoinHandle<()>>,
}

type PendingMap = Arc<Mutex<HashMap<VoiceId, PendingVoice>>>;

/// Clock-only device backed by tokio timers.
pub struct SilentDevice {
    origin: Instant,
    state: DeviceState,
    master_gain: f32,
    pending: PendingMap,
}

impl SilentDevice {
    fn new(state: DeviceState) -> Self {
        Self {
            origin: Instant::now(),
            state,
            master_gain: 1.0,
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn master_gain(&self) -> f32 {
        self.master_gain
    }

    fn deadline(&self, at: f64) -> Instant {
        self.origin + Duration::from_secs_f64(at.max(0.0))
    }

    /// Arms (or re-arms) the timer that ends voice `id` at device time `at`.
    fn arm(&self, id: VoiceId, at: f64, outcome: VoiceOutcome) {
        if Handle::try_current().is_err() {
            // Nothing can drive the timer; end the voice right away.
            warn!(voice = id.as_u64(), "no async runtime, ending silent voice immediately");
            self.finish(id, outcome);
            return;
        }

        let deadline = self.deadline(at);
        let pending = Arc::clone(&self.pending);
        let timer = tokio::spawn(async move {
            time::sleep_until(deadline).await;
            let entry = pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&id);
            if let Some(entry) = entry {
                (entry.on_ended)(outcome);
            }
        });

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        match pending.get_mut(&id) {
            Some(entry) => {
                if let Some(old) = entry.timer.replace(timer) {
                    old.abort();
                }
            }
            None => timer.abort(),
        }
    }

    /// Ends a voice now, if it is still pending.
    fn finish(&self, id: VoiceId, outcome: VoiceOutcome) -> bool {
        let entry = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
        match entry {
            Some(entry) => {
                if let Some(timer) = entry.timer {
                    timer.abort();
                }
                (entry.on_ended)(outcome);
                true
            }
            None => false,
        }
    }
}

impl AudioDevice for SilentDevice {
    fn current_time(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }

    fn state(&self) -> DeviceState {
        self.state
    }

    fn resume(&mut self) -> Result<()> {
        match self.state {
            DeviceState::Closed => Err(Error::NotReady("device is closed".to_string())),
            _ => {
                self.state = DeviceState::Running;
                Ok(())
            }
        }
    }

    fn set_master_gain(&mut self, gain: f32) {
        self.master_gain = gain.clamp(0.0, 1.0);
    }

    fn start_voice(&mut self, voice: Voice, on_ended: EndedCallback) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                voice.id,
                PendingVoice {
                    on_ended,
                    timer: None,
                },
            );
        self.arm(voice.id, voice.stop_time(), VoiceOutcome::Completed);
    }

    fn stop_voice(&mut self, id: VoiceId, at: f64) -> bool {
        let known = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id);
        if !known {
            return false;
        }
        if at <= self.current_time() {
            self.finish(id, VoiceOutcome::Stopped)
        } else {
            self.arm(id, at, VoiceOutcome::Stopped);
            true
        }
    }

    fn close(&mut self) {
        let drained: Vec<PendingVoice> = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .map(|(_, entry)| entry)
            .collect();
        for entry in drained {
            if let Some(timer) = entry.timer {
                timer.abort();
            }
            (entry.on_ended)(VoiceOutcome::Stopped);
        }
        self.state = DeviceState::Closed;
    }
}
