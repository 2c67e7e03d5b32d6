//! Tone synthesizer: owns the audio device context and every running voice.
//!
//! The synthesizer is an explicitly constructed object with a
//! construct → initialize → use → close lifecycle. Each scheduled voice (or
//! voice group) hands back a [`Completion`] future that resolves when the
//! device reports the end of the sound, with an explicit
//! [`VoiceOutcome::Stopped`] when `stop_all` cut it short.

use super::device::{AudioDevice, AudioHost, DeviceState, EndedCallback};
use super::voice::{Voice, VoiceId, VoiceOutcome, ENSEMBLE_PEAK, SOLO_PEAK};
use crate::error::{Error, Result};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::{oneshot, Notify};
use tracing::{debug, info};

/// Volume used when the caller has no preference.
pub const DEFAULT_VOLUME: f32 = 0.7;

/// Voices currently scheduled on the device, shared with end callbacks
/// (which may run on the audio render thread).
type ActiveVoices = Arc<Mutex<HashMap<VoiceId, Voice>>>;

/// Resolves once a voice or voice group has ended.
///
/// A dropped device (closed without reporting) resolves as `Stopped`.
#[derive(Debug)]
#[must_use = "a completion does nothing unless awaited"]
pub struct Completion {
    rx: Option<oneshot::Receiver<VoiceOutcome>>,
}

impl Completion {
    fn pending(rx: oneshot::Receiver<VoiceOutcome>) -> Self {
        Self { rx: Some(rx) }
    }

    /// A completion that is already resolved as `Completed`.
    pub fn ready() -> Self {
        Self { rx: None }
    }
}

impl Future for Completion {
    type Output = VoiceOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<VoiceOutcome> {
        match self.rx.as_mut() {
            None => Poll::Ready(VoiceOutcome::Completed),
            Some(rx) => Pin::new(rx)
                .poll(cx)
                .map(|res| res.unwrap_or(VoiceOutcome::Stopped)),
        }
    }
}

/// Tracks the voices of one simultaneous group; resolves when the last ends.
struct GroupState {
    remaining: usize,
    outcome: VoiceOutcome,
    tx: Option<oneshot::Sender<VoiceOutcome>>,
}

/// Schedules sine voices with click-free envelopes on an audio device.
pub struct ToneSynthesizer {
    host: Box<dyn AudioHost>,
    device: RefCell<Option<Box<dyn AudioDevice>>>,
    active: ActiveVoices,
    volume: Cell<f32>,
    /// Wakes rests so they end together with the voices on `stop_all`.
    stop_signal: Notify,
    /// Bumped by every `stop_all` and `close`.
    stop_generation: Cell<u64>,
}

impl ToneSynthesizer {
    /// Creates a synthesizer. No device is opened until [`initialize`](Self::initialize).
    ///
    /// # Arguments
    ///
    /// * `host` - Opens the device context on initialization
    /// * `volume` - Initial master volume (clamped to 0.0-1.0)
    pub fn new(host: Box<dyn AudioHost>, volume: f32) -> Self {
        Self {
            host,
            device: RefCell::new(None),
            active: Arc::new(Mutex::new(HashMap::new())),
            volume: Cell::new(clamp_volume(volume)),
            stop_signal: Notify::new(),
            stop_generation: Cell::new(0),
        }
    }

    /// Opens the device context and master gain stage. Idempotent.
    ///
    /// Should run in response to an explicit user action, since platforms
    /// may refuse to start audio otherwise.
    ///
    /// # Errors
    ///
    /// `AudioUnsupported` or `DeviceInitFailed` from the host.
    pub fn initialize(&self) -> Result<()> {
        if self.is_initialized() {
            return Ok(());
        }
        let mut device = self.host.open()?;
        device.set_master_gain(self.volume.get());
        info!(state = %device.state(), volume = self.volume.get(), "Audio device opened");
        *self.device.borrow_mut() = Some(device);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.device.borrow().is_some()
    }

    /// Initializes if needed and resumes a suspended device.
    ///
    /// # Errors
    ///
    /// Initialization errors, or `NotReady` if the device cannot be brought
    /// to the running state.
    pub fn ensure_ready(&self) -> Result<()> {
        self.initialize()?;
        self.with_device(bring_up)?
    }

    /// Schedules one voice at full peak gain, starting now.
    ///
    /// # Arguments
    ///
    /// * `frequency` - Pitch in Hz
    /// * `duration` - Length in seconds, including the release ramp
    ///
    /// # Returns
    ///
    /// A completion that resolves when the voice ends.
    pub fn play_tone(&self, frequency: f64, duration: f64) -> Result<Completion> {
        let (tx, rx) = oneshot::channel();
        self.with_device(|device| {
            let voice = Voice::new(frequency, device.current_time(), duration, SOLO_PEAK);
            let active = Arc::clone(&self.active);
            let on_ended: EndedCallback = Box::new(move |outcome| {
                lock(&active).remove(&voice.id);
                let _ = tx.send(outcome);
            });
            self.schedule(device, voice, on_ended);
        })?;
        Ok(Completion::pending(rx))
    }

    /// Schedules one voice per frequency, all sharing one start time and
    /// the reduced ensemble peak gain.
    ///
    /// The completion resolves after every voice in the group has ended and
    /// reports `Stopped` if any of them was stopped.
    pub fn play_chord_tones(&self, frequencies: &[f64], duration: f64) -> Result<Completion> {
        self.with_device(|device| {
            if frequencies.is_empty() {
                return Completion::ready();
            }
            let (tx, rx) = oneshot::channel();
            let group = Arc::new(Mutex::new(GroupState {
                remaining: frequencies.len(),
                outcome: VoiceOutcome::Completed,
                tx: Some(tx),
            }));
            let start = device.current_time();

            for &frequency in frequencies {
                let voice = Voice::new(frequency, start, duration, ENSEMBLE_PEAK);
                let active = Arc::clone(&self.active);
                let group = Arc::clone(&group);
                let on_ended: EndedCallback = Box::new(move |outcome| {
                    lock(&active).remove(&voice.id);
                    let mut group = lock(&group);
                    group.remaining = group.remaining.saturating_sub(1);
                    group.outcome = group.outcome.merge(outcome);
                    if group.remaining == 0 {
                        if let Some(tx) = group.tx.take() {
                            let _ = tx.send(group.outcome);
                        }
                    }
                });
                self.schedule(device, voice, on_ended);
            }
            Completion::pending(rx)
        })
    }

    /// Waits out a silent stretch. Ends early as `Stopped` on `stop_all`.
    pub async fn rest(&self, secs: f64) -> Result<VoiceOutcome> {
        if !self.is_initialized() {
            return Err(Error::NotInitialized);
        }
        let secs = if secs.is_finite() { secs.max(0.0) } else { 0.0 };
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs_f64(secs)) => Ok(VoiceOutcome::Completed),
            _ = self.stop_signal.notified() => Ok(VoiceOutcome::Stopped),
        }
    }

    /// Truncates every active voice to end now and clears the active set.
    ///
    /// Safe with no active voices; voices that already ended on their own
    /// are skipped silently.
    ///
    /// # Returns
    ///
    /// How many voices were actually cut short.
    pub fn stop_all(&self) -> Result<usize> {
        // Drain first: devices may report the end synchronously, and the
        // callbacks take the same lock.
        let ids: Vec<VoiceId> = lock(&self.active).drain().map(|(id, _)| id).collect();
        let stopped = self.with_device(|device| {
            let now = device.current_time();
            ids.iter()
                .filter(|id| device.stop_voice(**id, now))
                .count()
        })?;
        self.interrupt();
        debug!(stopped, "Stopped all voices");
        Ok(stopped)
    }

    /// Sets the master volume, effective immediately.
    ///
    /// # Returns
    ///
    /// The clamped volume actually applied.
    pub fn set_volume(&self, volume: f32) -> Result<f32> {
        let volume = clamp_volume(volume);
        self.with_device(|device| device.set_master_gain(volume))?;
        self.volume.set(volume);
        debug!(volume, "Master volume set");
        Ok(volume)
    }

    pub fn volume(&self) -> f32 {
        self.volume.get()
    }

    /// IDs of the voices currently scheduled, in creation order.
    pub fn active_voices(&self) -> Vec<VoiceId> {
        let mut ids: Vec<VoiceId> = lock(&self.active).keys().copied().collect();
        ids.sort();
        ids
    }

    /// Counts the `stop_all` and `close` calls so far.
    ///
    /// A sequence compares this against the value it started with, so a
    /// stop landing between two steps still ends it.
    pub fn stop_generation(&self) -> u64 {
        self.stop_generation.get()
    }

    /// Device power state, or `None` before initialization.
    pub fn device_state(&self) -> Option<DeviceState> {
        self.device.borrow().as_ref().map(|d| d.state())
    }

    /// Stops all sound and releases the device. A later
    /// [`ensure_ready`](Self::ensure_ready) opens a fresh one.
    pub fn close(&self) {
        lock(&self.active).clear();
        self.interrupt();
        if let Some(mut device) = self.device.borrow_mut().take() {
            device.close();
            info!("Audio device closed");
        }
    }

    fn interrupt(&self) {
        self.stop_generation.set(self.stop_generation.get().wrapping_add(1));
        self.stop_signal.notify_waiters();
    }

    fn schedule(&self, device: &mut dyn AudioDevice, voice: Voice, on_ended: EndedCallback) {
        lock(&self.active).insert(voice.id, voice);
        debug!(
            voice = voice.id.as_u64(),
            frequency = voice.frequency,
            start = voice.start,
            stop = voice.stop_time(),
            "Scheduling voice"
        );
        device.start_voice(voice, on_ended);
    }

    fn with_device<T>(&self, f: impl FnOnce(&mut dyn AudioDevice) -> T) -> Result<T> {
        let mut device = self.device.borrow_mut();
        match device.as_mut() {
            Some(device) => Ok(f(&mut **device)),
            None => Err(Error::NotInitialized),
        }
    }
}

impl Drop for ToneSynthesizer {
    fn drop(&mut self) {
        self.close();
    }
}

/// Brings an open device to the running state.
fn bring_up(device: &mut dyn AudioDevice) -> Result<()> {
    match device.state() {
        DeviceState::Running => Ok(()),
        DeviceState::Suspended => {
            device.resume().map_err(|e| match e {
                Error::NotReady(reason) => Error::NotReady(reason),
                other => Error::NotReady(other.to_string()),
            })?;
            match device.state() {
                DeviceState::Running => {
                    debug!("Audio device resumed");
                    Ok(())
                }
                state => Err(Error::NotReady(format!("device still {} after resume", state))),
            }
        }
        DeviceState::Closed => Err(Error::NotReady("device is closed".to_string())),
    }
}

fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
