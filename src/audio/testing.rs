//! Test hosts shared by the audio and training tests.

use super::device::{AudioDevice, AudioHost, DeviceState, EndedCallback};
use super::silent::SilentHost;
use super::voice::{Voice, VoiceId};
use crate::error::{Error, Result};
use std::sync::{Arc, Mutex};

/// Silent host that records every voice started on its devices.
#[derive(Clone, Default)]
pub(crate) struct RecordingHost {
    started: Arc<Mutex<Vec<Voice>>>,
}

impl RecordingHost {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Frequencies of all voices started so far, in start order.
    pub(crate) fn frequencies(&self) -> Vec<f64> {
        self.voices().iter().map(|v| v.frequency).collect()
    }

    pub(crate) fn voices(&self) -> Vec<Voice> {
        self.started.lock().unwrap().clone()
    }
}

impl AudioHost for RecordingHost {
    fn open(&self) -> Result<Box<dyn AudioDevice>> {
        Ok(Box::new(RecordingDevice {
            inner: SilentHost::new().open()?,
            started: Arc::clone(&self.started),
        }))
    }
}

struct RecordingDevice {
    inner: Box<dyn AudioDevice>,
    started: Arc<Mutex<Vec<Voice>>>,
}

impl AudioDevice for RecordingDevice {
    fn current_time(&self) -> f64 {
        self.inner.current_time()
    }

    fn state(&self) -> DeviceState {
        self.inner.state()
    }

    fn resume(&mut self) -> Result<()> {
        self.inner.resume()
    }

    fn set_master_gain(&mut self, gain: f32) {
        self.inner.set_master_gain(gain)
    }

    fn start_voice(&mut self, voice: Voice, on_ended: EndedCallback) {
        self.started.lock().unwrap().push(voice);
        self.inner.start_voice(voice, on_ended)
    }

    fn stop_voice(&mut self, id: VoiceId, at: f64) -> bool {
        self.inner.stop_voice(id, at)
    }

    fn close(&mut self) {
        self.inner.close()
    }
}

/// Host with no output device at all.
pub(crate) struct NoDeviceHost;

impl AudioHost for NoDeviceHost {
    fn open(&self) -> Result<Box<dyn AudioDevice>> {
        Err(Error::AudioUnsupported)
    }
}
