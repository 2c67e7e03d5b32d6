//! Real audio output through rodio.
//!
//! All voices are mixed by a single continuous rodio `Source` that renders
//! from shared state. The device clock is the number of frames rendered so
//! far, so voice start and stop times are sample accurate.

use super::device::{AudioDevice, AudioHost, DeviceState, EndedCallback};
use super::voice::{Voice, VoiceId, VoiceOutcome};
use crate::error::{Error, Result};
use rodio::{OutputStream, OutputStreamHandle, Source, StreamError};
use std::f64::consts::TAU;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Sample rate for audio synthesis (44.1 kHz standard).
pub const SAMPLE_RATE: u32 = 44100;

/// Frames rendered per lock of the mixer.
/// Smaller = lower scheduling latency but more lock traffic.
const BUFFER_SIZE: usize = 256;

/// A voice being rendered.
struct MixVoice {
    voice: Voice,
    start_frame: u64,
    stop_frame: u64,
    phase: f64,
    phase_step: f64,
    outcome: VoiceOutcome,
    on_ended: EndedCallback,
}

/// Mixes running voices into a mono output and keeps the device clock.
pub(crate) struct Mixer {
    sample_rate: u32,
    /// Frames rendered since the mixer was created.
    frame: u64,
    master_gain: f32,
    voices: Vec<MixVoice>,
}

impl Mixer {
    pub(crate) fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            frame: 0,
            master_gain: 1.0,
            voices: Vec::new(),
        }
    }

    /// Device clock in seconds.
    pub(crate) fn now(&self) -> f64 {
        self.frame as f64 / self.sample_rate as f64
    }

    fn to_frame(&self, secs: f64) -> u64 {
        (secs.max(0.0) * self.sample_rate as f64).round() as u64
    }

    pub(crate) fn set_master_gain(&mut self, gain: f32) {
        self.master_gain = gain.clamp(0.0, 1.0);
    }

    pub(crate) fn add(&mut self, voice: Voice, on_ended: EndedCallback) {
        let start_frame = self.to_frame(voice.start).max(self.frame);
        let stop_frame = self.to_frame(voice.stop_time()).max(start_frame);
        self.voices.push(MixVoice {
            voice,
            start_frame,
            stop_frame,
            phase: 0.0,
            phase_step: TAU * voice.frequency / self.sample_rate as f64,
            outcome: VoiceOutcome::Completed,
            on_ended,
        });
    }

    /// Pulls a voice's stop frame forward to `at` (never into the past).
    pub(crate) fn stop(&mut self, id: VoiceId, at: f64) -> bool {
        let frame = self.to_frame(at).max(self.frame);
        match self.voices.iter_mut().find(|v| v.voice.id == id) {
            Some(v) if v.outcome == VoiceOutcome::Completed => {
                if frame < v.stop_frame {
                    v.stop_frame = frame;
                    v.outcome = VoiceOutcome::Stopped;
                }
                true
            }
            _ => false,
        }
    }

    /// Removes every voice, reporting them all as stopped.
    pub(crate) fn clear(&mut self) -> Vec<(EndedCallback, VoiceOutcome)> {
        self.voices
            .drain(..)
            .map(|v| (v.on_ended, VoiceOutcome::Stopped))
            .collect()
    }

    /// Renders the next `out.len()` frames and advances the clock.
    ///
    /// Returns the callbacks of voices that ended within this block, in stop
    /// order. Callers must invoke them after releasing the mixer lock.
    pub(crate) fn render(&mut self, out: &mut [f32]) -> Vec<(EndedCallback, VoiceOutcome)> {
        out.fill(0.0);
        let block_start = self.frame;
        let sample_rate = self.sample_rate as f64;

        for mv in &mut self.voices {
            for (i, sample) in out.iter_mut().enumerate() {
                let frame = block_start + i as u64;
                if frame < mv.start_frame || frame >= mv.stop_frame {
                    continue;
                }
                let t = (frame - mv.start_frame) as f64 / sample_rate;
                *sample += mv.phase.sin() as f32 * mv.voice.envelope.gain_at(t);
                mv.phase = (mv.phase + mv.phase_step) % TAU;
            }
        }

        for sample in out.iter_mut() {
            *sample = (*sample * self.master_gain).clamp(-1.0, 1.0);
        }
        self.frame += out.len() as u64;

        let now = self.frame;
        let (mut ended, live): (Vec<_>, Vec<_>) =
            self.voices.drain(..).partition(|v| v.stop_frame <= now);
        self.voices = live;
        ended.sort_by_key(|v| v.stop_frame);
        ended
            .into_iter()
            .map(|v| (v.on_ended, v.outcome))
            .collect()
    }

    pub(crate) fn voice_count(&self) -> usize {
        self.voices.len()
    }
}

/// Audio source that pulls samples from the mixer.
/// Implements rodio's Source trait for playback.
struct MixerSource {
    mixer: Arc<Mutex<Mixer>>,
    sample_rate: u32,
    buf: Vec<f32>,
    /// Current position in the buffer.
    buf_pos: usize,
}

impl MixerSource {
    fn new(mixer: Arc<Mutex<Mixer>>, sample_rate: u32) -> Self {
        Self {
            mixer,
            sample_rate,
            buf: vec![0.0; BUFFER_SIZE],
            buf_pos: BUFFER_SIZE, // Start at end to trigger first render
        }
    }
}

impl Iterator for MixerSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.buf_pos >= BUFFER_SIZE {
            let ended = match self.mixer.lock() {
                Ok(mut mixer) => mixer.render(&mut self.buf),
                Err(_) => {
                    self.buf.fill(0.0);
                    Vec::new()
                }
            };
            for (on_ended, outcome) in ended {
                on_ended(outcome);
            }
            self.buf_pos = 0;
        }

        let sample = self.buf[self.buf_pos];
        self.buf_pos += 1;
        Some(sample)
    }
}

impl Source for MixerSource {
    fn current_frame_len(&self) -> Option<usize> {
        None // Continuous stream
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None // Infinite stream
    }
}

/// Opens the system's default output device.
#[derive(Debug, Clone)]
pub struct RodioHost {
    sample_rate: u32,
}

impl RodioHost {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }
}

impl Default for RodioHost {
    fn default() -> Self {
        Self::new(SAMPLE_RATE)
    }
}

impl AudioHost for RodioHost {
    fn open(&self) -> Result<Box<dyn AudioDevice>> {
        let (stream, stream_handle) = OutputStream::try_default().map_err(|e| match e {
            StreamError::NoDevice => Error::AudioUnsupported,
            other => Error::DeviceInitFailed(other.to_string()),
        })?;

        let mixer = Arc::new(Mutex::new(Mixer::new(self.sample_rate)));
        let source = MixerSource::new(Arc::clone(&mixer), self.sample_rate);
        stream_handle
            .play_raw(source)
            .map_err(|e| Error::DeviceInitFailed(format!("failed to start output: {}", e)))?;

        Ok(Box::new(RodioDevice {
            mixer,
            _stream: stream,
            _stream_handle: stream_handle,
            closed: false,
        }))
    }
}

/// A running rodio output stream with its mixer.
pub struct RodioDevice {
    mixer: Arc<Mutex<Mixer>>,
    /// Audio output stream (must be kept alive).
    _stream: OutputStream,
    _stream_handle: OutputStreamHandle,
    closed: bool,
}

impl AudioDevice for RodioDevice {
    fn current_time(&self) -> f64 {
        self.mixer.lock().map(|m| m.now()).unwrap_or(0.0)
    }

    fn state(&self) -> DeviceState {
        if self.closed {
            DeviceState::Closed
        } else {
            DeviceState::Running
        }
    }

    fn resume(&mut self) -> Result<()> {
        if self.closed {
            return Err(Error::NotReady("output stream is closed".to_string()));
        }
        Ok(())
    }

    fn set_master_gain(&mut self, gain: f32) {
        if let Ok(mut mixer) = self.mixer.lock() {
            mixer.set_master_gain(gain);
        }
    }

    fn start_voice(&mut self, voice: Voice, on_ended: EndedCallback) {
        if let Ok(mut mixer) = self.mixer.lock() {
            mixer.add(voice, on_ended);
        }
    }

    fn stop_voice(&mut self, id: VoiceId, at: f64) -> bool {
        self.mixer
            .lock()
            .map(|mut m| m.stop(id, at))
            .unwrap_or(false)
    }

    fn close(&mut self) {
        let ended = match self.mixer.lock() {
            Ok(mut mixer) => {
                mixer.set_master_gain(0.0);
                mixer.clear()
            }
            Err(_) => Vec::new(),
        };
        for (on_ended, outcome) in ended {
            on_ended(outcome);
        }
        self.closed = true;
    }
}
