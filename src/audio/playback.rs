//! Single-voice narration playback with guaranteed resource teardown.
//!
//! [`PlaybackController`] owns one output device context and at most one
//! live playback voice, behind a small state machine:
//!
//! ```text
//! Uninitialized ──attach──▶ Ready ──play──▶ Playing
//!                             ▲                │
//!                             └── completion ──┘   (natural end or pause)
//! any state ──release──▶ Uninitialized
//! ```
//!
//! There is no resumable pause: `pause` stops the active voice, and the next
//! `play` restarts the narration from the beginning.
//!
//! The device boundary is the [`AudioOutput`] trait so the state machine can
//! be unit-tested without hardware; [`CpalOutput`] is the production backend.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

use super::decode::DecodedAudioBuffer;

// ---------------------------------------------------------------------------
// PlaybackError
// ---------------------------------------------------------------------------

/// Errors that can occur while acquiring or driving the output device.
///
/// Callers log these and continue — a playback failure must never block the
/// user from retrying playback or submitting a new photo.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("no output device found on the default audio host")]
    NoDevice,

    #[error("failed to build output stream: {0}")]
    BuildStream(String),

    #[error("failed to start output stream: {0}")]
    PlayStream(String),
}

// ---------------------------------------------------------------------------
// AudioOutput
// ---------------------------------------------------------------------------

/// Object-safe boundary to the audio output device.
///
/// The controller drives this trait through the lifecycle
/// `open → (resume → start_voice → stop_voice)* → close`.  A voice plays the
/// given buffer once and raises `done` when it runs past the final sample;
/// `stop_voice` discards the voice without touching `done`.
pub trait AudioOutput {
    /// Acquire the output device context at the given sample rate.
    fn open(&mut self, sample_rate: u32) -> Result<(), PlaybackError>;

    /// Resume the device context if the host created or left it suspended.
    fn resume(&mut self) -> Result<(), PlaybackError>;

    /// Create and start a new voice bound to `buffer`.
    ///
    /// The voice must set `done` to `true` once playback has passed the last
    /// sample.
    fn start_voice(
        &mut self,
        buffer: Arc<DecodedAudioBuffer>,
        done: Arc<AtomicBool>,
    ) -> Result<(), PlaybackError>;

    /// Stop and discard the active voice, if any.
    fn stop_voice(&mut self);

    /// Close the device context and drop all resources.  Idempotent.
    fn close(&mut self);
}

// ---------------------------------------------------------------------------
// CpalOutput
// ---------------------------------------------------------------------------

/// Position cursor shared with the cpal output callback.
struct VoiceCursor {
    buffer: Arc<DecodedAudioBuffer>,
    position: usize,
}

/// Production [`AudioOutput`] backed by the system default output device.
///
/// The output callback copies samples from the attached buffer by position
/// and pads with silence once exhausted, flipping the shared `done` flag so
/// the controller can observe natural completion.
pub struct CpalOutput {
    device: Option<cpal::Device>,
    config: Option<cpal::StreamConfig>,
    stream: Option<cpal::Stream>,
}

impl CpalOutput {
    pub fn new() -> Self {
        Self {
            device: None,
            config: None,
            stream: None,
        }
    }
}

impl Default for CpalOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioOutput for CpalOutput {
    fn open(&mut self, sample_rate: u32) -> Result<(), PlaybackError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(PlaybackError::NoDevice)?;

        if let Ok(name) = device.name() {
            log::info!("playback: using output device '{name}'");
        }

        self.config = Some(cpal::StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        });
        self.device = Some(device);
        Ok(())
    }

    fn resume(&mut self) -> Result<(), PlaybackError> {
        // cpal has no suspended-context notion; streams that a host creates
        // paused are resumed by the explicit `Stream::play` in `start_voice`.
        Ok(())
    }

    fn start_voice(
        &mut self,
        buffer: Arc<DecodedAudioBuffer>,
        done: Arc<AtomicBool>,
    ) -> Result<(), PlaybackError> {
        let (device, config) = match (&self.device, &self.config) {
            (Some(d), Some(c)) => (d, c.clone()),
            _ => return Err(PlaybackError::NoDevice),
        };

        let cursor = Arc::new(Mutex::new(VoiceCursor {
            buffer,
            position: 0,
        }));
        let cursor_cb = Arc::clone(&cursor);
        let done_cb = Arc::clone(&done);

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut cur = match cursor_cb.lock() {
                        Ok(c) => c,
                        Err(_) => return,
                    };
                    for sample in data.iter_mut() {
                        if cur.position < cur.buffer.samples.len() {
                            *sample = cur.buffer.samples[cur.position];
                            cur.position += 1;
                        } else {
                            *sample = 0.0;
                            done_cb.store(true, Ordering::Release);
                        }
                    }
                },
                |err: cpal::StreamError| {
                    log::error!("playback: output stream error: {err}");
                },
                None,
            )
            .map_err(|e| PlaybackError::BuildStream(e.to_string()))?;

        stream
            .play()
            .map_err(|e| PlaybackError::PlayStream(e.to_string()))?;

        self.stream = Some(stream);
        Ok(())
    }

    fn stop_voice(&mut self) {
        if let Some(stream) = self.stream.take() {
            // Dropping the stream stops it; pause first so the device goes
            // quiet immediately rather than at the host's leisure.
            if let Err(e) = stream.pause() {
                log::warn!("playback: failed to pause stream on stop: {e}");
            }
        }
    }

    fn close(&mut self) {
        self.stream = None;
        self.config = None;
        self.device = None;
    }
}

// ---------------------------------------------------------------------------
// PlayerState
// ---------------------------------------------------------------------------

/// Lifecycle state of the [`PlaybackController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// No device context acquired; nothing attached.
    Uninitialized,
    /// A buffer is attached and the device context is open; no voice live.
    Ready,
    /// A voice is playing the attached buffer.
    Playing,
}

// ---------------------------------------------------------------------------
// PlaybackController
// ---------------------------------------------------------------------------

/// Owns the output device context and at most one concurrent voice.
///
/// All device failures are logged and swallowed; every method is a safe
/// no-op when called in a state it does not apply to.  Dropping the
/// controller releases the device, so teardown is guaranteed on every exit
/// path.
///
/// Completion is cooperative: the voice flips a shared flag from the audio
/// thread, and the controller reaps it — performing the `Playing → Ready`
/// transition and clearing the voice — on the next call to any method.
/// `pause` raises the same flag, so the manual-stop and natural-completion
/// paths cannot race.
pub struct PlaybackController {
    output: Box<dyn AudioOutput>,
    state: PlayerState,
    buffer: Option<Arc<DecodedAudioBuffer>>,
    done: Option<Arc<AtomicBool>>,
}

impl PlaybackController {
    /// Create a controller over an explicit output backend (used by tests).
    pub fn new(output: Box<dyn AudioOutput>) -> Self {
        Self {
            output,
            state: PlayerState::Uninitialized,
            buffer: None,
            done: None,
        }
    }

    /// Create a controller over the system default output device.
    pub fn with_default_output() -> Self {
        Self::new(Box::new(CpalOutput::new()))
    }

    /// Current lifecycle state, after reaping any finished voice.
    pub fn state(&mut self) -> PlayerState {
        self.reap_finished();
        self.state
    }

    /// Returns `true` while a voice is live, after reaping.
    pub fn is_playing(&mut self) -> bool {
        self.state() == PlayerState::Playing
    }

    /// Attach a decoded narration buffer, acquiring the device context.
    ///
    /// Any previously attached buffer's context is released first.  The
    /// context is opened at the buffer's own sample rate, and the buffer is
    /// held so a later [`play`](Self::play) starts with no added latency.
    /// Device acquisition failures are logged; the controller then stays
    /// `Uninitialized` and `play` remains a no-op.
    pub fn attach(&mut self, buffer: Arc<DecodedAudioBuffer>) {
        if self.state != PlayerState::Uninitialized {
            self.release();
        }

        if let Err(e) = self.output.open(buffer.sample_rate) {
            log::warn!("playback: could not acquire output device: {e}");
            return;
        }

        log::debug!(
            "playback: attached narration buffer ({} samples, {:.1}s)",
            buffer.len(),
            buffer.duration_secs()
        );
        self.buffer = Some(buffer);
        self.state = PlayerState::Ready;
    }

    /// Start playing the attached buffer from the beginning.
    ///
    /// No-op when already playing or when nothing is attached.
    pub fn play(&mut self) {
        self.reap_finished();

        if self.state == PlayerState::Playing {
            return;
        }
        let buffer = match (&self.state, &self.buffer) {
            (PlayerState::Ready, Some(buf)) => Arc::clone(buf),
            _ => return,
        };

        if let Err(e) = self.output.resume() {
            log::warn!("playback: failed to resume output context: {e}");
            return;
        }

        let done = Arc::new(AtomicBool::new(false));
        match self.output.start_voice(buffer, Arc::clone(&done)) {
            Ok(()) => {
                self.done = Some(done);
                self.state = PlayerState::Playing;
            }
            Err(e) => {
                log::warn!("playback: could not start voice: {e}");
            }
        }
    }

    /// Stop the active voice.  No-op when not playing.
    ///
    /// Raises the completion flag instead of mutating state directly; the
    /// shared reap path then performs the `Playing → Ready` transition, the
    /// same as for natural end-of-buffer completion.
    pub fn pause(&mut self) {
        self.reap_finished();

        if self.state != PlayerState::Playing {
            return;
        }

        self.output.stop_voice();
        if let Some(done) = &self.done {
            done.store(true, Ordering::Release);
        }
        self.reap_finished();
    }

    /// Stop any voice, close the device context and clear all references.
    ///
    /// Idempotent: safe to call when nothing was ever initialised.  Device
    /// close failures are the backend's to log; nothing propagates.
    pub fn release(&mut self) {
        self.output.stop_voice();
        self.output.close();
        self.buffer = None;
        self.done = None;
        self.state = PlayerState::Uninitialized;
    }

    /// Perform the deferred `Playing → Ready` transition once the voice has
    /// signalled completion.
    fn reap_finished(&mut self) {
        if self.state != PlayerState::Playing {
            return;
        }
        let finished = self
            .done
            .as_ref()
            .is_some_and(|d| d.load(Ordering::Acquire));
        if finished {
            self.output.stop_voice();
            self.done = None;
            self.state = PlayerState::Ready;
        }
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.release();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
