//! Audio engine — narration decode → single-voice playback.
//!
//! # Pipeline
//!
//! ```text
//! base64 PCM blob → decode_narration → DecodedAudioBuffer (24 kHz mono f32)
//!                 → PlaybackController::attach → play / pause → cpal output
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use landmark_guide::audio::{decode_narration, PlaybackController};
//!
//! let buffer = decode_narration("AAAAgA==").unwrap();
//! let mut player = PlaybackController::with_default_output();
//! player.attach(Arc::new(buffer));
//! player.play();
//! // … later — on every exit path:
//! player.release();
//! ```

pub mod decode;
pub mod playback;

pub use decode::{
    decode_narration, DecodeError, DecodedAudioBuffer, NARRATION_CHANNELS, NARRATION_SAMPLE_RATE,
};
pub use playback::{AudioOutput, CpalOutput, PlaybackController, PlaybackError, PlayerState};
