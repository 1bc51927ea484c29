//! Landmark Guide — photo in, spoken history out.
//!
//! Drop a photograph of a landmark onto the window; the app identifies it,
//! researches a short cited history, synthesizes a narration, and plays it
//! back.
//!
//! # Architecture
//!
//! ```text
//! app (egui)  ──PipelineCommand──▶  pipeline::PipelineOrchestrator
//!     ▲                                   │ three sequential calls
//!     │ SharedState                       ▼
//!     └────────────────────────  gateway::InferenceGateway
//!
//! app ──▶ audio::decode_narration ──▶ audio::PlaybackController ──▶ cpal
//! ```
//!
//! * [`pipeline`] — state machine + orchestrator for the three-stage run.
//! * [`gateway`] — the networked inference calls (vision, research, TTS).
//! * [`audio`] — narration decode and single-voice playback.
//! * [`config`] — TOML settings and platform paths.
//! * [`app`] — the egui presentation shell.

pub mod app;
pub mod audio;
pub mod config;
pub mod gateway;
pub mod pipeline;
