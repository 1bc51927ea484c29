//! Inference gateway — the three networked calls the pipeline consumes.
//!
//! This module provides:
//! * [`InferenceGateway`] — async trait over the three operations
//!   (recognize landmark, research history, synthesize speech).
//! * [`GeminiGateway`] — Gemini-compatible REST implementation.
//! * [`ImagePayload`] — a photograph in transport-ready form.
//! * [`Citation`] / [`HistoryResult`] — research-call response types.
//! * [`PromptBuilder`] — the instruction text for each call.
//! * [`GatewayError`] — error variants for gateway operations.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use landmark_guide::config::AppConfig;
//! use landmark_guide::gateway::{GeminiGateway, ImagePayload, InferenceGateway};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let gateway = GeminiGateway::from_config(&config.gateway);
//!
//!     let image = ImagePayload::from_path("photo.jpg".as_ref()).unwrap();
//!     let name = gateway.recognize_landmark(&image).await.unwrap();
//!     let research = gateway.research_history(&name).await.unwrap();
//!     let audio = gateway.synthesize_speech(&research.history).await.unwrap();
//!     println!("{name}: {} ({} bytes of audio)", research.history, audio.len());
//! }
//! ```

pub mod client;
pub mod prompt;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use client::{
    Citation, GatewayError, GeminiGateway, HistoryResult, ImageError, ImagePayload,
    InferenceGateway,
};
pub use prompt::PromptBuilder;
