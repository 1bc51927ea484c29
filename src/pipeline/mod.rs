//! Pipeline orchestrator module for Landmark Guide.
//!
//! This module wires the full photo → recognition → research → narration
//! workflow and exposes the shared state that the UI reads every frame.
//!
//! # Architecture
//!
//! ```text
//! PipelineCommand (mpsc)
//!        │
//!        ▼
//! PipelineOrchestrator::run()  ← async tokio task
//!        │
//!        ├─ SubmitImage
//!        │     ├─ gateway.recognize_landmark   → AnalyzingImage
//!        │     ├─ gateway.research_history     → FetchingHistory
//!        │     ├─ gateway.synthesize_speech    → SynthesizingAudio
//!        │     └─ Ready(LandmarkRecord)  /  Failed(message)
//!        │
//!        └─ Reset → Idle
//!
//! SharedState (Arc<Mutex<AppState>>) ←─── read by egui update() each frame
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use landmark_guide::config::AppConfig;
//! use landmark_guide::gateway::{GeminiGateway, InferenceGateway};
//! use landmark_guide::pipeline::{new_shared_state, PipelineCommand, PipelineOrchestrator};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let shared_state = new_shared_state(config.clone());
//!     let gateway: Arc<dyn InferenceGateway> =
//!         Arc::new(GeminiGateway::from_config(&config.gateway));
//!
//!     let (command_tx, command_rx) = mpsc::channel::<PipelineCommand>(16);
//!     let orchestrator = PipelineOrchestrator::new(shared_state.clone(), gateway);
//!
//!     tokio::spawn(async move { orchestrator.run(command_rx).await });
//!
//!     // command_tx is handed to the UI, which sends SubmitImage / Reset.
//! }
//! ```

pub mod runner;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use runner::{PipelineCommand, PipelineError, PipelineOrchestrator};
pub use state::{new_shared_state, AppState, LandmarkRecord, PipelineState, SharedState};
