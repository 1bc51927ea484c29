//! Pipeline state machine and shared application state.
//!
//! [`PipelineState`] drives the orchestrator's state machine.  The UI reads
//! it via [`SharedState`] to render the appropriate view.
//!
//! The terminal states carry their payloads: `Ready` always holds the
//! completed [`LandmarkRecord`] and `Failed` always holds the user-facing
//! message, so a rendered result can never be missing its data.
//!
//! [`SharedState`] is a type alias for `Arc<Mutex<AppState>>` — cheap to
//! clone and safe to share across threads.

use std::sync::{Arc, Mutex};

use crate::config::AppConfig;
use crate::gateway::Citation;

// ---------------------------------------------------------------------------
// LandmarkRecord
// ---------------------------------------------------------------------------

/// The completed result of one pipeline run.
///
/// Created only when the final stage succeeds; immutable thereafter and
/// discarded on reset.  The narration audio is kept in its encoded transport
/// form — decoding for playback happens at the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkRecord {
    /// Landmark name, e.g. `"Eiffel Tower, Paris, France"`.  Never empty.
    pub name: String,
    /// Generated history text.  Never empty.
    pub history: String,
    /// Web sources backing the history.  May be empty ("no sources").
    pub citations: Vec<Citation>,
    /// Base64-encoded 16-bit mono PCM narration at 24 kHz.  Never empty.
    pub narration_audio: String,
}

// ---------------------------------------------------------------------------
// PipelineState
// ---------------------------------------------------------------------------

/// States of the photo-to-narration pipeline.
///
/// The state machine transitions are:
///
/// ```text
/// Idle ──image submitted──▶ AnalyzingImage
///                           ──landmark resolved──▶ FetchingHistory
///                                                  ──history resolved──▶ SynthesizingAudio
///                                                                        ──audio resolved──▶ Ready
/// any in-flight stage ──failure──▶ Failed
/// Ready / Failed ──reset──▶ Idle
/// ```
///
/// Transitions are strictly forward; the only way out of a terminal state is
/// an explicit reset.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineState {
    /// Waiting for the user to submit a photograph.
    Idle,

    /// The vision call is identifying the landmark in the photo.
    AnalyzingImage,

    /// The research call is generating the history with citations.
    FetchingHistory,

    /// The speech-synthesis call is generating the narration audio.
    SynthesizingAudio,

    /// The pipeline completed; the record is ready for display and playback.
    Ready(LandmarkRecord),

    /// A stage failed.  Carries the user-facing error message.
    Failed(String),
}

impl PipelineState {
    /// Returns `true` while an inference stage is in flight.
    ///
    /// The UI uses this to show the progress spinner and block submission.
    ///
    /// ```
    /// use landmark_guide::pipeline::PipelineState;
    ///
    /// assert!(!PipelineState::Idle.is_busy());
    /// assert!(PipelineState::AnalyzingImage.is_busy());
    /// assert!(PipelineState::FetchingHistory.is_busy());
    /// assert!(PipelineState::SynthesizingAudio.is_busy());
    /// ```
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            PipelineState::AnalyzingImage
                | PipelineState::FetchingHistory
                | PipelineState::SynthesizingAudio
        )
    }

    /// Returns `true` for the two states that only a reset can leave.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Ready(_) | PipelineState::Failed(_))
    }

    /// A short human-readable label suitable for the progress display.
    pub fn label(&self) -> &'static str {
        match self {
            PipelineState::Idle => "Idle",
            PipelineState::AnalyzingImage => "Identifying landmark…",
            PipelineState::FetchingHistory => "Researching history…",
            PipelineState::SynthesizingAudio => "Creating narration…",
            PipelineState::Ready(_) => "Done",
            PipelineState::Failed(_) => "Error",
        }
    }

    /// The completed record, when in `Ready`.
    pub fn record(&self) -> Option<&LandmarkRecord> {
        match self {
            PipelineState::Ready(record) => Some(record),
            _ => None,
        }
    }

    /// The failure message, when in `Failed`.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            PipelineState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        PipelineState::Idle
    }
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// Shared application state — the single source of truth for the UI.
///
/// Held behind [`SharedState`] (`Arc<Mutex<AppState>>`).  The pipeline
/// orchestrator mutates it; the egui update loop reads it each frame.
pub struct AppState {
    /// Current phase of the photo-to-narration pipeline.  The terminal
    /// variants carry the record / error message.
    pub pipeline: PipelineState,

    /// Current application configuration.
    pub config: AppConfig,
}

impl AppState {
    /// Create a new `AppState` in `Idle`.
    pub fn new(config: AppConfig) -> Self {
        Self {
            pipeline: PipelineState::Idle,
            config,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

// ---------------------------------------------------------------------------
// SharedState
// ---------------------------------------------------------------------------

/// Thread-safe handle to [`AppState`].
///
/// Cheap to clone (`Arc` clone).  Lock with `.lock().unwrap()` for a short
/// critical section; do **not** hold the lock across `.await` points.
pub type SharedState = Arc<Mutex<AppState>>;

/// Construct a new [`SharedState`] wrapping a default [`AppState`].
pub fn new_shared_state(config: AppConfig) -> SharedState {
    Arc::new(Mutex::new(AppState::new(config)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
