//! Pipeline orchestrator — drives the recognize → research → synthesize run.
//!
//! [`PipelineOrchestrator`] owns the [`SharedState`] and responds to
//! [`PipelineCommand`]s received over a `tokio::sync::mpsc` channel.
//!
//! # Pipeline flow
//!
//! ```text
//! PipelineCommand::SubmitImage
//!   └─▶ gateway.recognize_landmark   [AnalyzingImage]
//!         └─▶ gateway.research_history   [FetchingHistory]
//!               └─▶ gateway.synthesize_speech   [SynthesizingAudio]
//!                     └─▶ Ready(LandmarkRecord)
//!   any failure ──▶ Failed(message)
//!
//! PipelineCommand::Reset
//!   └─▶ Idle (record / error discarded)
//! ```
//!
//! The three gateway calls are strictly sequential — each stage's input is
//! the previous stage's output — and every await point is a cooperative
//! suspension inside this single task.  A reset queued behind an in-flight
//! submission does not abort the underlying request; it applies once the run
//! terminalises, discarding the result.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::gateway::{ImagePayload, InferenceGateway};

use super::state::{LandmarkRecord, PipelineState, SharedState};

// ---------------------------------------------------------------------------
// PipelineError
// ---------------------------------------------------------------------------

/// Errors that can surface inside the pipeline.
///
/// All variants carry a human-readable description so the UI can display
/// them without knowing the internal cause.
#[derive(Debug)]
pub enum PipelineError {
    /// The submitted image was unreadable or empty.
    Input(String),
    /// The landmark-recognition stage failed or returned nothing usable.
    Recognition(String),
    /// The history-research stage failed or returned nothing usable.
    Research(String),
    /// The speech-synthesis stage failed or returned no audio.
    Synthesis(String),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Input(msg) => write!(f, "Could not read the photo: {msg}"),
            PipelineError::Recognition(msg) => {
                write!(f, "Landmark recognition failed: {msg}")
            }
            PipelineError::Research(msg) => write!(f, "History research failed: {msg}"),
            PipelineError::Synthesis(msg) => {
                write!(f, "Narration synthesis failed: {msg}")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// PipelineCommand
// ---------------------------------------------------------------------------

/// Commands sent from the UI to the orchestrator.
#[derive(Debug, Clone)]
pub enum PipelineCommand {
    /// Run the full pipeline on the given photograph.
    SubmitImage(ImagePayload),
    /// Discard the current result / error and return to `Idle`.
    Reset,
}

// ---------------------------------------------------------------------------
// PipelineOrchestrator
// ---------------------------------------------------------------------------

/// Drives the complete photo-to-narration pipeline.
///
/// Create with [`PipelineOrchestrator::new`], then call [`run`](Self::run)
/// inside a tokio task.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use landmark_guide::config::AppConfig;
/// use landmark_guide::gateway::{GeminiGateway, InferenceGateway};
/// use landmark_guide::pipeline::{new_shared_state, PipelineOrchestrator};
///
/// # async fn example() {
/// let config = AppConfig::default();
/// let shared_state = new_shared_state(config.clone());
/// let gateway: Arc<dyn InferenceGateway> =
///     Arc::new(GeminiGateway::from_config(&config.gateway));
///
/// let (command_tx, command_rx) = tokio::sync::mpsc::channel(16);
/// let orchestrator = PipelineOrchestrator::new(shared_state, gateway);
/// orchestrator.run(command_rx).await;
/// # let _ = command_tx;
/// # }
/// ```
pub struct PipelineOrchestrator {
    state: SharedState,
    gateway: Arc<dyn InferenceGateway>,
}

impl PipelineOrchestrator {
    /// Create a new orchestrator.
    ///
    /// # Arguments
    ///
    /// * `state`   — shared application state (also read by the UI).
    /// * `gateway` — inference gateway (e.g. `GeminiGateway`).
    pub fn new(state: SharedState, gateway: Arc<dyn InferenceGateway>) -> Self {
        Self { state, gateway }
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Run the orchestrator until `command_rx` is closed.
    ///
    /// This is an `async fn` and should be spawned as a tokio task from
    /// `main()`.  It never returns while the channel is open.
    pub async fn run(self, mut command_rx: mpsc::Receiver<PipelineCommand>) {
        while let Some(command) = command_rx.recv().await {
            match command {
                PipelineCommand::SubmitImage(image) => {
                    self.handle_submit(image).await;
                }
                PipelineCommand::Reset => {
                    self.handle_reset();
                }
            }
        }

        log::info!("pipeline: command channel closed, orchestrator shutting down");
    }

    // -----------------------------------------------------------------------
    // Command handlers
    // -----------------------------------------------------------------------

    /// Handle reset: discard any record or error and return to `Idle`.
    fn handle_reset(&self) {
        log::debug!("pipeline: Reset → Idle");
        self.set_state(PipelineState::Idle);
    }

    /// Handle an image submission: run the three stages in order.
    async fn handle_submit(&self, image: ImagePayload) {
        // Only Idle accepts a submission; terminal states need an explicit
        // reset first, and duplicate submissions while busy cannot happen
        // because this task processes commands sequentially.
        {
            let st = self.state.lock().unwrap();
            if st.pipeline != PipelineState::Idle {
                log::warn!(
                    "pipeline: ignoring SubmitImage in state {:?}",
                    st.pipeline.label()
                );
                return;
            }
        }

        if image.bytes.is_empty() {
            self.fail(PipelineError::Input("image data is empty".into()));
            return;
        }

        // ── 1. Landmark recognition ──────────────────────────────────────
        self.set_state(PipelineState::AnalyzingImage);

        let name = match self.gateway.recognize_landmark(&image).await {
            Ok(name) => name.trim().to_string(),
            Err(e) => {
                self.fail(PipelineError::Recognition(e.to_string()));
                return;
            }
        };
        if name.is_empty() {
            self.fail(PipelineError::Recognition(
                "no landmark was identified in the photo".into(),
            ));
            return;
        }
        log::debug!("pipeline: recognized landmark {name:?}");

        // ── 2. History research ──────────────────────────────────────────
        self.set_state(PipelineState::FetchingHistory);

        let research = match self.gateway.research_history(&name).await {
            Ok(research) => research,
            Err(e) => {
                self.fail(PipelineError::Research(e.to_string()));
                return;
            }
        };
        if research.history.trim().is_empty() {
            self.fail(PipelineError::Research("the history came back empty".into()));
            return;
        }
        log::debug!(
            "pipeline: history resolved ({} chars, {} citations)",
            research.history.len(),
            research.citations.len()
        );

        // ── 3. Speech synthesis ──────────────────────────────────────────
        self.set_state(PipelineState::SynthesizingAudio);

        let narration_audio = match self.gateway.synthesize_speech(&research.history).await {
            Ok(audio) => audio,
            Err(e) => {
                self.fail(PipelineError::Synthesis(e.to_string()));
                return;
            }
        };
        if narration_audio.is_empty() {
            self.fail(PipelineError::Synthesis("no audio data was returned".into()));
            return;
        }

        // ── 4. Finalise ──────────────────────────────────────────────────
        // The record is assembled in one step: Ready is unreachable without
        // every field present.
        self.set_state(PipelineState::Ready(LandmarkRecord {
            name,
            history: research.history,
            citations: research.citations,
            narration_audio,
        }));
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn set_state(&self, state: PipelineState) {
        let mut st = self.state.lock().unwrap();
        st.pipeline = state;
    }

    fn fail(&self, error: PipelineError) {
        let message = error.to_string();
        log::error!("pipeline error: {message}");
        self.set_state(PipelineState::Failed(message));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::gateway::{Citation, GatewayError, HistoryResult};
    use crate::pipeline::state::new_shared_state;
    use async_trait::async_trait;
    use std::sync::Mutex;

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Scripted gateway: `None` for an operation makes that stage fail.
    /// Records call order so tests can assert sequencing.
    struct MockGateway {
        landmark: Option<String>,
        research: Option<HistoryResult>,
        audio: Option<String>,
        calls: Mutex<Vec<&'static str>>,
    }

    impl MockGateway {
        /// Fully successful run: Eiffel Tower with two citations.
        fn ok() -> Self {
            Self {
                landmark: Some("Eiffel Tower, Paris, France".into()),
                research: Some(HistoryResult {
                    history: "Built for the 1889 World's Fair, it was once \
                              the tallest structure on Earth."
                        .into(),
                    citations: vec![
                        Citation {
                            uri: "https://en.wikipedia.org/wiki/Eiffel_Tower".into(),
                            title: Some("Eiffel Tower - Wikipedia".into()),
                        },
                        Citation {
                            uri: "https://www.toureiffel.paris/en".into(),
                            title: None,
                        },
                    ],
                }),
                audio: Some("AAAAgA==".into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl InferenceGateway for MockGateway {
        async fn recognize_landmark(
            &self,
            _image: &ImagePayload,
        ) -> Result<String, GatewayError> {
            self.calls.lock().unwrap().push("recognize");
            self.landmark
                .clone()
                .ok_or_else(|| GatewayError::Request("vision backend unreachable".into()))
        }

        async fn research_history(
            &self,
            _landmark_name: &str,
        ) -> Result<HistoryResult, GatewayError> {
            self.calls.lock().unwrap().push("research");
            self.research
                .clone()
                .ok_or_else(|| GatewayError::Request("search backend unreachable".into()))
        }

        async fn synthesize_speech(&self, _history: &str) -> Result<String, GatewayError> {
            self.calls.lock().unwrap().push("synthesize");
            self.audio.clone().ok_or(GatewayError::EmptyResponse)
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn test_image() -> ImagePayload {
        ImagePayload {
            bytes: vec![0xFF, 0xD8, 0xFF, 0xE0],
            mime: "image/jpeg".into(),
        }
    }

    fn make_orchestrator(
        gateway: Arc<MockGateway>,
    ) -> (PipelineOrchestrator, SharedState) {
        let state = new_shared_state(AppConfig::default());
        let orc = PipelineOrchestrator::new(
            Arc::clone(&state),
            Arc::clone(&gateway) as Arc<dyn InferenceGateway>,
        );
        (orc, state)
    }

    /// Send `commands`, close the channel, and run the orchestrator to
    /// completion.
    async fn drive(orc: PipelineOrchestrator, commands: Vec<PipelineCommand>) {
        let (tx, rx) = mpsc::channel(commands.len().max(1));
        for cmd in commands {
            tx.send(cmd).await.unwrap();
        }
        drop(tx); // close channel so run() returns
        orc.run(rx).await;
    }

    // -----------------------------------------------------------------------
    // Success path
    // -----------------------------------------------------------------------

    /// Full end-to-end success: Ready with every field of the record filled
    /// and both citations preserved in order.
    #[tokio::test]
    async fn successful_run_reaches_ready_with_full_record() {
        let gateway = Arc::new(MockGateway::ok());
        let (orc, state) = make_orchestrator(Arc::clone(&gateway));

        drive(orc, vec![PipelineCommand::SubmitImage(test_image())]).await;

        let st = state.lock().unwrap();
        let record = st.pipeline.record().expect("pipeline should be Ready");
        assert_eq!(record.name, "Eiffel Tower, Paris, France");
        assert!(record.history.contains("1889"));
        assert_eq!(record.citations.len(), 2);
        assert_eq!(record.citations[0].display_title(), "Eiffel Tower - Wikipedia");
        assert_eq!(record.citations[1].display_title(), "www.toureiffel.paris");
        assert_eq!(record.narration_audio, "AAAAgA==");

        // The three stages ran exactly once each, in order.
        assert_eq!(gateway.calls(), vec!["recognize", "research", "synthesize"]);
    }

    /// Citations may legitimately be empty — that is still a success.
    #[tokio::test]
    async fn empty_citations_still_reach_ready() {
        let mut mock = MockGateway::ok();
        mock.research = Some(HistoryResult {
            history: "A short history.".into(),
            citations: Vec::new(),
        });
        let (orc, state) = make_orchestrator(Arc::new(mock));

        drive(orc, vec![PipelineCommand::SubmitImage(test_image())]).await;

        let st = state.lock().unwrap();
        let record = st.pipeline.record().expect("pipeline should be Ready");
        assert!(record.citations.is_empty());
    }

    // -----------------------------------------------------------------------
    // Failure paths
    // -----------------------------------------------------------------------

    /// Recognition failure: Failed, no record, later stages never run.
    #[tokio::test]
    async fn recognition_failure_stops_the_pipeline() {
        let mut mock = MockGateway::ok();
        mock.landmark = None;
        let gateway = Arc::new(mock);
        let (orc, state) = make_orchestrator(Arc::clone(&gateway));

        drive(orc, vec![PipelineCommand::SubmitImage(test_image())]).await;

        let st = state.lock().unwrap();
        assert!(st.pipeline.record().is_none());
        let message = st.pipeline.error_message().expect("should be Failed");
        assert!(!message.is_empty());
        assert!(message.contains("recognition"));
        assert_eq!(gateway.calls(), vec!["recognize"]);
    }

    /// Research failure, then reset: Failed → Idle; no record ever exposed.
    #[tokio::test]
    async fn research_failure_then_reset_returns_to_idle() {
        let mut mock = MockGateway::ok();
        mock.research = None;
        let gateway = Arc::new(mock);
        let (orc, state) = make_orchestrator(Arc::clone(&gateway));

        drive(orc, vec![PipelineCommand::SubmitImage(test_image())]).await;
        {
            let st = state.lock().unwrap();
            assert!(st.pipeline.record().is_none());
            assert!(st.pipeline.error_message().is_some_and(|m| !m.is_empty()));
        }

        // Reset needs a fresh orchestrator run over the same shared state.
        let orc = PipelineOrchestrator::new(
            Arc::clone(&state),
            Arc::clone(&gateway) as Arc<dyn InferenceGateway>,
        );
        drive(orc, vec![PipelineCommand::Reset]).await;

        let st = state.lock().unwrap();
        assert_eq!(st.pipeline, PipelineState::Idle);
        assert_eq!(gateway.calls(), vec!["recognize", "research"]);
    }

    /// Synthesis failure: Failed with a non-empty message.
    #[tokio::test]
    async fn synthesis_failure_stops_the_pipeline() {
        let mut mock = MockGateway::ok();
        mock.audio = None;
        let (orc, state) = make_orchestrator(Arc::new(mock));

        drive(orc, vec![PipelineCommand::SubmitImage(test_image())]).await;

        let st = state.lock().unwrap();
        assert!(st.pipeline.record().is_none());
        assert!(st
            .pipeline
            .error_message()
            .is_some_and(|m| m.contains("synthesis")));
    }

    /// A landmark name of pure whitespace counts as no landmark.
    #[tokio::test]
    async fn blank_landmark_name_is_a_recognition_failure() {
        let mut mock = MockGateway::ok();
        mock.landmark = Some("   ".into());
        let gateway = Arc::new(mock);
        let (orc, state) = make_orchestrator(Arc::clone(&gateway));

        drive(orc, vec![PipelineCommand::SubmitImage(test_image())]).await;

        let st = state.lock().unwrap();
        assert!(st
            .pipeline
            .error_message()
            .is_some_and(|m| m.contains("recognition")));
        // Research must not have been attempted.
        assert_eq!(gateway.calls(), vec!["recognize"]);
    }

    /// An empty history is a research failure, not a silent success.
    #[tokio::test]
    async fn empty_history_is_a_research_failure() {
        let mut mock = MockGateway::ok();
        mock.research = Some(HistoryResult {
            history: "  ".into(),
            citations: Vec::new(),
        });
        let gateway = Arc::new(mock);
        let (orc, state) = make_orchestrator(Arc::clone(&gateway));

        drive(orc, vec![PipelineCommand::SubmitImage(test_image())]).await;

        let st = state.lock().unwrap();
        assert!(st
            .pipeline
            .error_message()
            .is_some_and(|m| m.contains("research")));
        assert_eq!(gateway.calls(), vec!["recognize", "research"]);
    }

    /// Empty image bytes never reach the network.
    #[tokio::test]
    async fn empty_image_fails_before_any_gateway_call() {
        let gateway = Arc::new(MockGateway::ok());
        let (orc, state) = make_orchestrator(Arc::clone(&gateway));

        let empty = ImagePayload {
            bytes: Vec::new(),
            mime: "image/jpeg".into(),
        };
        drive(orc, vec![PipelineCommand::SubmitImage(empty)]).await;

        let st = state.lock().unwrap();
        assert!(st
            .pipeline
            .error_message()
            .is_some_and(|m| m.contains("photo")));
        assert!(gateway.calls().is_empty());
    }

    // -----------------------------------------------------------------------
    // State machine discipline
    // -----------------------------------------------------------------------

    /// A second submission while a result is displayed is ignored; the user
    /// must reset first.
    #[tokio::test]
    async fn submit_is_ignored_outside_idle() {
        let gateway = Arc::new(MockGateway::ok());
        let (orc, state) = make_orchestrator(Arc::clone(&gateway));

        drive(
            orc,
            vec![
                PipelineCommand::SubmitImage(test_image()),
                PipelineCommand::SubmitImage(test_image()),
            ],
        )
        .await;

        let st = state.lock().unwrap();
        assert!(st.pipeline.record().is_some());
        // Only one run happened.
        assert_eq!(gateway.calls(), vec!["recognize", "research", "synthesize"]);
    }

    /// Reset from Ready discards the record and returns to Idle.
    #[tokio::test]
    async fn reset_from_ready_returns_to_idle() {
        let gateway = Arc::new(MockGateway::ok());
        let (orc, state) = make_orchestrator(gateway);

        drive(
            orc,
            vec![
                PipelineCommand::SubmitImage(test_image()),
                PipelineCommand::Reset,
            ],
        )
        .await;

        let st = state.lock().unwrap();
        assert_eq!(st.pipeline, PipelineState::Idle);
        assert!(st.pipeline.record().is_none());
    }

    /// Submit → reset → submit runs the pipeline twice.
    #[tokio::test]
    async fn resubmission_after_reset_runs_again() {
        let gateway = Arc::new(MockGateway::ok());
        let (orc, state) = make_orchestrator(Arc::clone(&gateway));

        drive(
            orc,
            vec![
                PipelineCommand::SubmitImage(test_image()),
                PipelineCommand::Reset,
                PipelineCommand::SubmitImage(test_image()),
            ],
        )
        .await;

        let st = state.lock().unwrap();
        assert!(st.pipeline.record().is_some());
        assert_eq!(
            gateway.calls(),
            vec![
                "recognize",
                "research",
                "synthesize",
                "recognize",
                "research",
                "synthesize"
            ]
        );
    }
}
