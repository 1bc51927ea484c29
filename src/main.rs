//! Application entry point — Landmark Guide.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Build the inference gateway ([`GeminiGateway`]) from config.
//! 5. Create the shared state and pipeline command channel.
//! 6. Spawn the pipeline orchestrator on the tokio runtime.
//! 7. Run [`eframe::run_native`] — blocks the main thread until the window
//!    is closed.

use std::sync::Arc;

use tokio::sync::mpsc;

use landmark_guide::{
    app::GuideApp,
    audio::PlaybackController,
    config::AppConfig,
    gateway::{GatewayError, GeminiGateway, HistoryResult, ImagePayload, InferenceGateway},
    pipeline::{new_shared_state, PipelineCommand, PipelineOrchestrator},
};

use eframe::egui;

// ---------------------------------------------------------------------------
// Native options builder
// ---------------------------------------------------------------------------

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let mut vp = egui::ViewportBuilder::default()
        .with_inner_size([460.0, 560.0])
        .with_min_inner_size([360.0, 420.0])
        .with_drag_and_drop(true);

    if config.ui.always_on_top {
        vp = vp.with_always_on_top();
    }

    if let Some((x, y)) = config.ui.window_position {
        vp = vp.with_position(egui::pos2(x, y));
    }

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> eframe::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Landmark Guide starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Tokio runtime (2 worker threads — the orchestrator task + HTTP I/O)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to create tokio runtime");

    // 4. Inference gateway (degrade gracefully when no API key is present —
    //    the app still launches and submissions fail with a clear message)
    let gateway: Arc<dyn InferenceGateway> = if config.gateway.resolved_api_key().is_some() {
        Arc::new(GeminiGateway::from_config(&config.gateway))
    } else {
        log::warn!(
            "No API key configured (gateway.api_key in settings.toml or \
             GEMINI_API_KEY). Submissions will fail until one is set."
        );
        Arc::new(UnconfiguredGateway)
    };

    // 5. Shared state + command channel
    let shared_state = new_shared_state(config.clone());
    let (command_tx, command_rx) = mpsc::channel::<PipelineCommand>(16);

    // 6. Spawn pipeline orchestrator onto the tokio runtime
    let orchestrator = PipelineOrchestrator::new(shared_state.clone(), gateway);
    rt.spawn(orchestrator.run(command_rx));

    // 7. Build the egui app and run it (blocks until the window is closed)
    let player = PlaybackController::with_default_output();
    let app = GuideApp::new(shared_state, command_tx, player);

    eframe::run_native(
        "Landmark Guide",
        native_options(&config),
        Box::new(move |_cc| Ok(Box::new(app))),
    )
}

// ---------------------------------------------------------------------------
// UnconfiguredGateway — fallback when no API key is available
// ---------------------------------------------------------------------------

struct UnconfiguredGateway;

#[async_trait::async_trait]
impl InferenceGateway for UnconfiguredGateway {
    async fn recognize_landmark(&self, _image: &ImagePayload) -> Result<String, GatewayError> {
        Err(no_key_error())
    }

    async fn research_history(
        &self,
        _landmark_name: &str,
    ) -> Result<HistoryResult, GatewayError> {
        Err(no_key_error())
    }

    async fn synthesize_speech(&self, _history: &str) -> Result<String, GatewayError> {
        Err(no_key_error())
    }
}

fn no_key_error() -> GatewayError {
    GatewayError::Request(
        "no API key configured — set GEMINI_API_KEY or gateway.api_key in settings.toml".into(),
    )
}
