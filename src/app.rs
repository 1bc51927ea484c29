//! Landmark Guide window — egui/eframe application.
//!
//! # Architecture
//!
//! [`GuideApp`] is the top-level [`eframe::App`].  It is a thin binding
//! layer: each frame it snapshots the [`SharedState`] written by the
//! orchestrator, renders the panel for the current [`PipelineState`], and
//! forwards user actions as [`PipelineCommand`]s.  It also owns the
//! [`PlaybackController`], attaching the decoded narration when a result
//! arrives and releasing the device when the result is discarded.
//!
//! # Window States
//!
//! | State | Visual |
//! |-------|--------|
//! | `Idle` | Drop-target hint |
//! | `AnalyzingImage` / `FetchingHistory` / `SynthesizingAudio` | Spinner + stage label |
//! | `Ready` | Landmark name, history, sources, play/pause |
//! | `Failed` | Error message + Try Again |

use std::sync::Arc;
use std::time::Duration;

use eframe::egui;
use tokio::sync::mpsc;

use crate::audio::{decode_narration, PlaybackController};
use crate::gateway::ImagePayload;
use crate::pipeline::{LandmarkRecord, PipelineCommand, PipelineState, SharedState};

// ---------------------------------------------------------------------------
// GuideApp
// ---------------------------------------------------------------------------

/// eframe application — the Landmark Guide window.
pub struct GuideApp {
    /// Shared pipeline state, written by the orchestrator task.
    state: SharedState,
    /// Sends commands to the background pipeline orchestrator.
    command_tx: mpsc::Sender<PipelineCommand>,
    /// Narration playback engine.  Owned here — the orchestrator never
    /// touches audio.
    player: PlaybackController,
    /// Whether the current `Ready` record's narration has been decoded and
    /// attached to the player.
    narration_attached: bool,
    /// Spinner animation phase (increases each frame).
    spinner_phase: f32,
}

impl GuideApp {
    /// Create a new [`GuideApp`].
    ///
    /// * `state`      — shared state written by the orchestrator (also holds
    ///   the loaded [`crate::config::AppConfig`]).
    /// * `command_tx` — sender end of the pipeline command channel.
    /// * `player`     — playback controller (default-output in production).
    pub fn new(
        state: SharedState,
        command_tx: mpsc::Sender<PipelineCommand>,
        player: PlaybackController,
    ) -> Self {
        Self {
            state,
            command_tx,
            player,
            narration_attached: false,
            spinner_phase: 0.0,
        }
    }

    // ── Input handling ───────────────────────────────────────────────────

    /// Pick up files dropped onto the window and submit the first one.
    ///
    /// Read failures and unsupported formats are logged and ignored — the
    /// window simply stays in its current state.
    fn poll_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        let Some(file) = dropped.into_iter().next() else {
            return;
        };

        {
            let st = self.state.lock().unwrap();
            if st.pipeline != PipelineState::Idle {
                log::debug!("app: ignoring dropped file while not idle");
                return;
            }
        }

        let payload = if let Some(path) = &file.path {
            ImagePayload::from_path(path)
        } else if let Some(bytes) = &file.bytes {
            ImagePayload::from_bytes(bytes.to_vec())
        } else {
            log::warn!("app: dropped file carried neither path nor bytes");
            return;
        };

        match payload {
            Ok(image) => {
                log::info!("app: submitting dropped photo ({})", image.mime);
                let _ = self
                    .command_tx
                    .try_send(PipelineCommand::SubmitImage(image));
            }
            Err(e) => {
                log::warn!("app: could not use dropped file: {e}");
            }
        }
    }

    // ── Playback binding ─────────────────────────────────────────────────

    /// Keep the playback controller in step with the pipeline state.
    ///
    /// On the first frame a record is visible its narration is decoded and
    /// attached (eager, so Play starts instantly).  When the record goes
    /// away — reset, or a new run replacing it — the device is released.
    /// Decode and device failures are logged and suppressed; `play()` then
    /// stays a harmless no-op.
    fn sync_playback(&mut self, pipeline: &PipelineState) {
        match pipeline {
            PipelineState::Ready(record) if !self.narration_attached => {
                match decode_narration(&record.narration_audio) {
                    Ok(buffer) => {
                        self.player.attach(Arc::new(buffer));
                    }
                    Err(e) => {
                        log::error!("app: narration decode failed: {e}");
                    }
                }
                // Attempted once per record either way.
                self.narration_attached = true;
            }
            PipelineState::Ready(_) => {}
            _ => {
                if self.narration_attached {
                    self.player.release();
                    self.narration_attached = false;
                }
            }
        }
    }

    /// Send a reset to the orchestrator.  Playback release follows on the
    /// next frame via [`sync_playback`](Self::sync_playback).
    fn request_reset(&mut self) {
        let _ = self.command_tx.try_send(PipelineCommand::Reset);
    }

    // ── State-specific panel renderers ───────────────────────────────────

    /// Render the Idle state panel: drop-target hint.
    fn draw_idle(&mut self, ui: &mut egui::Ui) {
        ui.add_space(24.0);
        ui.vertical_centered(|ui| {
            ui.label(
                egui::RichText::new("Drop a photo of a landmark here")
                    .color(egui::Color32::from_rgb(160, 160, 160))
                    .size(16.0),
            );
            ui.add_space(6.0);
            ui.label(
                egui::RichText::new("JPEG, PNG, WebP or GIF")
                    .color(egui::Color32::from_rgb(110, 110, 110))
                    .size(12.0),
            );
        });
    }

    /// Render an in-flight stage panel: spinner + stage label.
    fn draw_busy(&self, ui: &mut egui::Ui, label: &str) {
        ui.add_space(32.0);
        ui.vertical_centered(|ui| {
            ui.label(
                egui::RichText::new(format!("{} {label}", self.spinner_char()))
                    .color(egui::Color32::from_rgb(68, 136, 255))
                    .size(15.0),
            );
        });
    }

    /// Render the Ready state panel: record fields + playback controls.
    fn draw_ready(&mut self, ui: &mut egui::Ui, record: &LandmarkRecord) {
        ui.add_space(8.0);
        ui.label(
            egui::RichText::new(&record.name)
                .color(egui::Color32::from_rgb(80, 200, 120))
                .size(18.0)
                .strong(),
        );

        ui.add_space(6.0);
        egui::ScrollArea::vertical()
            .max_height((ui.available_height() - 80.0).max(60.0))
            .show(ui, |ui| {
                ui.label(
                    egui::RichText::new(&record.history)
                        .color(egui::Color32::from_rgb(210, 210, 210))
                        .size(13.0),
                );

                ui.add_space(8.0);
                ui.label(
                    egui::RichText::new("Sources")
                        .color(egui::Color32::from_rgb(150, 150, 150))
                        .size(12.0)
                        .strong(),
                );
                if record.citations.is_empty() {
                    ui.label(
                        egui::RichText::new("No sources")
                            .color(egui::Color32::from_rgb(110, 110, 110))
                            .italics()
                            .size(11.0),
                    );
                } else {
                    for citation in &record.citations {
                        ui.hyperlink_to(
                            egui::RichText::new(citation.display_title()).size(11.0),
                            &citation.uri,
                        );
                    }
                }
            });

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            let playing = self.player.is_playing();
            let toggle_label = if playing { "Pause" } else { "Play narration" };
            if ui
                .add(egui::Button::new(egui::RichText::new(toggle_label).size(13.0)))
                .clicked()
            {
                if playing {
                    self.player.pause();
                } else {
                    self.player.play();
                }
            }

            if ui
                .add(egui::Button::new(egui::RichText::new("New photo").size(13.0)))
                .clicked()
            {
                self.request_reset();
            }
        });
    }

    /// Render the Failed state panel: message + retry button.
    fn draw_failed(&mut self, ui: &mut egui::Ui, message: &str) {
        ui.add_space(16.0);
        ui.vertical_centered(|ui| {
            ui.label(
                egui::RichText::new("Something went wrong")
                    .color(egui::Color32::from_rgb(255, 136, 68))
                    .size(16.0),
            );
            ui.add_space(6.0);
            ui.label(
                egui::RichText::new(message)
                    .color(egui::Color32::from_rgb(190, 190, 190))
                    .size(12.0),
            );
            ui.add_space(10.0);
            if ui
                .add(egui::Button::new(egui::RichText::new("Try Again").size(13.0)))
                .clicked()
            {
                self.request_reset();
            }
        });
    }

    // ── Helpers ───────────────────────────────────────────────────────────

    /// A simple rotating ASCII spinner character driven by `spinner_phase`.
    fn spinner_char(&self) -> char {
        let chars = ['|', '/', '-', '\\'];
        let idx = (self.spinner_phase as usize) % chars.len();
        chars[idx]
    }
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for GuideApp {
    /// Called every frame by eframe.  Polls input, syncs playback, then
    /// renders the panel for the current pipeline state.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_dropped_files(ctx);

        // Snapshot the pipeline state for this frame; the lock is never held
        // while rendering.
        let pipeline = { self.state.lock().unwrap().pipeline.clone() };

        self.sync_playback(&pipeline);

        // --- Advance spinner animation -------------------------------------
        self.spinner_phase += 0.08;
        if self.spinner_phase >= 4.0 {
            self.spinner_phase = 0.0;
        }

        // --- Schedule repaints while animated states are active -----------
        if pipeline.is_busy() {
            // Repaint at ~15 fps for the spinner.
            ctx.request_repaint_after(Duration::from_millis(66));
        } else if self.player.is_playing() {
            // Poll for natural playback completion.
            ctx.request_repaint_after(Duration::from_millis(200));
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading(
                egui::RichText::new("Landmark Guide")
                    .color(egui::Color32::from_rgb(200, 200, 200))
                    .size(15.0),
            );
            ui.separator();

            match &pipeline {
                PipelineState::Idle => self.draw_idle(ui),
                PipelineState::AnalyzingImage
                | PipelineState::FetchingHistory
                | PipelineState::SynthesizingAudio => self.draw_busy(ui, pipeline.label()),
                PipelineState::Ready(record) => self.draw_ready(ui, record),
                PipelineState::Failed(message) => self.draw_failed(ui, message),
            }
        });
    }

    /// Release the audio device on window close (best-effort).
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.player.release();
        let config = { self.state.lock().unwrap().config.clone() };
        if let Err(e) = config.save() {
            log::warn!("app: could not save settings on exit: {e}");
        }
        log::info!("Landmark Guide closing");
    }
}
