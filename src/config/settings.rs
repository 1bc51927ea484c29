//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// GatewayConfig
// ---------------------------------------------------------------------------

/// Settings for the inference gateway (Gemini-compatible REST endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the API endpoint.
    pub base_url: String,
    /// API key — `None` means fall back to the `GEMINI_API_KEY` environment
    /// variable, or send no key at all (proxy endpoints).
    pub api_key: Option<String>,
    /// Model used for landmark recognition from the photograph.
    pub vision_model: String,
    /// Model used for the search-grounded history research.
    pub research_model: String,
    /// Model used for speech synthesis.
    pub tts_model: String,
    /// Prebuilt narration voice name.
    pub voice: String,
    /// Maximum seconds to wait for one inference response before timing out.
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".into(),
            api_key: None,
            vision_model: "gemini-2.5-flash".into(),
            research_model: "gemini-2.5-flash".into(),
            tts_model: "gemini-2.5-flash-preview-tts".into(),
            voice: "Kore".into(),
            timeout_secs: 60,
        }
    }
}

impl GatewayConfig {
    /// API key to use for requests: the configured value when present and
    /// non-empty, otherwise the `GEMINI_API_KEY` environment variable.
    pub fn resolved_api_key(&self) -> Option<String> {
        if let Some(key) = &self.api_key {
            if !key.is_empty() {
                return Some(key.clone());
            }
        }
        std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty())
    }
}

// ---------------------------------------------------------------------------
// AudioConfig
// ---------------------------------------------------------------------------

/// Settings for narration playback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Narration sample rate in Hz (fixed at 24 000 by the TTS contract).
    pub sample_rate: u32,
    /// Audio output device name — `None` means the system default.
    pub output_device: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 24_000,
            output_device: None,
        }
    }
}

// ---------------------------------------------------------------------------
// UiConfig
// ---------------------------------------------------------------------------

/// Window appearance and behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Last saved window position `(x, y)` in screen pixels.  `None` means
    /// let the OS / window manager pick a position on first launch.
    pub window_position: Option<(f32, f32)>,
    /// Keep the window floating above all other windows.
    pub always_on_top: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            window_position: None,
            always_on_top: false,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use landmark_guide::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Inference gateway settings.
    pub gateway: GatewayConfig,
    /// Narration playback settings.
    pub audio: AudioConfig,
    /// Window settings.
    pub ui: UiConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns `true` when no `settings.toml` file exists yet — first-run.
    pub fn is_first_run() -> bool {
        !AppPaths::new().settings_file.exists()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_inference_contract() {
        let config = AppConfig::default();
        assert_eq!(config.audio.sample_rate, 24_000);
        assert_eq!(config.gateway.voice, "Kore");
        assert!(config.gateway.api_key.is_none());
        assert!(config.gateway.base_url.starts_with("https://"));
    }

    #[test]
    fn toml_round_trip_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");

        let mut config = AppConfig::default();
        config.gateway.api_key = Some("test-key".into());
        config.gateway.timeout_secs = 15;
        config.ui.always_on_top = true;

        config.save_to(&path).unwrap();
        let loaded = AppConfig::load_from(&path).unwrap();

        assert_eq!(loaded.gateway.api_key.as_deref(), Some("test-key"));
        assert_eq!(loaded.gateway.timeout_secs, 15);
        assert!(loaded.ui.always_on_top);
    }

    #[test]
    fn load_from_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.toml");

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.gateway.vision_model, "gemini-2.5-flash");
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("dir").join("settings.toml");

        AppConfig::default().save_to(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn configured_key_wins_over_environment() {
        let config = GatewayConfig {
            api_key: Some("from-config".into()),
            ..GatewayConfig::default()
        };
        assert_eq!(config.resolved_api_key().as_deref(), Some("from-config"));
    }

    #[test]
    fn empty_configured_key_is_treated_as_absent() {
        let config = GatewayConfig {
            api_key: Some(String::new()),
            ..GatewayConfig::default()
        };
        // Falls through to the environment; either way, never Some("").
        assert_ne!(config.resolved_api_key().as_deref(), Some(""));
    }
}
