//! `InferenceGateway` trait and the Gemini REST implementation.
//!
//! `GeminiGateway` calls the `models/{model}:generateContent` endpoint of a
//! Gemini-compatible API for all three operations — vision recognition,
//! search-grounded research, and speech synthesis.  All connection details
//! come from [`GatewayConfig`]; nothing is hardcoded.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use thiserror::Error;

use crate::config::GatewayConfig;
use crate::gateway::prompt::PromptBuilder;

// ---------------------------------------------------------------------------
// GatewayError
// ---------------------------------------------------------------------------

/// Errors that can occur during an inference call.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("inference request timed out")]
    Timeout,

    /// The API rejected the request (non-2xx status).
    #[error("inference API returned status {status}: {message}")]
    Api { status: u16, message: String },

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse inference response: {0}")]
    Parse(String),

    /// The response carried no usable payload (no text, no audio data).
    #[error("inference returned an empty response")]
    EmptyResponse,
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GatewayError::Timeout
        } else {
            GatewayError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// ImagePayload
// ---------------------------------------------------------------------------

/// Errors reading a photograph into its transport form.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("could not read image file: {0}")]
    Read(#[from] std::io::Error),

    #[error("unrecognized image format (expected JPEG, PNG, WebP or GIF)")]
    UnknownFormat,

    #[error("malformed data URL")]
    BadDataUrl,
}

/// A photograph in transport-ready form: raw bytes plus media type.
///
/// Base64 encoding for the wire happens at the gateway boundary via
/// [`inline_data`](Self::inline_data); callers hand over plain bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePayload {
    /// Raw encoded image file contents (JPEG/PNG/… container bytes).
    pub bytes: Vec<u8>,
    /// Media type, e.g. `"image/jpeg"`.
    pub mime: String,
}

impl ImagePayload {
    /// Read an image file from disk, detecting the media type from the
    /// file's magic bytes.
    ///
    /// # Errors
    ///
    /// [`ImageError::Read`] when the file cannot be read,
    /// [`ImageError::UnknownFormat`] when the contents match no supported
    /// image container.
    pub fn from_path(path: &std::path::Path) -> Result<Self, ImageError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(bytes)
    }

    /// Wrap in-memory image file contents, detecting the media type from the
    /// magic bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ImageError> {
        let mime = detect_mime(&bytes).ok_or(ImageError::UnknownFormat)?;
        Ok(Self {
            bytes,
            mime: mime.to_string(),
        })
    }

    /// Parse a `data:<mime>;base64,<payload>` URL, stripping the media-type
    /// prefix and decoding the payload.
    pub fn from_data_url(data_url: &str) -> Result<Self, ImageError> {
        let rest = data_url.strip_prefix("data:").ok_or(ImageError::BadDataUrl)?;
        let (header, payload) = rest.split_once(',').ok_or(ImageError::BadDataUrl)?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or(ImageError::BadDataUrl)?;
        let bytes = STANDARD
            .decode(payload)
            .map_err(|_| ImageError::BadDataUrl)?;
        Ok(Self {
            bytes,
            mime: mime.to_string(),
        })
    }

    /// Base64 transport encoding of the image bytes.
    pub fn inline_data(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}

/// Identify the image container from its leading magic bytes.
fn detect_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        Some("image/png")
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else if bytes.starts_with(b"GIF8") {
        Some("image/gif")
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Citation / HistoryResult
// ---------------------------------------------------------------------------

/// A web source backing a claim in the generated history.
#[derive(Debug, Clone, PartialEq)]
pub struct Citation {
    /// Source URI.
    pub uri: String,
    /// Page title as reported by the grounding metadata, when present.
    pub title: Option<String>,
}

impl Citation {
    /// Title to display: the reported page title, or the URI's host when the
    /// title is absent, or the raw URI as a last resort.
    pub fn display_title(&self) -> String {
        if let Some(title) = &self.title {
            if !title.trim().is_empty() {
                return title.clone();
            }
        }
        url::Url::parse(&self.uri)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| self.uri.clone())
    }
}

/// Result of the history-research call.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryResult {
    /// Generated history text.
    pub history: String,
    /// Web sources backing the history.  May legitimately be empty.
    pub citations: Vec<Citation>,
}

// ---------------------------------------------------------------------------
// InferenceGateway trait
// ---------------------------------------------------------------------------

/// Async trait over the three networked inference operations.
///
/// Implementors must be `Send + Sync` so they can be shared with the
/// orchestrator task as `Arc<dyn InferenceGateway>`.
#[async_trait]
pub trait InferenceGateway: Send + Sync {
    /// Identify the landmark in the photograph; returns a concise name
    /// string such as `"Eiffel Tower, Paris, France"`.
    async fn recognize_landmark(&self, image: &ImagePayload) -> Result<String, GatewayError>;

    /// Research a short history of the named landmark with web citations.
    async fn research_history(&self, landmark_name: &str) -> Result<HistoryResult, GatewayError>;

    /// Synthesize spoken narration; returns base64 16-bit mono PCM at
    /// 24 kHz.
    async fn synthesize_speech(&self, history: &str) -> Result<String, GatewayError>;
}

// ---------------------------------------------------------------------------
// GeminiGateway
// ---------------------------------------------------------------------------

/// Calls a Gemini-compatible `models/{model}:generateContent` REST endpoint.
///
/// # No hardcoded URLs
/// All connection details (`base_url`, API key, model names, voice) come
/// exclusively from the [`GatewayConfig`] passed to
/// [`GeminiGateway::from_config`].
pub struct GeminiGateway {
    client: reqwest::Client,
    config: GatewayConfig,
    prompts: PromptBuilder,
}

impl GeminiGateway {
    /// Build a `GeminiGateway` from application config.
    ///
    /// The HTTP client is pre-configured with the per-request timeout from
    /// `config.timeout_secs`.  A default (no-timeout) client is used as a
    /// last-resort fallback if the builder fails.
    pub fn from_config(config: &GatewayConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
            prompts: PromptBuilder::new(),
        }
    }

    /// POST one `generateContent` request and return the parsed JSON body.
    ///
    /// The `x-goog-api-key` header is attached **only** when a key is
    /// configured (directly or via the `GEMINI_API_KEY` environment
    /// variable) — a proxy endpoint may not need one.
    async fn generate(
        &self,
        model: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, GatewayError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, model
        );

        let mut req = self.client.post(&url).json(&body);

        let key = self.config.resolved_api_key().unwrap_or_default();
        if !key.is_empty() {
            req = req.header("x-goog-api-key", key);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))?;
        Ok(json)
    }
}

/// Pull the first candidate's text part out of a `generateContent` response.
fn first_text(json: &serde_json::Value) -> Result<String, GatewayError> {
    let text = json["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .ok_or(GatewayError::EmptyResponse)?
        .trim()
        .to_string();

    if text.is_empty() {
        return Err(GatewayError::EmptyResponse);
    }
    Ok(text)
}

/// Collect grounding citations, tolerating their absence entirely.
fn grounding_citations(json: &serde_json::Value) -> Vec<Citation> {
    let chunks = match json["candidates"][0]["groundingMetadata"]["groundingChunks"].as_array() {
        Some(chunks) => chunks,
        None => return Vec::new(),
    };

    chunks
        .iter()
        .filter_map(|chunk| {
            let web = &chunk["web"];
            let uri = web["uri"].as_str()?.to_string();
            let title = web["title"]
                .as_str()
                .map(str::to_string)
                .filter(|t| !t.is_empty());
            Some(Citation { uri, title })
        })
        .collect()
}

#[async_trait]
impl InferenceGateway for GeminiGateway {
    async fn recognize_landmark(&self, image: &ImagePayload) -> Result<String, GatewayError> {
        let body = serde_json::json!({
            "contents": [{
                "parts": [
                    { "text": self.prompts.recognition() },
                    { "inlineData": { "mimeType": image.mime, "data": image.inline_data() } }
                ]
            }]
        });

        let json = self.generate(&self.config.vision_model, body).await?;
        first_text(&json)
    }

    async fn research_history(&self, landmark_name: &str) -> Result<HistoryResult, GatewayError> {
        let body = serde_json::json!({
            "contents": [{
                "parts": [{ "text": self.prompts.history(landmark_name) }]
            }],
            "tools": [{ "googleSearch": {} }]
        });

        let json = self.generate(&self.config.research_model, body).await?;

        let history = first_text(&json)?;
        let citations = grounding_citations(&json);
        Ok(HistoryResult { history, citations })
    }

    async fn synthesize_speech(&self, history: &str) -> Result<String, GatewayError> {
        let body = serde_json::json!({
            "contents": [{
                "parts": [{ "text": self.prompts.narration(history) }]
            }],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": self.config.voice }
                    }
                }
            }
        });

        let json = self.generate(&self.config.tts_model, body).await?;

        let audio = json["candidates"][0]["content"]["parts"][0]["inlineData"]["data"]
            .as_str()
            .ok_or(GatewayError::EmptyResponse)?
            .to_string();

        if audio.is_empty() {
            return Err(GatewayError::EmptyResponse);
        }
        Ok(audio)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
