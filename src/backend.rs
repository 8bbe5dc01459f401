//! Remote image backend: the generation and upscale clients.
//!
//! [`ImageBackend`] is the seam between the orchestrator and the remote
//! service. The orchestrator only ever sees prompts in and
//! [`GeneratedImage`]s out, so tests substitute an in-memory backend and the
//! Gemini wire format stays confined to this module.
//!
//! ## Gemini request shape
//!
//! ```text
//! POST {base}/v1beta/models/{model}:generateContent
//! x-goog-api-key: …
//! {
//!   "contents": [{ "role": "user", "parts": [ {"text": …}, {"inlineData": {…}} ] }],
//!   "generationConfig": {
//!     "responseModalities": ["TEXT", "IMAGE"],
//!     "imageConfig": { "aspectRatio": "16:9", "imageSize": "1K" }
//!   }
//! }
//! ```
//!
//! The first `inlineData` part of the first candidate is the image. One
//! attempt per call; a failure is reported to the caller, never retried.

use crate::config::RunConfig;
use crate::error::{ApiError, SlideGenError};
use crate::output::{GeneratedImage, Tier};
use crate::pipeline::encode::{sniff_mime, InlineImage};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Default Gemini API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Generates and upscales slide images.
#[async_trait]
pub trait ImageBackend: Send + Sync {
    /// Render a draft-resolution image from `prompt`, with `assets` attached
    /// as reference images.
    async fn generate(
        &self,
        prompt: &str,
        assets: &[InlineImage],
    ) -> Result<GeneratedImage, ApiError>;

    /// Re-render `draft` at the high-resolution tier. `prompt` carries the
    /// slide's original description as context.
    async fn upscale(&self, draft: &InlineImage, prompt: &str) -> Result<GeneratedImage, ApiError>;
}

/// [`ImageBackend`] backed by the Gemini `generateContent` API.
pub struct GeminiBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    aspect_ratio: String,
    draft_size: String,
    upscale_size: String,
}

impl std::fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiBackend")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("aspect_ratio", &self.aspect_ratio)
            .field("draft_size", &self.draft_size)
            .field("upscale_size", &self.upscale_size)
            .finish()
    }
}

impl GeminiBackend {
    /// Build a backend with an explicit key.
    pub fn new(api_key: impl Into<String>, config: &RunConfig) -> Result<Self, SlideGenError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| SlideGenError::Http(e.to_string()))?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: config.model.clone(),
            aspect_ratio: config.aspect_ratio.clone(),
            draft_size: config.draft_size.clone(),
            upscale_size: config.upscale_size.clone(),
        })
    }

    /// Build a backend from the process environment.
    ///
    /// Reads `GEMINI_API_KEY`, falling back to `GOOGLE_API_KEY`, and honours
    /// `GEMINI_BASE_URL` for proxies and test servers.
    pub fn from_env(config: &RunConfig) -> Result<Self, SlideGenError> {
        let api_key = ["GEMINI_API_KEY", "GOOGLE_API_KEY"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|v| !v.trim().is_empty())
            .ok_or(SlideGenError::MissingCredential)?;

        let mut backend = Self::new(api_key, config)?;
        if let Ok(base) = std::env::var("GEMINI_BASE_URL") {
            if !base.trim().is_empty() {
                backend = backend.with_base_url(base);
            }
        }
        Ok(backend)
    }

    /// Point the backend at a different endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    async fn call(
        &self,
        text: &str,
        images: &[&InlineImage],
        image_size: &str,
        tier: Tier,
    ) -> Result<GeneratedImage, ApiError> {
        let mut parts = vec![Part::Text { text }];
        parts.extend(images.iter().map(|img| Part::InlineData {
            inline_data: Blob {
                mime_type: &img.mime_type,
                data: img.to_base64(),
            },
        }));

        let body = GenerateContentRequest {
            contents: vec![Content { role: "user", parts }],
            generation_config: GenerationConfig {
                response_modalities: ["TEXT", "IMAGE"],
                image_config: ImageConfig {
                    aspect_ratio: &self.aspect_ratio,
                    image_size,
                },
            },
        };

        info!(
            "Requesting {:?} image from {} ({} reference images)",
            tier,
            self.model,
            images.len()
        );

        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ApiError::Timeout
                } else {
                    ApiError::Transport(e.to_string())
                }
            })?;

        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: error_message(&bytes),
            });
        }

        let parsed: GenerateContentResponse =
            serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))?;
        extract_image(parsed, tier)
    }
}

#[async_trait]
impl ImageBackend for GeminiBackend {
    async fn generate(
        &self,
        prompt: &str,
        assets: &[InlineImage],
    ) -> Result<GeneratedImage, ApiError> {
        let images: Vec<&InlineImage> = assets.iter().collect();
        self.call(prompt, &images, &self.draft_size, Tier::Draft).await
    }

    async fn upscale(&self, draft: &InlineImage, prompt: &str) -> Result<GeneratedImage, ApiError> {
        self.call(prompt, &[draft], &self.upscale_size, Tier::Upscaled)
            .await
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: Blob<'a>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Blob<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_modalities: [&'static str; 2],
    image_config: ImageConfig<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig<'a> {
    aspect_ratio: &'a str,
    image_size: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    text: Option<String>,
    inline_data: Option<ResponseBlob>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseBlob {
    mime_type: Option<String>,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Finish reasons that mean the model refused to render.
const BLOCKING_FINISH_REASONS: [&str; 6] = [
    "SAFETY",
    "PROHIBITED_CONTENT",
    "BLOCKLIST",
    "SPII",
    "IMAGE_SAFETY",
    "RECITATION",
];

/// Pull the first inline image out of a response.
fn extract_image(resp: GenerateContentResponse, tier: Tier) -> Result<GeneratedImage, ApiError> {
    if let Some(reason) = resp.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ApiError::Blocked { reason });
    }

    let mut finish_reason = None;
    let mut model_text = Vec::new();

    for candidate in resp.candidates {
        if finish_reason.is_none() {
            finish_reason = candidate.finish_reason.clone();
        }
        let parts = candidate.content.map(|c| c.parts).unwrap_or_default();
        for part in parts {
            if let Some(blob) = part.inline_data {
                let data = STANDARD
                    .decode(blob.data.as_bytes())
                    .map_err(|e| ApiError::Decode(format!("invalid base64 image data: {e}")))?;
                let mime_type = sniff_mime(&data)
                    .map(str::to_string)
                    .or(blob.mime_type)
                    .unwrap_or_else(|| "image/png".to_string());
                debug!("Received {} image, {} bytes", mime_type, data.len());
                return Ok(GeneratedImage {
                    data,
                    mime_type,
                    tier,
                });
            }
            if let Some(text) = part.text {
                model_text.push(text);
            }
        }
    }

    if let Some(reason) = finish_reason
        .as_deref()
        .filter(|r| BLOCKING_FINISH_REASONS.contains(r))
    {
        return Err(ApiError::Blocked {
            reason: reason.to_string(),
        });
    }

    let detail = if model_text.is_empty() {
        finish_reason
            .map(|r| format!("finish reason {r}"))
            .unwrap_or_else(|| "empty response".to_string())
    } else {
        truncate(&model_text.join(" "), 200)
    };
    Err(ApiError::NoImage { detail })
}

/// Best-effort message from an error response body.
fn error_message(body: &[u8]) -> String {
    #[derive(Deserialize)]
    struct Envelope {
        error: ErrorBody,
    }
    #[derive(Deserialize)]
    struct ErrorBody {
        message: String,
    }

    match serde_json::from_slice::<Envelope>(body) {
        Ok(env) => env.error.message,
        Err(_) => truncate(String::from_utf8_lossy(body).trim(), 300),
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{cut}…")
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> GenerateContentResponse {
        serde_json::from_str(json).expect("valid response json")
    }

    #[test]
    fn extracts_first_inline_image() {
        let data = STANDARD.encode(b"\x89PNG\r\n\x1a\npixels");
        let resp = parse(&format!(
            r#"{{"candidates":[{{"content":{{"parts":[
                {{"text":"Here is your slide"}},
                {{"inlineData":{{"mimeType":"image/jpeg","data":"{data}"}}}}
            ]}},"finishReason":"STOP"}}]}}"#
        ));
        let img = extract_image(resp, Tier::Draft).expect("image");
        // Sniffed bytes win over the declared type.
        assert_eq!(img.mime_type, "image/png");
        assert_eq!(img.tier, Tier::Draft);
        assert!(img.data.starts_with(b"\x89PNG"));
    }

    #[test]
    fn prompt_block_is_reported() {
        let resp = parse(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#);
        let err = extract_image(resp, Tier::Draft).unwrap_err();
        assert!(matches!(err, ApiError::Blocked { ref reason } if reason == "SAFETY"));
    }

    #[test]
    fn safety_finish_is_blocked() {
        let resp = parse(r#"{"candidates":[{"finishReason":"IMAGE_SAFETY"}]}"#);
        let err = extract_image(resp, Tier::Upscaled).unwrap_err();
        assert!(matches!(err, ApiError::Blocked { .. }));
    }

    #[test]
    fn text_only_response_is_no_image() {
        let resp = parse(
            r#"{"candidates":[{"content":{"parts":[{"text":"I cannot draw that"}]},"finishReason":"STOP"}]}"#,
        );
        let err = extract_image(resp, Tier::Draft).unwrap_err();
        match err {
            ApiError::NoImage { detail } => assert!(detail.contains("cannot draw")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn empty_response_is_no_image() {
        let err = extract_image(parse("{}"), Tier::Draft).unwrap_err();
        assert!(matches!(err, ApiError::NoImage { .. }));
    }

    #[test]
    fn error_message_prefers_api_envelope() {
        let body = br#"{"error":{"code":403,"message":"API key not valid","status":"PERMISSION_DENIED"}}"#;
        assert_eq!(error_message(body), "API key not valid");
        assert_eq!(error_message(b"  upstream exploded "), "upstream exploded");
    }

    #[test]
    fn request_serialises_in_gemini_shape() {
        let img = InlineImage::new("qr.png", b"\x89PNG\r\n\x1a\n".to_vec());
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part::Text { text: "draw" },
                    Part::InlineData {
                        inline_data: Blob {
                            mime_type: &img.mime_type,
                            data: img.to_base64(),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_modalities: ["TEXT", "IMAGE"],
                image_config: ImageConfig {
                    aspect_ratio: "16:9",
                    image_size: "1K",
                },
            },
        };
        let v = serde_json::to_value(&body).expect("serialise");
        assert_eq!(v["contents"][0]["parts"][0]["text"], "draw");
        assert_eq!(
            v["contents"][0]["parts"][1]["inlineData"]["mimeType"],
            "image/png"
        );
        assert_eq!(v["generationConfig"]["imageConfig"]["imageSize"], "1K");
        assert_eq!(v["generationConfig"]["responseModalities"][1], "IMAGE");
    }

    #[test]
    fn debug_redacts_key() {
        let backend = GeminiBackend::new("secret-key", &RunConfig::default())
            .expect("client builds")
            .with_base_url("http://localhost:9999/");
        let dbg = format!("{backend:?}");
        assert!(!dbg.contains("secret-key"));
        assert_eq!(
            backend.endpoint(),
            "http://localhost:9999/v1beta/models/gemini-3-pro-image-preview:generateContent"
        );
    }
}
