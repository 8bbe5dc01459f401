//! Error types for the slidegen library.
//!
//! Four error types reflect the distinct failure modes:
//!
//! * [`SlideGenError`]: **fatal**. The run cannot proceed at all (outline
//!   missing or malformed, credential absent, output directory unwritable).
//!   Returned as `Err(SlideGenError)` from [`crate::run::run`].
//!
//! * [`ParseError`]: a malformed outline line. Always fatal; a partially
//!   parsed outline would renumber slides, so it is wrapped in
//!   [`SlideGenError::Parse`] and aborts the run.
//!
//! * [`ApiError`]: one failed call to the image service. The pipeline
//!   stages turn it into [`SlideError::Api`] for the slide concerned.
//!
//! * [`SlideError`]: **non-fatal**. A single slide failed but every other
//!   slide is unaffected. Stored inside [`crate::output::SlideResult`] and
//!   reported in the run summary.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the slidegen library.
#[derive(Debug, Error)]
pub enum SlideGenError {
    // ── Outline errors ────────────────────────────────────────────────────
    /// Outline file was not found at the given path.
    #[error("Outline not found: '{path}'\nPass --outline <FILE> or create outline_visual.md.")]
    OutlineNotFound { path: PathBuf },

    /// Outline file exists but could not be read.
    #[error("Failed to read outline '{path}': {source}")]
    OutlineRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A slide heading could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The outline parsed cleanly but contains no slide headings.
    #[error("Outline '{path}' contains no slide headings (expected e.g. '#### Slide 1: Title')")]
    EmptyOutline { path: PathBuf },

    // ── Remote API errors ─────────────────────────────────────────────────
    /// No API key in the environment.
    #[error("Missing API credential.\nSet GEMINI_API_KEY (or GOOGLE_API_KEY) in the environment or in .env.")]
    MissingCredential,

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Http(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create the output directory.
    #[error("Failed to create output directory '{path}': {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not read the visual guideline document.
    #[error("Failed to read guideline '{path}': {source}")]
    GuidelineRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Some slides succeeded but at least one failed.
    ///
    /// Returned by [`crate::output::RunSummary::into_result`] when the
    /// caller wants to treat any slide failure as an error.
    #[error("{failed}/{total} slides failed")]
    PartialFailure {
        success: usize,
        failed: usize,
        total: usize,
    },
}

/// A malformed slide heading in the outline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Outline line {line}: {reason}\n    {content}")]
pub struct ParseError {
    /// 1-based line number of the offending line.
    pub line: usize,
    /// The offending line, verbatim.
    pub content: String,
    pub reason: String,
}

/// A failed call to the remote image API.
///
/// Converted to [`SlideError::Api`] by the orchestrator; never fatal.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Network-level failure (DNS, TLS, connection reset).
    #[error("request failed: {0}")]
    Transport(String),

    /// The HTTP client's timeout elapsed.
    #[error("request timed out")]
    Timeout,

    /// Non-success HTTP status (auth, quota, server error).
    #[error("HTTP {status}: {message}{}", status_hint(.status))]
    Status { status: u16, message: String },

    /// The service refused the prompt or the rendered image.
    #[error("blocked by content policy ({reason})")]
    Blocked { reason: String },

    /// The response parsed but carried no image data.
    #[error("response contained no image: {detail}")]
    NoImage { detail: String },

    /// The response body was not the expected JSON.
    #[error("malformed response: {0}")]
    Decode(String),
}

fn status_hint(status: &u16) -> &'static str {
    match status {
        401 | 403 => " (check GEMINI_API_KEY)",
        429 => " (quota or rate limit; re-run these slides later)",
        _ => "",
    }
}

/// A non-fatal error for a single slide.
///
/// The run continues with the next slide; every `SlideError` appears in the
/// run summary.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum SlideError {
    /// The remote image API call failed.
    #[error("Slide {slide}: API call failed: {detail}")]
    Api { slide: usize, detail: String },

    /// Upscale was requested but no draft exists yet.
    #[error("Slide {slide}: no draft found in '{dir}' (run draft mode first)")]
    MissingDraft { slide: usize, dir: PathBuf },

    /// A referenced asset file does not exist.
    #[error("Slide {slide}: asset not found: '{path}'")]
    AssetNotFound { slide: usize, path: PathBuf },

    /// An asset or draft file exists but could not be read.
    #[error("Slide {slide}: failed to read '{path}': {detail}")]
    ReadFailed {
        slide: usize,
        path: PathBuf,
        detail: String,
    },

    /// The generated image could not be written.
    #[error("Slide {slide}: failed to write '{path}': {detail}")]
    WriteFailed {
        slide: usize,
        path: PathBuf,
        detail: String,
    },
}

impl SlideError {
    /// The 1-based slide index this error belongs to.
    pub fn slide(&self) -> usize {
        match self {
            SlideError::Api { slide, .. }
            | SlideError::MissingDraft { slide, .. }
            | SlideError::AssetNotFound { slide, .. }
            | SlideError::ReadFailed { slide, .. }
            | SlideError::WriteFailed { slide, .. } => *slide,
        }
    }
}
