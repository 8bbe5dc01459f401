//! # slidegen
//!
//! Render a slide deck from a markdown outline with a generative image model.
//!
//! Each `#### Slide N: Title` section of the outline becomes one image. A
//! first pass renders fast drafts; once a draft looks right, a second pass
//! upscales it to presentation resolution. Output files are keyed by slide
//! number, so re-running a single slide replaces exactly one file.
//!
//! ## Pipeline Overview
//!
//! ```text
//! outline.md
//!  │
//!  ├─ 1. Parse    slide headings → SlideSpec { index, title, prompt, assets }
//!  ├─ 2. Select   --slides filter, applied in outline order
//!  ├─ 3. Render   draft:   prompt + reference images → 1K image
//!  │              upscale: existing draft + prompt   → 4K image
//!  └─ 4. Store    generated_slides/slide_NN.png, slide_NN_4k.png
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use slidegen::{run, RunConfig, SlideSelection};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads GEMINI_API_KEY from the environment.
//!     let config = RunConfig::builder()
//!         .outline("outline_visual.md")
//!         .slides(SlideSelection::from_indices([2, 5]))
//!         .build()?;
//!     let summary = run(&config).await?;
//!     for err in summary.failures() {
//!         eprintln!("skipped: {err}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `slidegen` binary (clap + anyhow + tracing-subscriber + dotenvy) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod config;
pub mod error;
pub mod outline;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod run;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{GeminiBackend, ImageBackend};
pub use config::{RunConfig, RunConfigBuilder, RunMode, SlideSelection};
pub use error::{ApiError, ParseError, SlideError, SlideGenError};
pub use outline::{load_outline, parse_outline, SlideSpec};
pub use output::{GeneratedImage, RunSummary, SlideResult, Tier};
pub use pipeline::encode::InlineImage;
pub use pipeline::store::OutputStore;
pub use progress::{NoopProgressCallback, ProgressCallback, RunProgressCallback};
pub use run::{list_slides, run, run_with_backend};
