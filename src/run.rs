//! Orchestrator: outline → selected slides → images on disk.
//!
//! Slides are processed one at a time in outline order. Each remote call is
//! awaited before the next slide starts.

use crate::backend::{GeminiBackend, ImageBackend};
use crate::config::{RunConfig, RunMode};
use crate::error::SlideGenError;
use crate::outline::{load_outline, SlideSpec};
use crate::output::{RunSummary, SlideResult, Tier};
use crate::pipeline::draft::draft_slide;
use crate::pipeline::store::OutputStore;
use crate::pipeline::upscale::upscale_slide;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Run the configured mode against the Gemini API.
///
/// The outline is parsed before the credential is read, so a malformed
/// outline is reported even without an API key.
///
/// # Errors
/// Returns `Err(SlideGenError)` only for fatal errors: outline missing or
/// malformed, no slides, missing credential, unwritable output directory.
/// Per-slide failures are reported in the returned [`RunSummary`].
pub async fn run(config: &RunConfig) -> Result<RunSummary, SlideGenError> {
    let slides = load_slides(config).await?;
    let backend = GeminiBackend::from_env(config)?;
    execute(config, &slides, &backend).await
}

/// Run the configured mode against a caller-supplied backend.
pub async fn run_with_backend(
    config: &RunConfig,
    backend: &dyn ImageBackend,
) -> Result<RunSummary, SlideGenError> {
    let slides = load_slides(config).await?;
    execute(config, &slides, backend).await
}

/// Parse the outline and return the selected slides, without any API call.
pub async fn list_slides(config: &RunConfig) -> Result<Vec<SlideSpec>, SlideGenError> {
    let slides = load_slides(config).await?;
    Ok(slides
        .into_iter()
        .filter(|s| config.selection.contains(s.index))
        .collect())
}

async fn load_slides(config: &RunConfig) -> Result<Vec<SlideSpec>, SlideGenError> {
    let slides = load_outline(&config.outline_path).await?;
    if slides.is_empty() {
        return Err(SlideGenError::EmptyOutline {
            path: config.outline_path.clone(),
        });
    }
    info!(
        "Outline {} has {} slides",
        config.outline_path.display(),
        slides.len()
    );
    Ok(slides)
}

async fn load_guideline(config: &RunConfig) -> Result<Option<String>, SlideGenError> {
    let Some(path) = config.guideline_path.as_ref() else {
        return Ok(None);
    };
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SlideGenError::GuidelineRead {
            path: path.clone(),
            source: e,
        })?;
    debug!("Loaded guideline {} ({} chars)", path.display(), text.len());
    Ok(Some(text))
}

async fn execute(
    config: &RunConfig,
    slides: &[SlideSpec],
    backend: &dyn ImageBackend,
) -> Result<RunSummary, SlideGenError> {
    let total_start = Instant::now();

    let available: Vec<usize> = slides.iter().map(|s| s.index).collect();
    let unknown = config.selection.unknown_indices(&available);
    for index in &unknown {
        warn!("Slide {} is not in the outline; skipping", index);
    }

    let selected: Vec<&SlideSpec> = config
        .selection
        .to_indices(&available)
        .into_iter()
        .filter_map(|index| slides.iter().find(|s| s.index == index))
        .collect();

    let store = OutputStore::new(&config.output_dir);
    store.ensure_dir().await?;

    let guideline = match config.mode {
        RunMode::Draft => load_guideline(config).await?,
        RunMode::Upscale => None,
    };
    let asset_root = config.resolved_asset_root();

    let tier = Tier::from(config.mode);
    info!(
        "Starting {:?} run over {} slides → {} ({:?} files)",
        config.mode,
        selected.len(),
        store.dir().display(),
        tier
    );

    let total = selected.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(total);
    }

    let mut results: Vec<SlideResult> = Vec::with_capacity(total);
    for slide in selected {
        if let Some(ref cb) = config.progress_callback {
            cb.on_slide_start(slide.index, total);
        }

        let result = match config.mode {
            RunMode::Draft => {
                draft_slide(backend, slide, guideline.as_deref(), &asset_root, &store).await
            }
            RunMode::Upscale => upscale_slide(backend, slide, &store).await,
        };

        if let Some(ref cb) = config.progress_callback {
            match &result.error {
                None => cb.on_slide_complete(slide.index, total, result.bytes),
                Some(e) => cb.on_slide_error(slide.index, total, &e.to_string()),
            }
        }
        results.push(result);
    }

    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    let failed = results.len() - succeeded;

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(total, succeeded);
    }

    let summary = RunSummary {
        mode: config.mode,
        slides: results,
        unknown_indices: unknown,
        succeeded,
        failed,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Run complete: {}/{} slides, {}ms total",
        succeeded, total, summary.total_duration_ms
    );
    for err in summary.failures() {
        warn!("Skipped: {}", err);
    }

    Ok(summary)
}
