//! Draft stage: one slide → one draft image on disk.
//!
//! Like every per-slide stage this never returns `Err`: failures are folded
//! into the [`SlideResult`] so one bad slide cannot abort the batch.

use crate::backend::ImageBackend;
use crate::error::SlideError;
use crate::outline::SlideSpec;
use crate::output::{SlideResult, Tier};
use crate::pipeline::assets::load_assets;
use crate::pipeline::store::OutputStore;
use crate::prompts::draft_prompt;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Generate and write the draft image for `slide`.
///
/// Any previous draft for the same index is replaced.
pub async fn draft_slide(
    backend: &dyn ImageBackend,
    slide: &SlideSpec,
    guideline: Option<&str>,
    asset_root: &Path,
    store: &OutputStore,
) -> SlideResult {
    let start = Instant::now();
    let elapsed = |start: Instant| start.elapsed().as_millis() as u64;

    let assets = match load_assets(slide, asset_root).await {
        Ok(assets) => assets,
        Err(e) => {
            warn!("{}", e);
            return SlideResult::failed(slide.index, Tier::Draft, elapsed(start), e);
        }
    };

    let asset_names: Vec<String> = assets.iter().map(|a| a.name.clone()).collect();
    let prompt = draft_prompt(slide, guideline, &asset_names);
    debug!("Slide {}: prompt is {} chars", slide.index, prompt.len());

    let image = match backend.generate(&prompt, &assets).await {
        Ok(image) => image,
        Err(e) => {
            let err = SlideError::Api {
                slide: slide.index,
                detail: e.to_string(),
            };
            warn!("{}", err);
            return SlideResult::failed(slide.index, Tier::Draft, elapsed(start), err);
        }
    };

    match store.write(slide.index, Tier::Draft, &image).await {
        Ok(path) => {
            info!(
                "Slide {}: draft written to {} in {}ms",
                slide.index,
                path.display(),
                elapsed(start)
            );
            SlideResult {
                slide: slide.index,
                tier: Tier::Draft,
                output_path: Some(path),
                bytes: image.data.len(),
                duration_ms: elapsed(start),
                error: None,
            }
        }
        Err(e) => {
            warn!("{}", e);
            SlideResult::failed(slide.index, Tier::Draft, elapsed(start), e)
        }
    }
}
