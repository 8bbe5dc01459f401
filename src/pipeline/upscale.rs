//! Upscale stage: existing draft → high-resolution image on disk.

use crate::backend::ImageBackend;
use crate::error::SlideError;
use crate::outline::SlideSpec;
use crate::output::{SlideResult, Tier};
use crate::pipeline::encode::InlineImage;
use crate::pipeline::store::OutputStore;
use crate::prompts::upscale_prompt;
use std::time::Instant;
use tracing::{info, warn};

/// Upscale the draft of `slide`.
///
/// The draft is looked up on disk at call time; a slide that was never
/// drafted fails with [`SlideError::MissingDraft`].
pub async fn upscale_slide(
    backend: &dyn ImageBackend,
    slide: &SlideSpec,
    store: &OutputStore,
) -> SlideResult {
    let start = Instant::now();
    let elapsed = |start: Instant| start.elapsed().as_millis() as u64;

    let (draft_path, data) = match store.read_draft(slide.index).await {
        Ok(found) => found,
        Err(e) => {
            warn!("{}", e);
            return SlideResult::failed(slide.index, Tier::Upscaled, elapsed(start), e);
        }
    };

    let name = draft_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let draft = InlineImage::new(name, data);
    info!("Slide {}: upscaling {}", slide.index, draft_path.display());

    let image = match backend
        .upscale(&draft, &upscale_prompt(&slide.prompt))
        .await
    {
        Ok(image) => image,
        Err(e) => {
            let err = SlideError::Api {
                slide: slide.index,
                detail: e.to_string(),
            };
            warn!("{}", err);
            return SlideResult::failed(slide.index, Tier::Upscaled, elapsed(start), err);
        }
    };

    match store.write(slide.index, Tier::Upscaled, &image).await {
        Ok(path) => {
            info!(
                "Slide {}: upscaled image written to {} in {}ms",
                slide.index,
                path.display(),
                elapsed(start)
            );
            SlideResult {
                slide: slide.index,
                tier: Tier::Upscaled,
                output_path: Some(path),
                bytes: image.data.len(),
                duration_ms: elapsed(start),
                error: None,
            }
        }
        Err(e) => {
            warn!("{}", e);
            SlideResult::failed(slide.index, Tier::Upscaled, elapsed(start), e)
        }
    }
}
