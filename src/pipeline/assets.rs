//! Asset resolution: outline-relative paths → loaded [`InlineImage`]s.
//!
//! A missing asset fails the whole slide; it is never silently dropped.

use crate::error::SlideError;
use crate::outline::SlideSpec;
use crate::pipeline::encode::InlineImage;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolve `asset` against `root` unless it is already absolute.
pub fn resolve_asset_path(root: &Path, asset: &str) -> PathBuf {
    let p = Path::new(asset);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        root.join(p)
    }
}

/// Load every asset of `slide`, in outline order.
pub async fn load_assets(slide: &SlideSpec, root: &Path) -> Result<Vec<InlineImage>, SlideError> {
    let mut images = Vec::with_capacity(slide.asset_paths.len());

    for asset in &slide.asset_paths {
        let path = resolve_asset_path(root, asset);
        if !path.is_file() {
            return Err(SlideError::AssetNotFound {
                slide: slide.index,
                path,
            });
        }

        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| SlideError::ReadFailed {
                slide: slide.index,
                path: path.clone(),
                detail: e.to_string(),
            })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| asset.clone());
        let image = InlineImage::new(name, data);
        debug!(
            "Slide {}: using asset {} ({}, {} bytes)",
            slide.index,
            path.display(),
            image.mime_type,
            image.data.len()
        );
        images.push(image);
    }

    Ok(images)
}
