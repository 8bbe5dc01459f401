//! Output store: deterministic image paths under the output directory.
//!
//! The store is the only persisted state. A file is keyed by
//! `(slide index, tier)`:
//!
//! ```text
//! generated_slides/slide_02.png      draft
//! generated_slides/slide_02_4k.png   upscaled
//! ```
//!
//! The extension follows the MIME type the model returned, so lookups check
//! every known extension, and a write removes a same-key file with a
//! different extension to keep one file per key. Lookups always hit the
//! filesystem: drafts may be added or deleted by hand between runs.

use crate::error::{SlideError, SlideGenError};
use crate::output::{GeneratedImage, Tier};
use crate::pipeline::encode::extension_for_mime;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Extensions recognised when looking up an existing file.
const KNOWN_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "webp", "gif"];

/// Image files of one run, rooted at the output directory.
#[derive(Debug, Clone)]
pub struct OutputStore {
    dir: PathBuf,
}

impl OutputStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the output directory if missing.
    pub async fn ensure_dir(&self) -> Result<(), SlideGenError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| SlideGenError::OutputDir {
                path: self.dir.clone(),
                source: e,
            })
    }

    /// File name without extension, e.g. `slide_02_4k`.
    pub fn file_stem(index: usize, tier: Tier) -> String {
        format!("slide_{:02}{}", index, tier.suffix())
    }

    /// Target path for an image of the given MIME type.
    pub fn path_for(&self, index: usize, tier: Tier, mime_type: &str) -> PathBuf {
        self.dir.join(format!(
            "{}.{}",
            Self::file_stem(index, tier),
            extension_for_mime(mime_type)
        ))
    }

    /// Existing file for `(index, tier)`, if any.
    pub fn find(&self, index: usize, tier: Tier) -> Option<PathBuf> {
        let stem = Self::file_stem(index, tier);
        KNOWN_EXTENSIONS
            .iter()
            .map(|ext| self.dir.join(format!("{stem}.{ext}")))
            .find(|p| p.is_file())
    }

    /// Whether an image for `(index, tier)` exists on disk right now.
    pub fn exists(&self, index: usize, tier: Tier) -> bool {
        self.find(index, tier).is_some()
    }

    /// Read the existing draft of a slide.
    pub async fn read_draft(&self, index: usize) -> Result<(PathBuf, Vec<u8>), SlideError> {
        let path = self
            .find(index, Tier::Draft)
            .ok_or_else(|| SlideError::MissingDraft {
                slide: index,
                dir: self.dir.clone(),
            })?;
        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| SlideError::ReadFailed {
                slide: index,
                path: path.clone(),
                detail: e.to_string(),
            })?;
        Ok((path, data))
    }

    /// Write an image as `(index, tier)`, replacing any earlier file for the
    /// same key.
    ///
    /// The caller's `tier` decides the path; the tier the backend put on
    /// `image` is only checked. Uses atomic write (temp file + rename) so an
    /// interrupted run never leaves a truncated image behind.
    pub async fn write(
        &self,
        index: usize,
        tier: Tier,
        image: &GeneratedImage,
    ) -> Result<PathBuf, SlideError> {
        if image.tier != tier {
            warn!(
                "Slide {}: backend labelled a {:?} image as {:?}; storing as {:?}",
                index, tier, image.tier, tier
            );
        }
        let path = self.path_for(index, tier, &image.mime_type);
        let write_err = |e: std::io::Error| SlideError::WriteFailed {
            slide: index,
            path: path.clone(),
            detail: e.to_string(),
        };

        // Temp file lives in the output dir so the final rename stays on one filesystem.
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir).map_err(write_err)?;
        tmp.write_all(&image.data).map_err(write_err)?;
        tmp.persist(&path).map_err(|e| write_err(e.error))?;

        let stem = Self::file_stem(index, tier);
        for ext in KNOWN_EXTENSIONS {
            let other = self.dir.join(format!("{stem}.{ext}"));
            if other != path && other.is_file() {
                if let Err(e) = tokio::fs::remove_file(&other).await {
                    warn!("Could not remove stale {}: {}", other.display(), e);
                } else {
                    debug!("Replaced {} with {}", other.display(), path.display());
                }
            }
        }

        debug!("Wrote {} ({} bytes)", path.display(), image.data.len());
        Ok(path)
    }
}
