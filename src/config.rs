//! Run configuration.
//!
//! Every knob of a run lives in [`RunConfig`], built once at startup via
//! [`RunConfigBuilder`] and passed by reference into the orchestrator. There
//! are no global flags; two runs with equal configs behave identically.

use crate::error::SlideGenError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Default Gemini image model.
pub const DEFAULT_MODEL: &str = "gemini-3-pro-image-preview";

/// Configuration for one slidegen run.
///
/// # Example
/// ```rust
/// use slidegen::{RunConfig, RunMode, SlideSelection};
///
/// let config = RunConfig::builder()
///     .outline("deck/outline_visual.md")
///     .mode(RunMode::Upscale)
///     .slides(SlideSelection::from_indices([5, 2]))
///     .build()
///     .unwrap();
/// assert_eq!(config.selection.to_indices(&[1, 2, 3, 4, 5]), vec![2, 5]);
/// ```
#[derive(Clone)]
pub struct RunConfig {
    /// Draft generation or upscaling. Default: [`RunMode::Draft`].
    pub mode: RunMode,

    /// Which slides to process. Default: all.
    pub selection: SlideSelection,

    /// Markdown outline. Default: `outline_visual.md`.
    pub outline_path: PathBuf,

    /// Optional visual guideline document prepended to every draft prompt.
    pub guideline_path: Option<PathBuf>,

    /// Directory receiving generated images. Default: `generated_slides`.
    pub output_dir: PathBuf,

    /// Base directory for relative asset paths.
    ///
    /// If None, asset paths resolve against the outline's directory.
    pub asset_root: Option<PathBuf>,

    /// Image model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Requested aspect ratio. Default: `16:9`.
    pub aspect_ratio: String,

    /// Image size requested in draft mode. Default: `1K`.
    pub draft_size: String,

    /// Image size requested in upscale mode. Default: `4K`.
    pub upscale_size: String,

    /// Per-request HTTP timeout in seconds. Default: 300.
    ///
    /// High-resolution image generation routinely takes over a minute.
    pub api_timeout_secs: u64,

    /// Optional per-slide progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::default(),
            selection: SlideSelection::default(),
            outline_path: PathBuf::from("outline_visual.md"),
            guideline_path: None,
            output_dir: PathBuf::from("generated_slides"),
            asset_root: None,
            model: DEFAULT_MODEL.to_string(),
            aspect_ratio: "16:9".to_string(),
            draft_size: "1K".to_string(),
            upscale_size: "4K".to_string(),
            api_timeout_secs: 300,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("mode", &self.mode)
            .field("selection", &self.selection)
            .field("outline_path", &self.outline_path)
            .field("guideline_path", &self.guideline_path)
            .field("output_dir", &self.output_dir)
            .field("asset_root", &self.asset_root)
            .field("model", &self.model)
            .field("aspect_ratio", &self.aspect_ratio)
            .field("draft_size", &self.draft_size)
            .field("upscale_size", &self.upscale_size)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn RunProgressCallback>"),
            )
            .finish()
    }
}

impl RunConfig {
    /// Create a new builder for `RunConfig`.
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder {
            config: Self::default(),
        }
    }

    /// Directory that relative asset paths are resolved against.
    pub fn resolved_asset_root(&self) -> PathBuf {
        match &self.asset_root {
            Some(root) => root.clone(),
            None => self
                .outline_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        }
    }

    /// Image size requested for the configured mode.
    pub fn image_size(&self) -> &str {
        match self.mode {
            RunMode::Draft => &self.draft_size,
            RunMode::Upscale => &self.upscale_size,
        }
    }
}

/// Builder for [`RunConfig`].
#[derive(Debug)]
pub struct RunConfigBuilder {
    config: RunConfig,
}

impl RunConfigBuilder {
    pub fn mode(mut self, mode: RunMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn slides(mut self, selection: SlideSelection) -> Self {
        self.config.selection = selection;
        self
    }

    pub fn outline(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.outline_path = path.into();
        self
    }

    pub fn guideline(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.guideline_path = Some(path.into());
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn asset_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.asset_root = Some(dir.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn aspect_ratio(mut self, ratio: impl Into<String>) -> Self {
        self.config.aspect_ratio = ratio.into();
        self
    }

    pub fn draft_size(mut self, size: impl Into<String>) -> Self {
        self.config.draft_size = size.into();
        self
    }

    pub fn upscale_size(mut self, size: impl Into<String>) -> Self {
        self.config.upscale_size = size.into();
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RunConfig, SlideGenError> {
        let c = &self.config;
        if let SlideSelection::Only(indices) = &c.selection {
            if indices.is_empty() {
                return Err(SlideGenError::InvalidConfig(
                    "Slide selection must name at least one slide".into(),
                ));
            }
            if indices.contains(&0) {
                return Err(SlideGenError::InvalidConfig(
                    "Slides are 1-indexed, minimum is 1 (got 0)".into(),
                ));
            }
        }
        if c.model.trim().is_empty() {
            return Err(SlideGenError::InvalidConfig("Model must not be empty".into()));
        }
        if c.api_timeout_secs == 0 {
            return Err(SlideGenError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if !is_valid_aspect_ratio(&c.aspect_ratio) {
            return Err(SlideGenError::InvalidConfig(format!(
                "Aspect ratio must look like W:H, got '{}'",
                c.aspect_ratio
            )));
        }
        Ok(self.config)
    }
}

fn is_valid_aspect_ratio(s: &str) -> bool {
    match s.split_once(':') {
        Some((w, h)) => {
            matches!(w.parse::<u32>(), Ok(n) if n > 0) && matches!(h.parse::<u32>(), Ok(n) if n > 0)
        }
        None => false,
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// What a run does with each selected slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Generate draft-resolution images from the outline prompts. (default)
    #[default]
    Draft,
    /// Upscale existing drafts to the high-resolution tier.
    Upscale,
}

/// Which slides of the outline to process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlideSelection {
    /// Every slide in the outline (default).
    #[default]
    All,
    /// Only these 1-based indices. Stored sorted and deduplicated.
    Only(BTreeSet<usize>),
}

impl SlideSelection {
    /// Build a selection from indices in any order.
    pub fn from_indices(indices: impl IntoIterator<Item = usize>) -> Self {
        SlideSelection::Only(indices.into_iter().collect())
    }

    /// Whether `index` is selected.
    pub fn contains(&self, index: usize) -> bool {
        match self {
            SlideSelection::All => true,
            SlideSelection::Only(set) => set.contains(&index),
        }
    }

    /// Filter the outline's indices down to the selected ones, in outline order.
    pub fn to_indices(&self, available: &[usize]) -> Vec<usize> {
        available
            .iter()
            .copied()
            .filter(|&i| self.contains(i))
            .collect()
    }

    /// Selected indices that do not appear in the outline.
    pub fn unknown_indices(&self, available: &[usize]) -> Vec<usize> {
        match self {
            SlideSelection::All => Vec::new(),
            SlideSelection::Only(set) => set
                .iter()
                .copied()
                .filter(|i| !available.contains(i))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = RunConfig::default();
        assert_eq!(c.mode, RunMode::Draft);
        assert_eq!(c.selection, SlideSelection::All);
        assert_eq!(c.image_size(), "1K");
        assert_eq!(c.aspect_ratio, "16:9");
    }

    #[test]
    fn upscale_uses_upscale_size() {
        let c = RunConfig::builder()
            .mode(RunMode::Upscale)
            .build()
            .expect("valid config");
        assert_eq!(c.image_size(), "4K");
    }

    #[test]
    fn selection_follows_outline_order() {
        let sel = SlideSelection::from_indices([5, 2]);
        assert_eq!(sel.to_indices(&[1, 2, 3, 4, 5, 6]), vec![2, 5]);
    }

    #[test]
    fn selection_reports_unknown() {
        let sel = SlideSelection::from_indices([2, 9]);
        assert_eq!(sel.unknown_indices(&[1, 2, 3]), vec![9]);
        assert!(SlideSelection::All.unknown_indices(&[1]).is_empty());
    }

    #[test]
    fn rejects_zero_index() {
        let err = RunConfig::builder()
            .slides(SlideSelection::from_indices([0, 3]))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("1-indexed"));
    }

    #[test]
    fn rejects_empty_selection() {
        let err = RunConfig::builder()
            .slides(SlideSelection::Only(BTreeSet::new()))
            .build()
            .unwrap_err();
        assert!(matches!(err, SlideGenError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_bad_aspect_ratio() {
        assert!(RunConfig::builder().aspect_ratio("wide").build().is_err());
        assert!(RunConfig::builder().aspect_ratio("0:9").build().is_err());
        assert!(RunConfig::builder().aspect_ratio("4:3").build().is_ok());
    }

    #[test]
    fn asset_root_defaults_to_outline_dir() {
        let c = RunConfig::builder()
            .outline("deck/outline.md")
            .build()
            .expect("valid config");
        assert_eq!(c.resolved_asset_root(), PathBuf::from("deck"));

        let c = RunConfig::builder()
            .outline("deck/outline.md")
            .asset_root("/srv/assets")
            .build()
            .expect("valid config");
        assert_eq!(c.resolved_asset_root(), PathBuf::from("/srv/assets"));
    }
}
