//! Run results: generated images, per-slide outcomes, and the run summary.

use crate::config::RunMode;
use crate::error::{SlideError, SlideGenError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Resolution tier of a generated image. Part of the output file key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Draft resolution (`1K` by default).
    Draft,
    /// High resolution produced by upscale mode (`4K` by default).
    Upscaled,
}

impl Tier {
    /// Filename suffix after `slide_NN`.
    pub fn suffix(self) -> &'static str {
        match self {
            Tier::Draft => "",
            Tier::Upscaled => "_4k",
        }
    }
}

impl From<RunMode> for Tier {
    fn from(mode: RunMode) -> Self {
        match mode {
            RunMode::Draft => Tier::Draft,
            RunMode::Upscale => Tier::Upscaled,
        }
    }
}

/// Image bytes returned by the model. Written to disk, then dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub data: Vec<u8>,
    pub mime_type: String,
    pub tier: Tier,
}

/// Outcome of processing one slide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlideResult {
    /// 1-based slide index.
    pub slide: usize,
    pub tier: Tier,
    /// Written file, when the slide succeeded.
    pub output_path: Option<PathBuf>,
    /// Size of the written image in bytes (0 on failure).
    pub bytes: usize,
    /// Wall-clock time spent on this slide.
    pub duration_ms: u64,
    /// Why the slide was skipped, if it was.
    pub error: Option<SlideError>,
}

impl SlideResult {
    pub(crate) fn failed(slide: usize, tier: Tier, duration_ms: u64, error: SlideError) -> Self {
        Self {
            slide,
            tier,
            output_path: None,
            bytes: 0,
            duration_ms,
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Everything a run did, in outline order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub mode: RunMode,
    /// One entry per processed slide.
    pub slides: Vec<SlideResult>,
    /// Indices passed in the selection that the outline does not define.
    pub unknown_indices: Vec<usize>,
    pub succeeded: usize,
    pub failed: usize,
    pub total_duration_ms: u64,
}

impl RunSummary {
    /// Errors of every skipped slide, in outline order.
    pub fn failures(&self) -> impl Iterator<Item = &SlideError> {
        self.slides.iter().filter_map(|s| s.error.as_ref())
    }

    /// Treat any slide failure as an error.
    pub fn into_result(self) -> Result<Self, SlideGenError> {
        if self.failed > 0 {
            Err(SlideGenError::PartialFailure {
                success: self.succeeded,
                failed: self.failed,
                total: self.slides.len(),
            })
        } else {
            Ok(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(results: Vec<SlideResult>) -> RunSummary {
        let failed = results.iter().filter(|r| !r.is_ok()).count();
        RunSummary {
            mode: RunMode::Draft,
            succeeded: results.len() - failed,
            failed,
            slides: results,
            unknown_indices: vec![],
            total_duration_ms: 0,
        }
    }

    #[test]
    fn into_result_flags_failures() {
        let ok = SlideResult {
            slide: 1,
            tier: Tier::Draft,
            output_path: Some(PathBuf::from("out/slide_01.png")),
            bytes: 10,
            duration_ms: 5,
            error: None,
        };
        let bad = SlideResult::failed(
            2,
            Tier::Draft,
            3,
            SlideError::Api {
                slide: 2,
                detail: "HTTP 500".into(),
            },
        );

        assert!(summary(vec![ok.clone()]).into_result().is_ok());

        let s = summary(vec![ok, bad]);
        assert_eq!(s.failures().count(), 1);
        let err = s.into_result().unwrap_err();
        assert!(err.to_string().contains("1/2"));
    }

    #[test]
    fn tier_suffixes() {
        assert_eq!(Tier::Draft.suffix(), "");
        assert_eq!(Tier::Upscaled.suffix(), "_4k");
        assert_eq!(Tier::from(RunMode::Upscale), Tier::Upscaled);
    }

    #[test]
    fn summary_serialises() {
        let s = summary(vec![]);
        let json = serde_json::to_string(&s).expect("serialise");
        assert!(json.contains("\"mode\":\"draft\""));
    }
}
