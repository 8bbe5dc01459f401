//! Progress-callback trait for per-slide run events.
//!
//! Inject an [`Arc<dyn RunProgressCallback>`] via
//! [`crate::config::RunConfigBuilder::progress_callback`] to receive events
//! as the orchestrator works through the selected slides. The CLI uses this
//! to drive its progress bar; library callers can forward events anywhere.
//!
//! # Example
//!
//! ```rust
//! use slidegen::{RunConfig, RunProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: Arc<AtomicUsize>,
//! }
//!
//! impl RunProgressCallback for CountingCallback {
//!     fn on_slide_complete(&self, slide: usize, total: usize, bytes: usize) {
//!         let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("Slide {slide} done ({done}/{total}, {bytes} bytes)");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     completed: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = RunConfig::builder()
//!     .progress_callback(counter as Arc<dyn RunProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the orchestrator as it processes each slide.
///
/// Slides are processed one at a time, so events arrive in outline order.
/// All methods have default no-op implementations.
pub trait RunProgressCallback: Send + Sync {
    /// Called once before the first slide.
    ///
    /// # Arguments
    /// * `total_slides`: number of slides that will be processed
    fn on_run_start(&self, total_slides: usize) {
        let _ = total_slides;
    }

    /// Called just before the API request for a slide is sent.
    fn on_slide_start(&self, slide: usize, total_slides: usize) {
        let _ = (slide, total_slides);
    }

    /// Called when a slide's image was written.
    ///
    /// # Arguments
    /// * `slide`       : 1-based slide index
    /// * `total_slides`: slides in this run
    /// * `bytes`       : size of the written image
    fn on_slide_complete(&self, slide: usize, total_slides: usize, bytes: usize) {
        let _ = (slide, total_slides, bytes);
    }

    /// Called when a slide was skipped because of a [`crate::error::SlideError`].
    fn on_slide_error(&self, slide: usize, total_slides: usize, error: &str) {
        let _ = (slide, total_slides, error);
    }

    /// Called once after every selected slide has been attempted.
    fn on_run_complete(&self, total_slides: usize, success_count: usize) {
        let _ = (total_slides, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl RunProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::RunConfig`].
pub type ProgressCallback = Arc<dyn RunProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        run_total: AtomicUsize,
        successes: AtomicUsize,
    }

    impl RunProgressCallback for TrackingCallback {
        fn on_run_start(&self, total_slides: usize) {
            self.run_total.store(total_slides, Ordering::SeqCst);
        }

        fn on_slide_start(&self, _slide: usize, _total: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_slide_complete(&self, _slide: usize, _total: usize, _bytes: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_slide_error(&self, _slide: usize, _total: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_run_complete(&self, _total: usize, success_count: usize) {
            self.successes.store(success_count, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_run_start(5);
        cb.on_slide_start(1, 5);
        cb.on_slide_complete(1, 5, 42);
        cb.on_slide_error(2, 5, "no draft");
        cb.on_run_complete(5, 4);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_run_start(3);
        tracker.on_slide_start(1, 3);
        tracker.on_slide_complete(1, 3, 100);
        tracker.on_slide_start(2, 3);
        tracker.on_slide_error(2, 3, "HTTP 429");
        tracker.on_run_complete(3, 1);

        assert_eq!(tracker.run_total.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.successes.load(Ordering::SeqCst), 1);
    }
}
