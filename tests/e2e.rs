//! Live tests against the Gemini image API.
//!
//! They spend real quota, so they are gated behind the `E2E_ENABLED`
//! environment variable and also need `GEMINI_API_KEY`.
//!
//! Run with:
//!   E2E_ENABLED=1 cargo test --test e2e -- --nocapture

use slidegen::{run, OutputStore, RunConfig, RunMode, SlideSelection, Tier};
use std::path::PathBuf;

/// Skip this test unless E2E_ENABLED and an API key are both set.
macro_rules! e2e_skip_unless_ready {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        if std::env::var("GEMINI_API_KEY").is_err() && std::env::var("GOOGLE_API_KEY").is_err() {
            println!("SKIP: GEMINI_API_KEY is not set");
            return;
        }
    }};
}

fn write_outline(dir: &std::path::Path) -> PathBuf {
    let path = dir.join("outline.md");
    std::fs::write(
        &path,
        "# Live deck\n\n\
         #### Slide 1: Opening\n\
         A translucent glass vase on a matte ceramic shelf, soft studio light.\n",
    )
    .expect("write outline");
    path
}

#[tokio::test]
async fn test_live_draft_then_upscale() {
    e2e_skip_unless_ready!();

    let dir = tempfile::tempdir().expect("tempdir");
    let outline = write_outline(dir.path());
    let out = dir.path().join("generated_slides");

    let draft = RunConfig::builder()
        .outline(&outline)
        .output_dir(&out)
        .build()
        .expect("config");
    let summary = run(&draft).await.expect("draft run");
    println!("draft: {}/{} ok", summary.succeeded, summary.slides.len());
    assert_eq!(summary.failed, 0, "draft failures: {:?}", summary.slides);

    let store = OutputStore::new(&out);
    assert!(store.exists(1, Tier::Draft));

    let upscale = RunConfig::builder()
        .outline(&outline)
        .output_dir(&out)
        .mode(RunMode::Upscale)
        .slides(SlideSelection::from_indices([1]))
        .build()
        .expect("config");
    let summary = run(&upscale).await.expect("upscale run");
    assert_eq!(summary.failed, 0, "upscale failures: {:?}", summary.slides);
    assert!(store.exists(1, Tier::Upscaled));

    let draft_len = std::fs::metadata(store.find(1, Tier::Draft).expect("draft"))
        .expect("meta")
        .len();
    let big_len = std::fs::metadata(store.find(1, Tier::Upscaled).expect("4k"))
        .expect("meta")
        .len();
    println!("draft {draft_len} bytes, upscaled {big_len} bytes");
}
