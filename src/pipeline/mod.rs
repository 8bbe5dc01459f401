//! Per-slide pipeline stages.
//!
//! Each submodule implements exactly one step, so each is testable on its
//! own and the orchestrator in [`crate::run`] stays a plain loop.
//!
//! ## Data Flow
//!
//! ```text
//! draft:    SlideSpec ──▶ assets ──▶ encode ──▶ backend.generate ──▶ store
//! upscale:  SlideSpec ──▶ store (read draft) ──▶ backend.upscale ──▶ store
//! ```
//!
//! 1. [`assets`]: resolve outline-relative asset paths and load them
//! 2. [`encode`]: sniff MIME types and base64-wrap images for the request
//! 3. [`draft`]: build the prompt and render one draft
//! 4. [`upscale`]: re-render an existing draft at high resolution
//! 5. [`store`]: deterministic output paths, `exists` lookups, atomic writes

pub mod assets;
pub mod draft;
pub mod encode;
pub mod store;
pub mod upscale;
