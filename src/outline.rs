//! Outline parsing: markdown document → ordered [`SlideSpec`] list.
//!
//! ## Outline format
//!
//! ```text
//! # Product Keynote            ← preamble, ignored
//!
//! #### Slide 1: Opening
//! A translucent vase on a ceramic shelf
//!
//! #### Slide 2: Call to action
//! QR code overlay
//! imgs/qrcode.png              ← asset reference, not prompt text
//! ```
//!
//! Any ATX heading whose text starts with the word `Slide` opens a new slide.
//! Everything up to the next slide heading is that slide's body. Other
//! headings (`## Act II`) are plain body text.
//!
//! ## Why abort on a bad heading?
//!
//! The slide number is the key for output filenames and `--slides`
//! selection. Skipping a heading we cannot read would silently attach its
//! body to the previous slide and shift every later prompt, so a malformed
//! heading is a hard [`ParseError`] instead.

use crate::error::{ParseError, SlideGenError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// One slide parsed from the outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideSpec {
    /// 1-based slide number taken from the heading.
    pub index: usize,
    /// Heading text after the number, e.g. `Opening`. May be empty.
    pub title: String,
    /// Body text with asset lines removed. May be empty.
    pub prompt: String,
    /// Relative paths of reference images, in document order.
    pub asset_paths: Vec<String>,
}

static RE_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ {0,3}#{1,6}[ \t]+(.*?)[ \t#]*$").unwrap());

static RE_SLIDE_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^slide\b").unwrap());

static RE_SLIDE_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^slide[ \t]+(\d+)(?:[ \t]*[:.)\-–—][ \t]*|[ \t]+|$)(.*)$").unwrap()
});

static RE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ {0,3}(`{3,}|~{3,})").unwrap());

/// `* **Asset**: path`, `* **Asset:** path`, `**Assets** : path`
static RE_ASSET_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:[*-]\s+)?\*\*assets?(?:\*\*)?\s*:?\s*(?:\*\*)?\s*(.*?)\s*$").unwrap()
});

/// A whole line that is nothing but a relative image path, optionally
/// bulleted, backticked, or written as a markdown image.
static RE_ASSET_LINE: Lazy<Regex> = Lazy::new(|| {
    let path = r"((?:\.{1,2}/)*[A-Za-z0-9_][A-Za-z0-9_.\-/]*\.(?i:png|jpe?g|webp|gif))";
    Regex::new(&format!(
        r"^\s*(?:[*-]\s+)?(?:`{path}`|{path}|!\[[^\]]*\]\({path}\))\s*$"
    ))
    .unwrap()
});

/// Fenced code block tracker. A fence closes only on a run of the same
/// character at least as long as the one that opened it.
#[derive(Debug, Default)]
struct Fence {
    open: Option<(u8, usize)>,
}

impl Fence {
    /// Feed one line; true when it opens or closes the fence.
    fn step(&mut self, line: &str) -> bool {
        let Some(marker) = RE_FENCE.captures(line).and_then(|c| c.get(1)) else {
            return false;
        };
        let ch = marker.as_str().as_bytes()[0];
        let len = marker.len();
        match self.open {
            None => {
                self.open = Some((ch, len));
                true
            }
            Some((open_ch, open_len)) if open_ch == ch && len >= open_len => {
                self.open = None;
                true
            }
            Some(_) => false,
        }
    }

    fn is_open(&self) -> bool {
        self.open.is_some()
    }
}

/// Return the relative asset path if `line` is an asset reference.
pub fn asset_reference(line: &str) -> Option<String> {
    RE_ASSET_LINE.captures(line).and_then(|caps| {
        caps.iter()
            .skip(1)
            .flatten()
            .next()
            .map(|m| m.as_str().to_string())
    })
}

/// Parse outline text into slides, in document order.
///
/// Slide numbers must be positive and strictly increasing; gaps are allowed
/// (a deleted slide keeps its neighbours' filenames stable) but logged.
pub fn parse_outline(text: &str) -> Result<Vec<SlideSpec>, ParseError> {
    let mut slides: Vec<SlideSpec> = Vec::new();
    let mut body: Vec<&str> = Vec::new();
    let mut fence = Fence::default();

    for (line_no, line) in text.lines().enumerate().map(|(i, l)| (i + 1, l)) {
        fence.step(line);

        if !fence.is_open() {
            if let Some(heading) = slide_heading(line) {
                let (index, title) = parse_slide_heading(heading, line_no, line)?;

                if let Some(prev) = slides.last_mut() {
                    if index <= prev.index {
                        return Err(ParseError {
                            line: line_no,
                            content: line.to_string(),
                            reason: format!(
                                "slide {} follows slide {}; numbers must be strictly increasing",
                                index, prev.index
                            ),
                        });
                    }
                    if index != prev.index + 1 {
                        warn!("Outline skips from slide {} to slide {}", prev.index, index);
                    }
                    fill_body(prev, &body);
                }
                body.clear();

                slides.push(SlideSpec {
                    index,
                    title,
                    prompt: String::new(),
                    asset_paths: Vec::new(),
                });
                continue;
            }
        }

        if !slides.is_empty() {
            body.push(line);
        }
    }

    if let Some(last) = slides.last_mut() {
        fill_body(last, &body);
    }

    debug!("Parsed {} slides from outline", slides.len());
    Ok(slides)
}

/// Read and parse an outline file.
pub async fn load_outline(path: &Path) -> Result<Vec<SlideSpec>, SlideGenError> {
    let text = tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            SlideGenError::OutlineNotFound {
                path: path.to_path_buf(),
            }
        } else {
            SlideGenError::OutlineRead {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;
    Ok(parse_outline(&text)?)
}

/// Heading text, if `line` is a heading that starts with the word "Slide".
fn slide_heading(line: &str) -> Option<&str> {
    let caps = RE_HEADING.captures(line)?;
    let text = caps.get(1)?.as_str();
    RE_SLIDE_WORD.is_match(text).then_some(text)
}

fn parse_slide_heading(
    heading: &str,
    line_no: usize,
    line: &str,
) -> Result<(usize, String), ParseError> {
    let err = |reason: &str| ParseError {
        line: line_no,
        content: line.to_string(),
        reason: reason.to_string(),
    };

    let caps = RE_SLIDE_HEADING
        .captures(heading)
        .ok_or_else(|| err("slide heading has no number (expected 'Slide <N>: <title>')"))?;

    let index: usize = caps[1]
        .parse()
        .map_err(|_| err("slide number is not a valid integer"))?;
    if index == 0 {
        return Err(err("slide numbers start at 1"));
    }

    let title = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
    Ok((index, title.to_string()))
}

/// Split a slide body into prompt text and asset paths.
fn fill_body(slide: &mut SlideSpec, body: &[&str]) {
    let mut prompt_lines: Vec<&str> = Vec::with_capacity(body.len());
    let mut fence = Fence::default();

    for &line in body {
        if fence.step(line) || fence.is_open() {
            prompt_lines.push(line.trim_end());
            continue;
        }

        if let Some(caps) = RE_ASSET_LABEL.captures(line) {
            let value = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            if value.is_empty() || value.eq_ignore_ascii_case("none") {
                continue;
            }
            if let Some(path) = asset_reference(value) {
                slide.asset_paths.push(path);
                continue;
            }
        }

        if let Some(path) = asset_reference(line) {
            slide.asset_paths.push(path);
            continue;
        }

        prompt_lines.push(line.trim_end());
    }

    while prompt_lines.first().is_some_and(|l| l.trim().is_empty()) {
        prompt_lines.remove(0);
    }
    while prompt_lines.last().is_some_and(|l| l.trim().is_empty()) {
        prompt_lines.pop();
    }

    slide.prompt = prompt_lines.join("\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Vec<SlideSpec> {
        parse_outline(text).expect("outline should parse")
    }

    #[test]
    fn two_slides_with_asset() {
        let slides = parse(
            "# Keynote\n\n\
             #### Slide 1: Opening\n\
             A translucent vase on a ceramic shelf\n\n\
             #### Slide 2: Call to action\n\
             QR code overlay\n\
             imgs/qrcode.png\n",
        );
        assert_eq!(slides.len(), 2);
        assert_eq!(slides[0].index, 1);
        assert_eq!(slides[0].title, "Opening");
        assert_eq!(slides[0].prompt, "A translucent vase on a ceramic shelf");
        assert!(slides[0].asset_paths.is_empty());

        assert_eq!(slides[1].index, 2);
        assert_eq!(slides[1].prompt, "QR code overlay");
        assert_eq!(slides[1].asset_paths, vec!["imgs/qrcode.png"]);
    }

    #[test]
    fn preamble_is_ignored() {
        let slides = parse("Deck notes\nimgs/logo.png\n\n## Slide 1\nBody\n");
        assert_eq!(slides.len(), 1);
        assert_eq!(slides[0].prompt, "Body");
        assert!(slides[0].asset_paths.is_empty());
    }

    #[test]
    fn empty_body_yields_empty_prompt() {
        let slides = parse("#### Slide 1: Blank\n\n#### Slide 2\nText\n");
        assert_eq!(slides[0].prompt, "");
        assert_eq!(slides[1].title, "");
        assert_eq!(slides[1].prompt, "Text");
    }

    #[test]
    fn asset_label_forms() {
        let slides = parse(
            "#### Slide 1: Logo\n\
             * **Visual**: logo centred\n\
             * **Asset**: imgs/logo.png\n\
             #### Slide 2\n\
             * **Asset:** none\n\
             Plain\n\
             #### Slide 3\n\
             * **Asset**:\n\
             \x20   * imgs/a.png\n\
             \x20   - `imgs/b.jpg`\n\
             ![chart](charts/q3.webp)\n",
        );
        assert_eq!(slides[0].asset_paths, vec!["imgs/logo.png"]);
        assert_eq!(slides[0].prompt, "* **Visual**: logo centred");
        assert!(slides[1].asset_paths.is_empty());
        assert_eq!(slides[1].prompt, "Plain");
        assert_eq!(
            slides[2].asset_paths,
            vec!["imgs/a.png", "imgs/b.jpg", "charts/q3.webp"]
        );
        assert_eq!(slides[2].prompt, "");
    }

    #[test]
    fn absolute_paths_and_urls_stay_in_prompt() {
        let slides = parse(
            "#### Slide 1\n/etc/logo.png\nhttps://example.com/a.png\nsee imgs/x.png for style\n",
        );
        assert!(slides[0].asset_paths.is_empty());
        assert_eq!(slides[0].prompt.lines().count(), 3);
    }

    #[test]
    fn fenced_headings_are_body_text() {
        let slides = parse("#### Slide 1\n```\n#### Slide 9\nimgs/a.png\n```\nafter\n");
        assert_eq!(slides.len(), 1);
        assert!(slides[0].asset_paths.is_empty());
        assert!(slides[0].prompt.contains("#### Slide 9"));
        assert!(slides[0].prompt.ends_with("after"));
    }

    #[test]
    fn fence_closes_only_on_its_own_marker() {
        let slides = parse(
            "#### Slide 1\n```\n~~~\n#### Slide 2\nimgs/a.png\n```\n#### Slide 3\nreal\n",
        );
        let indices: Vec<usize> = slides.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![1, 3]);
        assert!(slides[0].prompt.contains("#### Slide 2"));
        assert!(slides[0].asset_paths.is_empty());

        let slides = parse("#### Slide 1\n~~~~\n~~~\n#### Slide 2\n~~~~\nafter\n");
        assert_eq!(slides.len(), 1);
        assert!(slides[0].prompt.ends_with("after"));
    }

    #[test]
    fn other_headings_belong_to_body() {
        let slides = parse("#### Slide 1\n## Act II\ntext\n#### Slides overview\n");
        assert_eq!(slides.len(), 1);
        assert_eq!(slides[0].prompt, "## Act II\ntext\n#### Slides overview");
    }

    #[test]
    fn heading_without_number_fails() {
        let err = parse_outline("#### Slide 1\nok\n\n#### Slide: Intro\n").unwrap_err();
        assert_eq!(err.line, 4);
        assert_eq!(err.content, "#### Slide: Intro");
    }

    #[test]
    fn unparseable_number_fails() {
        assert!(parse_outline("#### Slide 3a: Oops\n").is_err());
        assert!(parse_outline("#### Slide 99999999999999999999999: Huge\n").is_err());
    }

    #[test]
    fn zero_index_fails() {
        let err = parse_outline("#### Slide 0: Cover\n").unwrap_err();
        assert!(err.reason.contains("start at 1"));
    }

    #[test]
    fn non_increasing_fails() {
        let err = parse_outline("#### Slide 2\n#### Slide 2\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(parse_outline("#### Slide 3\n#### Slide 1\n").is_err());
    }

    #[test]
    fn gaps_are_allowed() {
        let slides = parse("#### Slide 1\na\n#### Slide 4\nb\n");
        let indices: Vec<usize> = slides.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![1, 4]);
    }

    #[test]
    fn indices_strictly_increase_in_document_order() {
        let text: String = (1..=19)
            .map(|i| format!("### SLIDE {i} - Title {i}\nPrompt {i}\n\n"))
            .collect();
        let slides = parse(&text);
        assert_eq!(slides.len(), 19);
        assert!(slides.windows(2).all(|w| w[0].index < w[1].index));
        assert_eq!(slides[18].title, "Title 19");
    }

    #[test]
    fn inline_asset_mention_stays_in_prompt() {
        let slides = parse("#### Slide 2\nQR code overlay, imgs/qrcode.png\n");
        assert_eq!(slides[0].prompt, "QR code overlay, imgs/qrcode.png");
        assert!(slides[0].asset_paths.is_empty());
    }

    #[test]
    fn asset_reference_shapes() {
        assert_eq!(asset_reference("imgs/qrcode.png").as_deref(), Some("imgs/qrcode.png"));
        assert_eq!(asset_reference("  - ./imgs/q.JPG ").as_deref(), Some("./imgs/q.JPG"));
        assert_eq!(asset_reference("![x](../shared/a.gif)").as_deref(), Some("../shared/a.gif"));
        assert_eq!(asset_reference("imgs/notes.txt"), None);
        assert_eq!(asset_reference("/abs/a.png"), None);
        assert_eq!(asset_reference("QR code overlay, imgs/qrcode.png"), None);
    }

    #[tokio::test]
    async fn load_missing_outline() {
        let err = load_outline(Path::new("/definitely/not/here.md"))
            .await
            .unwrap_err();
        assert!(matches!(err, SlideGenError::OutlineNotFound { .. }));
    }
}
