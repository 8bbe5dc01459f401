//! Prompt templates sent to the image model.
//!
//! Every piece of prompt text lives here so wording changes never touch the
//! request or orchestration code, and tests can inspect the exact text a
//! slide would produce.

use crate::outline::SlideSpec;

/// Instruction sent with a draft image in upscale mode.
pub const UPSCALE_INSTRUCTION: &str = "Upscale this image to 4K resolution. \
Maintain all details, text, and structure exactly. Do not add or remove elements. \
Just increase the resolution and sharpness.";

/// Build the draft-generation prompt for one slide.
///
/// `asset_names` are the file names of the reference images attached to the
/// request, in attachment order.
pub fn draft_prompt(slide: &SlideSpec, guideline: Option<&str>, asset_names: &[String]) -> String {
    let mut prompt = String::from(
        "You are an expert presentation designer for a high-end tech keynote.\n",
    );

    if let Some(guide) = guideline.map(str::trim).filter(|g| !g.is_empty()) {
        prompt.push_str("\nVISUAL GUIDELINES (MUST FOLLOW):\n");
        prompt.push_str(guide);
        prompt.push('\n');
    }

    prompt.push_str("\nSLIDE CONTENT:\n");
    if slide.title.is_empty() {
        prompt.push_str(&format!("Slide {}\n", slide.index));
    } else {
        prompt.push_str(&format!("Slide {}: {}\n", slide.index, slide.title));
    }
    if !slide.prompt.is_empty() {
        prompt.push_str(&slide.prompt);
        prompt.push('\n');
    }

    prompt.push_str(
        "\nTASK:\n\
         Generate a high-resolution, 16:9 slide image that perfectly represents the content \
         above while strictly adhering to the visual guidelines.\n\
         The image should be the final slide itself, including any text or graphical elements \
         described.\n\
         Make it look like a professional slide from a Keynote presentation.\n",
    );

    for name in asset_names {
        prompt.push_str(&format!(
            "NOTE: Incorporate the provided reference image ({name}) into the design as described.\n"
        ));
    }

    prompt
}

/// Build the upscale prompt: the fixed instruction plus the slide's own
/// description so the model keeps text and layout faithful.
pub fn upscale_prompt(slide_prompt: &str) -> String {
    if slide_prompt.trim().is_empty() {
        UPSCALE_INSTRUCTION.to_string()
    } else {
        format!(
            "{UPSCALE_INSTRUCTION}\n\nThe slide was generated from this description:\n\"\"\"{}\"\"\"",
            slide_prompt.trim()
        )
    }
}
