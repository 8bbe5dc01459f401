//! Image payloads: raw bytes + MIME type, base64 for the request body.
//!
//! The Gemini API takes reference images as base64 `inlineData` parts and
//! needs an accurate MIME type for each. We sniff the type from the magic
//! bytes (via `image::guess_format`) rather than trusting file extensions,
//! and never decode pixels.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::ImageFormat;
use tracing::debug;

/// MIME type assumed when the bytes match no known image signature.
pub const FALLBACK_MIME: &str = "image/jpeg";

/// An image sent to the model: a slide asset or an existing draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    /// File name, used in prompt notes and logs.
    pub name: String,
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl InlineImage {
    /// Wrap raw bytes, sniffing the MIME type from their signature.
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        let name = name.into();
        let mime_type = sniff_mime(&data)
            .or_else(|| mime_from_name(&name))
            .unwrap_or(FALLBACK_MIME)
            .to_string();
        Self {
            name,
            data,
            mime_type,
        }
    }

    /// Base64 payload for the request body.
    pub fn to_base64(&self) -> String {
        let b64 = STANDARD.encode(&self.data);
        debug!("Encoded {} → {} bytes base64", self.name, b64.len());
        b64
    }
}

/// MIME type from the image's magic bytes.
pub fn sniff_mime(data: &[u8]) -> Option<&'static str> {
    match image::guess_format(data) {
        Ok(ImageFormat::Png) => Some("image/png"),
        Ok(ImageFormat::Jpeg) => Some("image/jpeg"),
        Ok(ImageFormat::WebP) => Some("image/webp"),
        Ok(ImageFormat::Gif) => Some("image/gif"),
        _ => None,
    }
}

/// MIME type from a file name's extension.
pub fn mime_from_name(name: &str) -> Option<&'static str> {
    let ext = name.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

/// File extension for an image MIME type. Unknown types map to `jpg`.
pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime.to_ascii_lowercase().as_str() {
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "jpg",
    }
}
