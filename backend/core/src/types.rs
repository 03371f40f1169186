use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Step of the capture → infer → extract workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// No stream attached, nothing captured.
    Idle,
    /// Live stream running, waiting for a snapshot.
    Capturing,
    /// Still image held, ready for inference.
    Captured,
    /// Inference request in flight.
    Processing,
    /// Inference text and readings available.
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::Capturing => "capturing",
            Stage::Captured => "captured",
            Stage::Processing => "processing",
            Stage::Done => "done",
        }
    }

    /// Stages in which a `CapturedImage` is held.
    pub fn holds_image(&self) -> bool {
        matches!(self, Stage::Captured | Stage::Processing | Stage::Done)
    }

    /// Stages from which `retake` is allowed.
    pub fn can_retake(&self) -> bool {
        self.holds_image()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encoding of a captured still.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Webp,
    Bmp,
    Unknown,
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Webp => "image/webp",
            ImageFormat::Bmp => "image/bmp",
            ImageFormat::Unknown => "application/octet-stream",
        }
    }

    pub fn from_mime(mime: &str) -> Self {
        match mime {
            "image/jpeg" | "image/jpg" => ImageFormat::Jpeg,
            "image/png" => ImageFormat::Png,
            "image/webp" => ImageFormat::Webp,
            "image/bmp" => ImageFormat::Bmp,
            _ => ImageFormat::Unknown,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImageFormat::Jpeg => "JPEG",
            ImageFormat::Png => "PNG",
            ImageFormat::Webp => "WebP",
            ImageFormat::Bmp => "BMP",
            ImageFormat::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// A still image snapshot taken from the capture stream.
///
/// The buffer is reference-counted, so cloning is cheap and the same bytes can
/// be handed to an in-flight inference while the session keeps its own copy.
#[derive(Clone)]
pub struct CapturedImage {
    data: Bytes,
    format: ImageFormat,
    captured_at: DateTime<Utc>,
    source: String,
}

impl CapturedImage {
    pub fn new(data: impl Into<Bytes>, format: ImageFormat) -> Self {
        Self {
            data: data.into(),
            format,
            captured_at: Utc::now(),
            source: String::new(),
        }
    }

    /// Tag the image with the capture source that produced it.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl fmt::Debug for CapturedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedImage")
            .field("bytes", &self.data.len())
            .field("format", &self.format)
            .field("captured_at", &self.captured_at)
            .field("source", &self.source)
            .finish()
    }
}

/// Raw text returned by the vision model for one captured image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceResult {
    text: String,
    provider: String,
    model: String,
    latency_ms: u64,
    received_at: DateTime<Utc>,
}

impl InferenceResult {
    pub fn new(
        text: impl Into<String>,
        provider: impl Into<String>,
        model: impl Into<String>,
        latency_ms: u64,
    ) -> Self {
        Self {
            text: text.into(),
            provider: provider.into(),
            model: model.into(),
            latency_ms,
            received_at: Utc::now(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn latency_ms(&self) -> u64 {
        self.latency_ms
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_image_invariant() {
        assert!(!Stage::Idle.holds_image());
        assert!(!Stage::Capturing.holds_image());
        assert!(Stage::Captured.holds_image());
        assert!(Stage::Processing.holds_image());
        assert!(Stage::Done.holds_image());
    }

    #[test]
    fn test_stage_serializes_snake_case() {
        let json = serde_json::to_string(&Stage::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
        assert_eq!(Stage::Captured.to_string(), "captured");
    }

    #[test]
    fn test_image_clone_shares_buffer() {
        let image = CapturedImage::new(vec![0xFF, 0xD8, 0xFF], ImageFormat::Jpeg).with_source("stub");
        let copy = image.clone();
        assert_eq!(copy.data().as_ptr(), image.data().as_ptr());
        assert_eq!(copy.mime_type(), "image/jpeg");
        assert_eq!(copy.source(), "stub");
    }

    #[test]
    fn test_image_debug_omits_bytes() {
        let image = CapturedImage::new(vec![1u8; 4096], ImageFormat::Png);
        let debug = format!("{:?}", image);
        assert!(debug.contains("bytes: 4096"));
        assert!(debug.len() < 256);
    }

    #[test]
    fn test_format_mime_roundtrip() {
        for format in [ImageFormat::Jpeg, ImageFormat::Png, ImageFormat::Webp, ImageFormat::Bmp] {
            assert_eq!(ImageFormat::from_mime(format.mime_type()), format);
        }
        assert_eq!(ImageFormat::from_mime("text/plain"), ImageFormat::Unknown);
    }
}
