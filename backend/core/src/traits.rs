use anyhow::Result;
use async_trait::async_trait;

use crate::error::CaptureFault;
use crate::types::CapturedImage;

/// Something that can hand out a live camera stream (camera program, still file, test stub).
#[async_trait]
pub trait CaptureSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Acquire a live stream. Fails when permission is refused or no device is present.
    async fn request_stream(&self) -> std::result::Result<Box<dyn CaptureStream>, CaptureFault>;
}

/// A running capture stream. Holds the underlying device until `stop` is called or it is dropped.
#[async_trait]
pub trait CaptureStream: Send {
    /// Grab the current frame as an encoded still.
    async fn capture_frame(&mut self) -> std::result::Result<CapturedImage, CaptureFault>;

    /// Release the device. Calling it more than once is harmless.
    async fn stop(&mut self);
}

/// Trait for vision-capable inference backends.
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Provider name (e.g., "ollama", "openai").
    fn name(&self) -> &str;

    /// Send the image plus instruction and return the model's free-form text.
    async fn describe(&self, request: &VisionRequest) -> Result<VisionResponse>;
}

/// Request to a vision provider.
#[derive(Debug, Clone)]
pub struct VisionRequest {
    pub model: String,
    pub instruction: String,
    pub image: CapturedImage,
    pub temperature: Option<f32>,
}

/// Response from a vision provider.
#[derive(Debug, Clone)]
pub struct VisionResponse {
    pub content: String,
    pub provider: String,
    pub model: String,
    pub tokens_used: u64,
    pub latency_ms: u64,
}
