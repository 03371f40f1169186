//! Capture source that serves an existing image file.
//!
//! Used for `aqualabel analyze` and for machines without a camera.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use aqualabel_core::{CaptureFault, CaptureSource, CaptureStream, CapturedImage, ImageFormat};

use crate::mime_detect::detect_format;

pub struct StillFileCapture {
    path: PathBuf,
    name: String,
}

impl StillFileCapture {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = format!("file:{}", path.display());
        Self { path, name }
    }
}

fn io_fault(path: &std::path::Path, err: std::io::Error) -> CaptureFault {
    match err.kind() {
        std::io::ErrorKind::PermissionDenied => {
            CaptureFault::PermissionDenied(format!("{}: {err}", path.display()))
        }
        _ => CaptureFault::DeviceUnavailable(format!("{}: {err}", path.display())),
    }
}

#[async_trait]
impl CaptureSource for StillFileCapture {
    fn name(&self) -> &str {
        &self.name
    }

    async fn request_stream(&self) -> Result<Box<dyn CaptureStream>, CaptureFault> {
        let meta = tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| io_fault(&self.path, e))?;
        if !meta.is_file() {
            return Err(CaptureFault::DeviceUnavailable(format!(
                "{} is not a file",
                self.path.display()
            )));
        }
        Ok(Box::new(StillStream {
            path: self.path.clone(),
            source: self.name.clone(),
        }))
    }
}

struct StillStream {
    path: PathBuf,
    source: String,
}

#[async_trait]
impl CaptureStream for StillStream {
    async fn capture_frame(&mut self) -> Result<CapturedImage, CaptureFault> {
        let data = tokio::fs::read(&self.path)
            .await
            .map_err(|e| CaptureFault::FrameUnavailable(format!("{}: {e}", self.path.display())))?;
        let format = detect_format(&data, &self.path);
        if data.is_empty() || format == ImageFormat::Unknown {
            return Err(CaptureFault::FrameUnavailable(format!(
                "{} is not a recognised image",
                self.path.display()
            )));
        }
        debug!(path = %self.path.display(), bytes = data.len(), %format, "Read still image");
        Ok(CapturedImage::new(data, format).with_source(self.source.clone()))
    }

    async fn stop(&mut self) {}
}
