//! Capture sources for AquaLabel: camera programs, still files and a scripted stub.

use std::sync::Arc;

use anyhow::Context;
use aqualabel_config::{CaptureConfig, CaptureKind};
use aqualabel_core::CaptureSource;

pub mod command;
pub mod mime_detect;
pub mod still;
pub mod stub;

pub use command::CommandCapture;
pub use mime_detect::{
    detect_format, format_from_path, image_dimensions, is_complete_frame, sniff_format,
};
pub use still::StillFileCapture;
pub use stub::{StubCapture, StubStats, TINY_JPEG};

/// Build the capture source selected by the capture config.
pub fn build_capture_source(config: &CaptureConfig) -> anyhow::Result<Arc<dyn CaptureSource>> {
    let source: Arc<dyn CaptureSource> = match config.kind() {
        CaptureKind::Command => Arc::new(CommandCapture::from_config(config)),
        CaptureKind::File => {
            let path = config
                .still_path()
                .context("capture.stillPath is required when capture.kind is file")?;
            Arc::new(StillFileCapture::new(path))
        }
    };
    tracing::debug!(source = source.name(), "Built capture source");
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_ffmpeg_command() {
        let source = build_capture_source(&CaptureConfig::default()).unwrap();
        assert_eq!(source.name(), "ffmpeg");
    }

    #[test]
    fn test_file_kind_needs_path() {
        let config = CaptureConfig {
            kind: Some(CaptureKind::File),
            ..Default::default()
        };
        assert!(build_capture_source(&config).is_err());
    }
}
