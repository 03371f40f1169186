//! Config defaults: applies sensible default values to parsed config.

use aqualabel_core::{DEFAULT_INSTRUCTION, DEFAULT_VISION_MODEL};
use std::path::PathBuf;

use crate::schema::{AquaLabelConfig, ProviderKind};

/// Default Ollama endpoint.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Default OpenAI-compatible endpoint.
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

/// Vision models on a CPU can take minutes per image.
pub const DEFAULT_TIMEOUT_SECS: u64 = 180;

/// Default camera program.
pub const DEFAULT_CAPTURE_PROGRAM: &str = "ffmpeg";

/// Time the camera gets to settle exposure before frames are trusted.
pub const DEFAULT_WARMUP_MS: u64 = 500;

/// How long a snapshot waits for the first complete frame.
pub const DEFAULT_FRAME_TIMEOUT_MS: u64 = 5_000;

pub const DEFAULT_LOG_LEVEL: &str = "info";

pub fn default_base_url(provider: ProviderKind) -> &'static str {
    match provider {
        ProviderKind::Ollama => DEFAULT_OLLAMA_URL,
        ProviderKind::OpenAi => DEFAULT_OPENAI_URL,
    }
}

/// ffmpeg reading the first V4L2 webcam at 640x480 and rewriting one JPEG in place.
pub fn default_capture_args() -> Vec<String> {
    [
        "-loglevel", "error",
        "-f", "v4l2",
        "-video_size", "640x480",
        "-i", "/dev/video0",
        "-r", "4",
        "-update", "1",
        "-q:v", "3",
        "-y", "{frame}",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

pub fn default_frame_path() -> PathBuf {
    std::env::temp_dir().join("aqualabel_frame.jpg")
}

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: AquaLabelConfig) -> AquaLabelConfig {
    let config = apply_inference_defaults(config);
    let config = apply_capture_defaults(config);
    apply_logging_defaults(config)
}

/// Fill provider, model, endpoint, prompt and timeout.
fn apply_inference_defaults(mut config: AquaLabelConfig) -> AquaLabelConfig {
    let inference = &mut config.inference;
    let provider = *inference.provider.get_or_insert(ProviderKind::Ollama);
    if inference.model.is_none() {
        inference.model = Some(DEFAULT_VISION_MODEL.to_string());
    }
    if inference.base_url.is_none() {
        inference.base_url = Some(default_base_url(provider).to_string());
    }
    if inference.instruction.is_none() {
        inference.instruction = Some(DEFAULT_INSTRUCTION.to_string());
    }
    if inference.timeout_secs.is_none() {
        inference.timeout_secs = Some(DEFAULT_TIMEOUT_SECS);
    }
    config
}

/// Command capture gets the ffmpeg webcam defaults; file capture needs nothing else.
fn apply_capture_defaults(mut config: AquaLabelConfig) -> AquaLabelConfig {
    let capture = &mut config.capture;
    capture.kind.get_or_insert_with(Default::default);
    if capture.warmup_ms.is_none() {
        capture.warmup_ms = Some(DEFAULT_WARMUP_MS);
    }
    if capture.frame_timeout_ms.is_none() {
        capture.frame_timeout_ms = Some(DEFAULT_FRAME_TIMEOUT_MS);
    }
    if capture.program.is_none() {
        capture.program = Some(DEFAULT_CAPTURE_PROGRAM.to_string());
        if capture.args.is_none() {
            capture.args = Some(default_capture_args());
        }
    }
    if capture.frame_path.is_none() {
        capture.frame_path = Some(default_frame_path());
    }
    config
}

fn apply_logging_defaults(mut config: AquaLabelConfig) -> AquaLabelConfig {
    if config.logging.level.is_none() {
        config.logging.level = Some(DEFAULT_LOG_LEVEL.to_string());
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_everything() {
        let config = apply_all_defaults(AquaLabelConfig::default());
        assert_eq!(config.inference.base_url.as_deref(), Some(DEFAULT_OLLAMA_URL));
        assert_eq!(config.inference.instruction.as_deref(), Some(DEFAULT_INSTRUCTION));
        assert_eq!(config.capture.program.as_deref(), Some("ffmpeg"));
        assert!(config
            .capture
            .args
            .as_ref()
            .unwrap()
            .iter()
            .any(|a| a == "{frame}"));
        assert_eq!(config.logging.level.as_deref(), Some("info"));
    }

    #[test]
    fn test_openai_gets_openai_endpoint() {
        let mut config = AquaLabelConfig::default();
        config.inference.provider = Some(ProviderKind::OpenAi);
        let config = apply_all_defaults(config);
        assert_eq!(config.inference.base_url.as_deref(), Some(DEFAULT_OPENAI_URL));
    }

    #[test]
    fn test_custom_program_keeps_its_args_unset() {
        let mut config = AquaLabelConfig::default();
        config.capture.program = Some("rpicam-still".into());
        let config = apply_all_defaults(config);
        assert!(config.capture.args.is_none());
    }
}
