//! AquaLabel configuration schema.
//!
//! Typed for serde YAML/JSON deserialization. Scalar fields are optional so a
//! partial file still parses; `defaults::apply_all_defaults` fills the gaps and
//! the accessor methods fall back to the same constants.

use aqualabel_core::{DEFAULT_INSTRUCTION, DEFAULT_VISION_MODEL};
use aqualabel_understanding::{LabelError, LabelSet, Mineral};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::defaults;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration for AquaLabel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AquaLabelConfig {
    /// Vision inference provider and prompt
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Camera / still-image source
    #[serde(default)]
    pub capture: CaptureConfig,

    /// Fields to extract, in display order
    #[serde(default = "default_labels")]
    pub labels: Vec<LabelEntry>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AquaLabelConfig {
    fn default() -> Self {
        Self {
            inference: InferenceConfig::default(),
            capture: CaptureConfig::default(),
            labels: default_labels(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AquaLabelConfig {
    /// Compile the configured labels into an extractor table.
    pub fn label_set(&self) -> Result<LabelSet, LabelError> {
        LabelSet::new(self.labels.iter().map(|e| (e.field.clone(), e.label.clone())))
    }
}

fn default_labels() -> Vec<LabelEntry> {
    Mineral::ALL
        .iter()
        .map(|m| LabelEntry {
            field: m.field().to_string(),
            label: m.default_label().to_string(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Inference
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderKind {
    #[default]
    #[serde(rename = "ollama")]
    Ollama,
    #[serde(rename = "openai")]
    OpenAi,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Ollama => "ollama",
            ProviderKind::OpenAi => "openai",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl InferenceConfig {
    pub fn provider(&self) -> ProviderKind {
        self.provider.unwrap_or_default()
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_VISION_MODEL)
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| defaults::default_base_url(self.provider()))
    }

    pub fn instruction(&self) -> &str {
        self.instruction.as_deref().unwrap_or(DEFAULT_INSTRUCTION)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(defaults::DEFAULT_TIMEOUT_SECS))
    }
}

// ---------------------------------------------------------------------------
// Capture
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureKind {
    /// Long-running camera program that keeps refreshing a frame file
    #[default]
    Command,
    /// An existing image file on disk
    File,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<CaptureKind>,
    /// Camera program, e.g. "ffmpeg" or "rpicam-still"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    /// Program arguments; `{frame}` is replaced with `framePath`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warmup_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_timeout_ms: Option<u64>,
    /// Image used when `kind: file`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub still_path: Option<PathBuf>,
}

impl CaptureConfig {
    pub fn kind(&self) -> CaptureKind {
        self.kind.unwrap_or_default()
    }

    pub fn program(&self) -> &str {
        self.program.as_deref().unwrap_or(defaults::DEFAULT_CAPTURE_PROGRAM)
    }

    /// Explicit args, else the ffmpeg defaults when the program is also defaulted.
    pub fn args(&self) -> Vec<String> {
        match (&self.args, &self.program) {
            (Some(args), _) => args.clone(),
            (None, None) => defaults::default_capture_args(),
            (None, Some(_)) => Vec::new(),
        }
    }

    pub fn frame_path(&self) -> PathBuf {
        self.frame_path.clone().unwrap_or_else(defaults::default_frame_path)
    }

    pub fn warmup(&self) -> Duration {
        Duration::from_millis(self.warmup_ms.unwrap_or(defaults::DEFAULT_WARMUP_MS))
    }

    pub fn frame_timeout(&self) -> Duration {
        Duration::from_millis(
            self.frame_timeout_ms
                .unwrap_or(defaults::DEFAULT_FRAME_TIMEOUT_MS),
        )
    }

    pub fn still_path(&self) -> Option<&Path> {
        self.still_path.as_deref()
    }
}

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelEntry {
    pub field: String,
    pub label: String,
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Directory for the rolling NDJSON log
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl LoggingConfig {
    pub fn level(&self) -> &str {
        self.level.as_deref().unwrap_or(defaults::DEFAULT_LOG_LEVEL)
    }

    pub fn dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(crate::io::default_log_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_uses_reference_labels() {
        let config: AquaLabelConfig = serde_yaml::from_str("{}").unwrap();
        let fields: Vec<_> = config.labels.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["bicarbonate", "calcium", "magnesium"]);
        assert_eq!(config.inference.model(), "llama3.2-vision");
        assert_eq!(config.inference.provider(), ProviderKind::Ollama);
    }

    #[test]
    fn test_parses_camel_case_yaml() {
        let yaml = r#"
inference:
  provider: openai
  model: gpt-4o
  apiKey: sk-test
  timeoutSecs: 30
capture:
  kind: file
  stillPath: /tmp/label.jpg
labels:
  - field: sodium
    label: Sódio
"#;
        let config: AquaLabelConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.inference.provider(), ProviderKind::OpenAi);
        assert_eq!(config.inference.timeout(), Duration::from_secs(30));
        assert_eq!(config.inference.base_url(), "https://api.openai.com/v1");
        assert_eq!(config.capture.kind(), CaptureKind::File);
        assert_eq!(config.capture.still_path(), Some(Path::new("/tmp/label.jpg")));
        let labels = config.label_set().unwrap();
        assert_eq!(labels.label_for("sodium"), Some("Sódio"));
    }
}
