//! Config validation: schema checks with user-friendly error messages.

use crate::schema::{AquaLabelConfig, CaptureKind, ProviderKind};
use thiserror::Error;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &AquaLabelConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_inference(config, &mut report);
    validate_capture(config, &mut report);
    validate_labels(config, &mut report);
    validate_logging(config, &mut report);
    report
}

fn validate_inference(config: &AquaLabelConfig, report: &mut ValidationReport) {
    let inference = &config.inference;
    if inference.model().trim().is_empty() {
        report.error("inference.model", "Model name cannot be empty");
    }
    let url = inference.base_url();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        report.error("inference.baseUrl", format!("'{url}' is not an http(s) URL"));
    }
    if inference.instruction().trim().is_empty() {
        report.error("inference.instruction", "Instruction cannot be empty");
    }
    if inference.timeout_secs == Some(0) {
        report.error("inference.timeoutSecs", "timeoutSecs must be > 0");
    }
    if let Some(t) = inference.temperature {
        if !(0.0..=2.0).contains(&t) {
            report.warn("inference.temperature", format!("Temperature {t} is outside 0.0-2.0"));
        }
    }
    if inference.provider() == ProviderKind::OpenAi
        && inference.api_key.as_deref().map(str::is_empty).unwrap_or(true)
    {
        report.error("inference.apiKey", "The openai provider requires an API key");
    }
}

fn validate_capture(config: &AquaLabelConfig, report: &mut ValidationReport) {
    let capture = &config.capture;
    match capture.kind() {
        CaptureKind::Command => {
            if capture.program().trim().is_empty() {
                report.error("capture.program", "Command capture needs a camera program");
            }
            if !capture.args().iter().any(|a| a.contains("{frame}")) {
                report.warn(
                    "capture.args",
                    "No {frame} placeholder; the program must write to framePath itself",
                );
            }
            if capture.frame_timeout_ms == Some(0) {
                report.error("capture.frameTimeoutMs", "frameTimeoutMs must be > 0");
            }
        }
        CaptureKind::File => {
            if capture.still_path().is_none() {
                report.error("capture.stillPath", "File capture needs stillPath");
            }
        }
    }
}

fn validate_labels(config: &AquaLabelConfig, report: &mut ValidationReport) {
    if config.labels.is_empty() {
        report.warn("labels", "No labels configured; nothing will be extracted");
        return;
    }
    if let Err(e) = config.label_set() {
        report.error("labels", e.to_string());
    }
}

fn validate_logging(config: &AquaLabelConfig, report: &mut ValidationReport) {
    let level = config.logging.level();
    // RUST_LOG-style directives ("aqualabel=debug") are accepted as-is.
    if !level.contains('=') && !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
        report.warn("logging.level", format!("Unknown log level '{level}'"));
    }
}
