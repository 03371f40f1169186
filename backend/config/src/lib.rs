//! `aqualabel-config`: AquaLabel runtime configuration.
//!
//! Provides:
//! - Typed config schema (inference provider, capture source, labels, logging)
//! - YAML read/write with atomic backup rotation
//! - `${ENV_VAR}` substitution
//! - Config redaction for safe display
//! - Default value application
//! - Schema validation

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{contains_env_var_reference, resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, config_file_path, default_log_dir, load_config, parse_config, write_config};
pub use redact::{collect_redacted_paths, redact};
pub use schema::{
    AquaLabelConfig, CaptureConfig, CaptureKind, InferenceConfig, LabelEntry, LoggingConfig,
    ProviderKind,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::path::Path;

/// Load, substitute env vars, apply defaults and validate a config file.
///
/// This is the main entry point for loading a config at runtime. A missing
/// file yields the defaults.
pub async fn load_and_prepare(path: &Path) -> Result<AquaLabelConfig> {
    let raw = if path.exists() {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?
    } else {
        tracing::debug!(path = %path.display(), "Config file does not exist; using defaults");
        String::new()
    };
    prepare_str(&raw).with_context(|| format!("Invalid config at: {}", path.display()))
}

/// The processing half of [`load_and_prepare`], over YAML text.
pub fn prepare_str(raw: &str) -> Result<AquaLabelConfig> {
    // Untyped first so ${VAR} can sit in any string, including numeric-looking ones.
    let value: Value = if raw.trim().is_empty() {
        Value::Object(Default::default())
    } else {
        serde_yaml::from_str(raw).context("Failed to parse config YAML")?
    };
    let value = match value {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };

    let value = resolve_env_vars(&value).context("Failed to resolve env vars in config")?;

    let config: AquaLabelConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;

    let config = apply_all_defaults(config);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if let Some(first) = report.errors.into_iter().next() {
        bail!(first);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_empty_document() {
        let config = prepare_str("").unwrap();
        assert_eq!(config.inference.model.as_deref(), Some("llama3.2-vision"));
        assert_eq!(config.labels.len(), 3);
    }

    #[test]
    fn test_prepare_rejects_invalid() {
        let err = prepare_str("inference:\n  provider: openai\n").unwrap_err();
        assert!(format!("{err:#}").contains("inference.apiKey"));
    }

    #[tokio::test]
    async fn test_load_and_prepare_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        tokio::fs::write(&path, "inference:\n  model: llava:13b\n  temperature: 0.2\n")
            .await
            .unwrap();
        let config = load_and_prepare(&path).await.unwrap();
        assert_eq!(config.inference.model(), "llava:13b");
        assert_eq!(config.inference.temperature, Some(0.2));
    }
}
