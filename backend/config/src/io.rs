//! Config file read/write with atomic backup rotation.

use crate::schema::AquaLabelConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Default config file name within the config directory.
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Number of rolling backups to keep.
const MAX_BACKUPS: usize = 3;

/// Resolve the AquaLabel config directory.
/// Priority: `AQUALABEL_CONFIG_DIR` env > `~/.aqualabel/` > `./.aqualabel`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("AQUALABEL_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    match dirs::home_dir() {
        Some(home) => home.join(".aqualabel"),
        None => PathBuf::from(".aqualabel"),
    }
}

/// Resolve the full path to the main config file.
pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Rolling log files live next to the config unless overridden.
pub fn default_log_dir() -> PathBuf {
    config_dir().join("logs")
}

/// Load and parse the config from disk.
///
/// Returns `Ok(Default::default())` if the file doesn't exist (first run).
pub async fn load_config(path: &Path) -> Result<AquaLabelConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(AquaLabelConfig::default());
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config = parse_config(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// Parse YAML text; an empty document means "all defaults".
pub fn parse_config(raw: &str) -> Result<AquaLabelConfig> {
    if raw.trim().is_empty() {
        return Ok(AquaLabelConfig::default());
    }
    Ok(serde_yaml::from_str(raw)?)
}

/// Write config to disk atomically (write to temp file, rename).
///
/// Creates a rolling backup of the previous config before overwriting.
pub async fn write_config(config: &AquaLabelConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.with_context(|| {
            format!("Failed to create config directory: {}", parent.display())
        })?;
    }

    if path.exists() {
        rotate_backups(path).await?;
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize config to YAML")?;

    let tmp_path = path.with_extension("yaml.tmp");
    fs::write(&tmp_path, yaml.as_bytes())
        .await
        .with_context(|| format!("Failed to write temp config: {}", tmp_path.display()))?;

    fs::rename(&tmp_path, path)
        .await
        .with_context(|| format!("Failed to rename temp config to: {}", path.display()))?;

    info!(path = %path.display(), "Wrote config");
    Ok(())
}

/// Rotate backup files: config.yaml.bak.1 → .bak.2 → ... → .bak.N
async fn rotate_backups(path: &Path) -> Result<()> {
    for i in (1..MAX_BACKUPS).rev() {
        let old = path.with_extension(format!("yaml.bak.{}", i));
        let new = path.with_extension(format!("yaml.bak.{}", i + 1));
        if old.exists() {
            if let Err(e) = fs::rename(&old, &new).await {
                warn!("Failed to rotate backup {}: {}", old.display(), e);
            }
        }
    }

    let bak = path.with_extension("yaml.bak.1");
    if let Err(e) = fs::copy(path, &bak).await {
        warn!("Failed to create backup {}: {}", bak.display(), e);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ProviderKind;

    #[tokio::test]
    async fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.yaml")).await.unwrap();
        assert_eq!(config.labels.len(), 3);
    }

    #[tokio::test]
    async fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_file_path(dir.path());

        let mut config = AquaLabelConfig::default();
        config.inference.provider = Some(ProviderKind::OpenAi);
        config.inference.model = Some("gpt-4o-mini".into());
        write_config(&config, &path).await.unwrap();

        let loaded = load_config(&path).await.unwrap();
        assert_eq!(loaded.inference.provider(), ProviderKind::OpenAi);
        assert_eq!(loaded.inference.model(), "gpt-4o-mini");
        assert!(!path.with_extension("yaml.tmp").exists());
    }

    #[tokio::test]
    async fn test_overwrite_keeps_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_file_path(dir.path());
        write_config(&AquaLabelConfig::default(), &path).await.unwrap();
        write_config(&AquaLabelConfig::default(), &path).await.unwrap();
        assert!(path.with_extension("yaml.bak.1").exists());
    }

    #[test]
    fn test_blank_document_is_default() {
        let config = parse_config("   \n").unwrap();
        assert_eq!(config.inference.model(), "llama3.2-vision");
        assert!(parse_config("inference: [not, a, map]").is_err());
    }
}
