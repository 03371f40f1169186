//! CLI Config Command
//!
//! Show, create and locate the config file.

use std::path::Path;

use anyhow::{Context, Result};
use aqualabel_config::{
    apply_all_defaults, collect_redacted_paths, load_config, redact, validate, write_config,
    AquaLabelConfig,
};

use crate::terminal_output::{note_info, note_success, note_warn};

/// Effective config as YAML, secrets masked. `${VAR}` references are shown unresolved.
pub fn render(config: AquaLabelConfig) -> Result<String> {
    let effective = apply_all_defaults(config);
    let value = serde_json::to_value(&effective).context("Failed to serialize config")?;
    Ok(serde_yaml::to_string(&redact(&value))?)
}

pub async fn show(path: &Path) -> Result<()> {
    if !path.exists() {
        note_info(&format!("{} does not exist; showing defaults", path.display()));
    }
    let config = load_config(path).await?;
    let report = validate(&apply_all_defaults(config.clone()));
    let masked = collect_redacted_paths(&serde_json::to_value(&config)?);
    print!("{}", render(config)?);
    if !masked.is_empty() {
        note_info(&format!("Masked: {}", masked.join(", ")));
    }
    for issue in report.errors.iter().chain(report.warnings.iter()) {
        note_warn(&issue.to_string());
    }
    Ok(())
}

pub async fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    write_config(&apply_all_defaults(AquaLabelConfig::default()), path).await?;
    note_success(&format!("Wrote {}", path.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aqualabel_config::ProviderKind;

    #[test]
    fn test_render_masks_api_key() {
        let mut config = AquaLabelConfig::default();
        config.inference.provider = Some(ProviderKind::OpenAi);
        config.inference.api_key = Some("sk-live-0123456789".into());
        let yaml = render(config).unwrap();
        assert!(yaml.contains("sk-l***"));
        assert!(!yaml.contains("0123456789"));
        assert!(yaml.contains("https://api.openai.com/v1"));
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        init(&path, false).await.unwrap();
        assert!(init(&path, false).await.is_err());
        init(&path, true).await.unwrap();

        let written = load_config(&path).await.unwrap();
        assert_eq!(written.inference.model(), "llama3.2-vision");
    }
}
