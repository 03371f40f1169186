//! CLI Extract Command
//!
//! Runs the mineral extractor over text, without camera or model.

use std::path::Path;

use anyhow::{Context, Result};
use aqualabel_config::AquaLabelConfig;
use aqualabel_understanding::extract;
use tokio::io::AsyncReadExt;

use crate::terminal_output::readings_table;

pub async fn run(config: &AquaLabelConfig, file: Option<&Path>, json: bool) -> Result<()> {
    let text = match file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("Failed to read stdin")?;
            buf
        }
    };

    let labels = config.label_set().context("Invalid label configuration")?;
    let readings = extract(&text, &labels);
    if json {
        println!("{}", serde_json::to_string_pretty(&readings)?);
    } else {
        println!("{}", readings_table(&readings, &labels));
    }
    Ok(())
}
