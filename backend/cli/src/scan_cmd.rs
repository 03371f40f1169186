//! CLI Scan Command
//!
//! The interactive camera screen.

use anyhow::Result;
use aqualabel_config::AquaLabelConfig;
use aqualabel_media::build_capture_source;

use crate::wiring;

pub async fn run(config: &AquaLabelConfig, mock: Option<&str>) -> Result<()> {
    let capture = build_capture_source(&config.capture)?;
    let session = wiring::session(config, capture, mock)?;
    tui::run(session).await
}
