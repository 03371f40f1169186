//! Builds a Session from the loaded config.

use std::sync::Arc;

use anyhow::{Context, Result};
use aqualabel_config::AquaLabelConfig;
use aqualabel_core::{CaptureSource, VisionProvider};
use aqualabel_inference::{build_provider, MockVisionProvider};
use aqualabel_session::{InferenceSettings, Session};
use tracing::info;

/// The configured provider, or a canned one when `--mock` is given.
pub fn provider(config: &AquaLabelConfig, mock: Option<&str>) -> Result<Arc<dyn VisionProvider>> {
    match mock {
        Some(text) => {
            info!("Using mock vision provider");
            Ok(Arc::new(MockVisionProvider::new("mock").with_response(text)))
        }
        None => build_provider(&config.inference),
    }
}

pub fn session(
    config: &AquaLabelConfig,
    capture: Arc<dyn CaptureSource>,
    mock: Option<&str>,
) -> Result<Session> {
    let labels = config.label_set().context("Invalid label configuration")?;
    let provider = provider(config, mock)?;
    let session = Session::new(capture, provider, labels)
        .with_settings(InferenceSettings::from_config(&config.inference));
    info!(
        session_id = %session.id(),
        capture = session.capture_name(),
        provider = session.provider_name(),
        model = %session.settings().model,
        "Session ready"
    );
    Ok(session)
}
