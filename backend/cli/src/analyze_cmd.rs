//! CLI Analyze Command
//!
//! One non-interactive pass over an image file: snapshot, infer, extract.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use aqualabel_config::AquaLabelConfig;
use aqualabel_media::StillFileCapture;
use aqualabel_session::Session;
use serde_json::{json, Value};

use crate::terminal_output::{note_success, readings_table, DIM, RESET};
use crate::wiring;

pub async fn run(config: &AquaLabelConfig, mock: Option<&str>, image: &Path, json: bool) -> Result<()> {
    let capture = Arc::new(StillFileCapture::new(image));
    let mut session = wiring::session(config, capture, mock)?;
    analyze(&mut session)
        .await
        .with_context(|| format!("Failed to analyze {}", image.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report(&session))?);
    } else {
        print_human(&session);
    }
    Ok(())
}

async fn analyze(session: &mut Session) -> Result<()> {
    session.start_capture().await?;
    session.snapshot().await?;
    session.run_inference().await?;
    Ok(())
}

fn report(session: &Session) -> Value {
    let image = session.captured_image();
    let result = session.inference_result();
    json!({
        "image": image.map(|i| json!({
            "format": i.format().to_string(),
            "bytes": i.len(),
            "source": i.source(),
        })),
        "provider": result.map(|r| r.provider()),
        "model": result.map(|r| r.model()),
        "latencyMs": result.map(|r| r.latency_ms()),
        "readings": session.readings(),
        "text": result.map(|r| r.text()),
    })
}

fn print_human(session: &Session) {
    if let Some(readings) = session.readings() {
        println!("{}", readings_table(readings, session.labels()));
    }
    if let Some(result) = session.inference_result() {
        note_success(&format!(
            "{} / {} answered in {} ms",
            result.provider(),
            result.model(),
            result.latency_ms()
        ));
        println!("\n{DIM}{}{RESET}", result.text());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aqualabel_core::Stage;

    async fn analyzed(response: &str) -> Session {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("label.jpg");
        tokio::fs::write(&path, aqualabel_media::TINY_JPEG).await.unwrap();
        let mut session = wiring::session(
            &AquaLabelConfig::default(),
            Arc::new(StillFileCapture::new(&path)),
            Some(response),
        )
        .unwrap();
        analyze(&mut session).await.unwrap();
        session
    }

    #[tokio::test]
    async fn test_analyze_with_mock() {
        let session = analyzed("Bicarbonato: 80mg Cálcio: 30mg Magnésio: 10mg").await;
        assert_eq!(session.stage(), Stage::Done);

        let report = report(&session);
        assert_eq!(report["readings"]["bicarbonate"], "80");
        assert_eq!(report["readings"]["magnesium"], "10");
        assert_eq!(report["image"]["format"], "JPEG");
        assert_eq!(report["provider"], "mock");
    }

    #[tokio::test]
    async fn test_missing_minerals_are_null() {
        let session = analyzed("Sódio 5 mg").await;
        let report = report(&session);
        assert!(report["readings"]["calcium"].is_null());
    }

    #[tokio::test]
    async fn test_missing_image_fails() {
        let mut session = wiring::session(
            &AquaLabelConfig::default(),
            Arc::new(StillFileCapture::new("/nonexistent/label.jpg")),
            Some("x"),
        )
        .unwrap();
        assert!(analyze(&mut session).await.is_err());
        assert_eq!(session.stage(), Stage::Idle);
    }
}
