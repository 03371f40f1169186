//! Structured Logger
//!
//! Wraps `tracing` to provide JSON-formatted output, file rotation (NDJSON),
//! and environment-based level control.

use anyhow::Context;
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Where human-readable log lines go besides the rolling file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    /// Console on stderr plus the NDJSON file.
    Console,
    /// NDJSON file only; the terminal belongs to the TUI.
    FileOnly,
}

/// Initialize the global structured logger.
///
/// `RUST_LOG` overrides `level`. A second call is a no-op.
pub fn init_logger<P: AsRef<Path>>(log_dir: P, level: &str, output: LogOutput) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Rolling file appender: writes NDJSON to `logs/aqualabel.log.YYYY-MM-DD`
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("aqualabel.log")
        .build(log_dir.as_ref())
        .with_context(|| format!("Failed to open log directory {}", log_dir.as_ref().display()))?;

    let file_layer = fmt::layer()
        .json()
        .with_writer(file_appender)
        .with_ansi(false);

    // stdout is reserved for command output (`--json`)
    let console_layer = (output == LogOutput::Console).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_ansi(true)
            .boxed()
    });

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();
    Ok(())
}
