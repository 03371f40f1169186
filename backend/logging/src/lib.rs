//! Telemetry and structured logging components for AquaLabel.
//!
//! Handles log redaction, JSON output generation, file rotation, and session event logging.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{EventLogEntry, SessionEventLogger};
pub use logger::{init_logger, LogOutput};
pub use redact::redact_sensitive_data;
