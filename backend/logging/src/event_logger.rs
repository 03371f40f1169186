//! Session Event Logger
//!
//! Capture and inference lifecycle events written to the rolling NDJSON log.

use aqualabel_core::{SessionEvent, SessionEventKind};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::redact::redact_sensitive_data;

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub session_id: String,
    pub cycle: u64,
    pub timestamp: DateTime<Utc>,
    pub kind: SessionEventKind,
    pub payload: Value,
}

impl EventLogEntry {
    /// Builds a log entry with every string in the payload redacted.
    pub fn from_event(event: &SessionEvent) -> Self {
        Self {
            session_id: event.session_id.to_string(),
            cycle: event.cycle,
            timestamp: event.timestamp,
            kind: event.kind,
            payload: redact_value(&event.payload),
        }
    }
}

fn redact_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(redact_sensitive_data(s)),
        Value::Array(items) => Value::Array(items.iter().map(redact_value).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), redact_value(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

pub struct SessionEventLogger;

impl SessionEventLogger {
    /// Logs a session event on the `session_events` target.
    pub fn log(event: &SessionEvent) {
        let entry = EventLogEntry::from_event(event);
        let payload = entry.payload.to_string();
        if is_failure(entry.kind) {
            warn!(target: "session_events", session_id = %entry.session_id, cycle = entry.cycle, kind = %entry.kind, payload = %payload, "Session event");
        } else {
            info!(target: "session_events", session_id = %entry.session_id, cycle = entry.cycle, kind = %entry.kind, payload = %payload, "Session event");
        }
    }
}

fn is_failure(kind: SessionEventKind) -> bool {
    matches!(
        kind,
        SessionEventKind::CaptureFailed
            | SessionEventKind::SnapshotFailed
            | SessionEventKind::InferenceFailed
    )
}
