use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A structured record of something that happened to a session.
/// Every transition and failure is recorded as a SessionEvent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEvent {
    pub id: Uuid,
    pub session_id: Uuid,
    /// Capture cycle the event belongs to; bumped on every retake.
    pub cycle: u64,
    pub timestamp: DateTime<Utc>,
    pub kind: SessionEventKind,
    pub payload: serde_json::Value,
}

/// Categories of events that can occur during a session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionEventKind {
    /// The capture stream started
    CaptureStarted,
    /// The capture source refused or failed to start
    CaptureFailed,
    /// A still was taken and the stream released
    SnapshotTaken,
    /// A snapshot was requested but no frame could be read
    SnapshotFailed,
    /// Artifacts were cleared for a new capture cycle
    Retake,
    /// An inference request was dispatched
    InferenceStarted,
    /// Inference text arrived and readings were extracted
    InferenceCompleted,
    /// The inference request failed
    InferenceFailed,
    /// A result arrived for a superseded cycle and was dropped
    InferenceDiscarded,
}

impl SessionEvent {
    pub fn new(
        session_id: Uuid,
        cycle: u64,
        kind: SessionEventKind,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            cycle,
            timestamp: Utc::now(),
            kind,
            payload,
        }
    }
}

impl std::fmt::Display for SessionEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(String::from))
            .unwrap_or_else(|| format!("{:?}", self));
        write!(f, "{}", s)
    }
}

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A message the presentation layer should surface to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}
