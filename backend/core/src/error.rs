use thiserror::Error;

use crate::types::Stage;

/// Why the capture source could not deliver a stream or a frame.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CaptureFault {
    #[error("camera permission denied: {0}")]
    PermissionDenied(String),

    #[error("capture device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("no frame available: {0}")]
    FrameUnavailable(String),
}

/// Top-level error type for the AquaLabel runtime.
#[derive(Debug, Error)]
pub enum AquaError {
    #[error("capture unavailable: {0}")]
    CaptureUnavailable(#[from] CaptureFault),

    #[error("inference failed ({provider}): {message}")]
    InferenceFailure { provider: String, message: String },

    #[error("cannot {op} while {stage}")]
    InvalidTransition { op: &'static str, stage: Stage },
}

impl AquaError {
    /// Whether the user can recover by retrying the same action.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AquaError::CaptureUnavailable(_) | AquaError::InferenceFailure { .. }
        )
    }
}
