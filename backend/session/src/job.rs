use std::sync::Arc;

use aqualabel_core::{VisionProvider, VisionRequest, VisionResponse};

/// An inference request detached from the session, so it can run on another task.
///
/// Produced by [`crate::Session::begin_inference`]; its completion goes back
/// through [`crate::Session::apply_inference`].
pub struct InferenceJob {
    pub(crate) cycle: u64,
    pub(crate) provider: Arc<dyn VisionProvider>,
    pub(crate) request: VisionRequest,
}

impl InferenceJob {
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn request(&self) -> &VisionRequest {
        &self.request
    }

    /// Call the provider. Runs to completion; there is no cancellation.
    pub async fn run(self) -> InferenceCompletion {
        let result = self.provider.describe(&self.request).await;
        InferenceCompletion {
            cycle: self.cycle,
            provider: self.provider.name().to_string(),
            result,
        }
    }
}

/// The provider's answer, tagged with the capture cycle it was asked for.
pub struct InferenceCompletion {
    pub cycle: u64,
    pub provider: String,
    pub result: anyhow::Result<VisionResponse>,
}

/// What `run_inference` / `apply_inference` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferenceOutcome {
    /// Result stored, readings extracted, stage is Done.
    Completed,
    /// No captured image to send; nothing happened.
    Skipped,
    /// The completion belonged to a superseded cycle and was dropped.
    Discarded,
}
