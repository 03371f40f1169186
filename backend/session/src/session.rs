use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use aqualabel_core::{
    AquaError, CaptureFault, CaptureSource, CaptureStream, CapturedImage, InferenceResult, Notice,
    SessionEvent, SessionEventKind, Stage, VisionProvider, VisionRequest,
};
use aqualabel_understanding::{extract, LabelSet, MineralReadings};
use logging::{redact_sensitive_data, SessionEventLogger};

use crate::job::{InferenceCompletion, InferenceJob, InferenceOutcome};
use crate::settings::InferenceSettings;

const CAMERA_DENIED_NOTICE: &str = "Could not access camera. Please check permissions.";

/// Each stage owns exactly the artifacts it may hold.
enum Phase {
    Idle,
    Capturing {
        stream: Box<dyn CaptureStream>,
    },
    Captured {
        image: CapturedImage,
    },
    Processing {
        image: CapturedImage,
    },
    Done {
        image: CapturedImage,
        result: InferenceResult,
        readings: MineralReadings,
    },
}

impl Phase {
    fn stage(&self) -> Stage {
        match self {
            Phase::Idle => Stage::Idle,
            Phase::Capturing { .. } => Stage::Capturing,
            Phase::Captured { .. } => Stage::Captured,
            Phase::Processing { .. } => Stage::Processing,
            Phase::Done { .. } => Stage::Done,
        }
    }
}

/// One capture → infer → extract workflow.
///
/// All mutation happens through `&mut self` on the foreground task. Inference
/// can be split into [`Session::begin_inference`] and
/// [`Session::apply_inference`] so the slow provider call runs elsewhere.
pub struct Session {
    id: Uuid,
    capture: Arc<dyn CaptureSource>,
    provider: Arc<dyn VisionProvider>,
    labels: LabelSet,
    settings: InferenceSettings,
    phase: Phase,
    /// Bumped on every retake; completions from older cycles are stale.
    cycle: u64,
    notice: Option<Notice>,
}

impl Session {
    pub fn new(
        capture: Arc<dyn CaptureSource>,
        provider: Arc<dyn VisionProvider>,
        labels: LabelSet,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            capture,
            provider,
            labels,
            settings: InferenceSettings::default(),
            phase: Phase::Idle,
            cycle: 0,
            notice: None,
        }
    }

    pub fn with_settings(mut self, settings: InferenceSettings) -> Self {
        self.settings = settings;
        self
    }

    // -- Accessors --------------------------------------------------------

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn stage(&self) -> Stage {
        self.phase.stage()
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn captured_image(&self) -> Option<&CapturedImage> {
        match &self.phase {
            Phase::Captured { image } | Phase::Processing { image } | Phase::Done { image, .. } => {
                Some(image)
            }
            Phase::Idle | Phase::Capturing { .. } => None,
        }
    }

    pub fn inference_result(&self) -> Option<&InferenceResult> {
        match &self.phase {
            Phase::Done { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn readings(&self) -> Option<&MineralReadings> {
        match &self.phase {
            Phase::Done { readings, .. } => Some(readings),
            _ => None,
        }
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    pub fn settings(&self) -> &InferenceSettings {
        &self.settings
    }

    pub fn capture_name(&self) -> &str {
        self.capture.name()
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// The last user-facing notification, if any.
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    // -- Transitions ------------------------------------------------------

    /// Idle → Capturing. Already capturing is a no-op.
    ///
    /// On refusal or device error the session stays Idle with no stream
    /// attached and an error notice is set.
    pub async fn start_capture(&mut self) -> Result<(), AquaError> {
        match self.stage() {
            Stage::Idle => {}
            Stage::Capturing => {
                debug!(session_id = %self.id, "Capture already running");
                return Ok(());
            }
            stage => return Err(invalid("start capture", stage)),
        }

        match self.capture.request_stream().await {
            Ok(stream) => {
                self.phase = Phase::Capturing { stream };
                self.notice = None;
                info!(session_id = %self.id, source = self.capture.name(), "Capture started");
                self.emit(SessionEventKind::CaptureStarted, json!({ "source": self.capture.name() }));
                Ok(())
            }
            Err(fault) => {
                warn!(session_id = %self.id, error = %fault, "Capture unavailable");
                self.notice = Some(Notice::error(capture_notice(&fault)));
                self.emit(SessionEventKind::CaptureFailed, json!({ "error": fault.to_string() }));
                Err(fault.into())
            }
        }
    }

    /// Capturing → Captured. Pulls one frame and releases the stream.
    ///
    /// If no frame can be read the stream stays up so the user can try again.
    pub async fn snapshot(&mut self) -> Result<(), AquaError> {
        let stage = self.stage();
        let frame = match &mut self.phase {
            Phase::Capturing { stream } => stream.capture_frame().await,
            _ => return Err(invalid("take a snapshot", stage)),
        };

        let image = match frame {
            Ok(image) => image,
            Err(fault) => {
                warn!(session_id = %self.id, error = %fault, "Snapshot failed");
                self.notice = Some(Notice::warning(format!("Could not take a snapshot: {fault}")));
                self.emit(SessionEventKind::SnapshotFailed, json!({ "error": fault.to_string() }));
                return Err(fault.into());
            }
        };

        if let Phase::Capturing { mut stream } = std::mem::replace(&mut self.phase, Phase::Idle) {
            stream.stop().await;
        }
        info!(session_id = %self.id, bytes = image.len(), format = %image.format(), "Snapshot taken");
        self.emit(
            SessionEventKind::SnapshotTaken,
            json!({ "bytes": image.len(), "format": image.format().to_string() }),
        );
        self.notice = None;
        self.phase = Phase::Captured { image };
        Ok(())
    }

    /// {Captured, Processing, Done} → Capturing, discarding every artifact.
    ///
    /// A pending inference from the old cycle is dropped when it completes.
    /// If the camera cannot be restarted the session is left Idle.
    pub async fn retake(&mut self) -> Result<(), AquaError> {
        let stage = self.stage();
        if !stage.can_retake() {
            return Err(invalid("retake", stage));
        }
        self.phase = Phase::Idle;
        self.cycle += 1;
        self.notice = None;
        info!(session_id = %self.id, cycle = self.cycle, from = %stage, "Retake");
        self.emit(SessionEventKind::Retake, json!({ "from": stage.as_str() }));
        self.start_capture().await
    }

    /// Captured → Processing, handing back the request to run.
    ///
    /// Returns `None` (and changes nothing) unless an image is waiting in
    /// Captured, which also makes a second trigger during Processing a no-op.
    pub fn begin_inference(&mut self) -> Option<InferenceJob> {
        let image = match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Captured { image } => image,
            other => {
                self.phase = other;
                debug!(session_id = %self.id, stage = %self.stage(), "Inference not started: nothing captured");
                return None;
            }
        };

        let request = VisionRequest {
            model: self.settings.model.clone(),
            instruction: self.settings.instruction.clone(),
            image: image.clone(),
            temperature: self.settings.temperature,
        };
        self.phase = Phase::Processing { image };
        self.notice = None;
        info!(session_id = %self.id, provider = self.provider.name(), model = %request.model, "Inference started");
        self.emit(
            SessionEventKind::InferenceStarted,
            json!({ "provider": self.provider.name(), "model": request.model }),
        );
        Some(InferenceJob {
            cycle: self.cycle,
            provider: self.provider.clone(),
            request,
        })
    }

    /// Processing → Done on success, Processing → Captured on failure.
    ///
    /// Completions for an older cycle, or arriving when the session is no
    /// longer Processing, are discarded.
    pub fn apply_inference(
        &mut self,
        completion: InferenceCompletion,
    ) -> Result<InferenceOutcome, AquaError> {
        if completion.cycle != self.cycle || self.stage() != Stage::Processing {
            debug!(
                session_id = %self.id,
                completion_cycle = completion.cycle,
                cycle = self.cycle,
                "Discarding stale inference result"
            );
            self.emit(
                SessionEventKind::InferenceDiscarded,
                json!({ "completion_cycle": completion.cycle }),
            );
            return Ok(InferenceOutcome::Discarded);
        }

        let image = match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Processing { image } => image,
            other => {
                self.phase = other;
                return Ok(InferenceOutcome::Discarded);
            }
        };

        let message = match completion.result {
            Ok(response) if !response.content.trim().is_empty() => {
                let result = InferenceResult::new(
                    response.content,
                    response.provider,
                    response.model,
                    response.latency_ms,
                );
                let readings = extract(result.text(), &self.labels);
                info!(
                    session_id = %self.id,
                    found = readings.found_count(),
                    of = readings.len(),
                    latency_ms = result.latency_ms(),
                    "Inference completed"
                );
                self.emit(
                    SessionEventKind::InferenceCompleted,
                    json!({
                        "latency_ms": result.latency_ms(),
                        "tokens_used": response.tokens_used,
                        "readings": &readings,
                    }),
                );
                self.phase = Phase::Done {
                    image,
                    result,
                    readings,
                };
                return Ok(InferenceOutcome::Completed);
            }
            Ok(_) => "empty response from model".to_string(),
            Err(e) => redact_sensitive_data(&format!("{e:#}")),
        };

        warn!(session_id = %self.id, provider = %completion.provider, error = %message, "Inference failed");
        self.emit(
            SessionEventKind::InferenceFailed,
            json!({ "provider": completion.provider, "error": message }),
        );
        self.notice = Some(Notice::error(format!("Inference failed: {message}")));
        self.phase = Phase::Captured { image };
        Err(AquaError::InferenceFailure {
            provider: completion.provider,
            message,
        })
    }

    /// Captured → Processing → {Done | Captured}, awaiting the provider inline.
    pub async fn run_inference(&mut self) -> Result<InferenceOutcome, AquaError> {
        match self.begin_inference() {
            Some(job) => {
                let completion = job.run().await;
                self.apply_inference(completion)
            }
            None => Ok(InferenceOutcome::Skipped),
        }
    }

    /// Release the camera if a stream is still running.
    pub async fn shutdown(&mut self) {
        if let Phase::Capturing { mut stream } = std::mem::replace(&mut self.phase, Phase::Idle) {
            stream.stop().await;
            debug!(session_id = %self.id, "Capture stream released on shutdown");
        }
    }

    fn emit(&self, kind: SessionEventKind, payload: serde_json::Value) {
        SessionEventLogger::log(&SessionEvent::new(self.id, self.cycle, kind, payload));
    }
}

fn invalid(op: &'static str, stage: Stage) -> AquaError {
    AquaError::InvalidTransition { op, stage }
}

fn capture_notice(fault: &CaptureFault) -> String {
    match fault {
        CaptureFault::PermissionDenied(_) => CAMERA_DENIED_NOTICE.to_string(),
        CaptureFault::DeviceUnavailable(reason) | CaptureFault::FrameUnavailable(reason) => {
            format!("Could not access camera: {reason}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aqualabel_core::ImageFormat;
    use aqualabel_inference::MockVisionProvider;
    use aqualabel_media::StubCapture;
    use aqualabel_understanding::MineralValue;

    const LABEL_TEXT: &str = "Bicarbonato: 80mg Cálcio: 30mg Magnésio: 10mg";

    fn session(capture: StubCapture, provider: MockVisionProvider) -> Session {
        Session::new(Arc::new(capture), Arc::new(provider), LabelSet::water_minerals())
    }

    fn jpeg(marker: u8) -> CapturedImage {
        CapturedImage::new(vec![0xFF, 0xD8, 0xFF, marker, 0xFF, 0xD9], ImageFormat::Jpeg)
    }

    fn value(session: &Session, field: &str) -> MineralValue {
        session.readings().unwrap().get(field).cloned().unwrap()
    }

    #[tokio::test]
    async fn test_end_to_end_reaches_done() {
        let mut session = session(StubCapture::new(), MockVisionProvider::new("mock").with_response(LABEL_TEXT));

        session.start_capture().await.unwrap();
        assert_eq!(session.stage(), Stage::Capturing);
        session.snapshot().await.unwrap();
        assert_eq!(session.stage(), Stage::Captured);

        let outcome = session.run_inference().await.unwrap();
        assert_eq!(outcome, InferenceOutcome::Completed);
        assert_eq!(session.stage(), Stage::Done);
        assert_eq!(session.inference_result().unwrap().text(), LABEL_TEXT);
        assert_eq!(value(&session, "bicarbonate"), MineralValue::Found("80".into()));
        assert_eq!(value(&session, "calcium"), MineralValue::Found("30".into()));
        assert_eq!(value(&session, "magnesium"), MineralValue::Found("10".into()));
    }

    #[tokio::test]
    async fn test_snapshot_releases_stream() {
        let capture = StubCapture::new();
        let stats = capture.stats();
        let mut session = session(capture, MockVisionProvider::new("mock"));

        session.start_capture().await.unwrap();
        assert_eq!(stats.live_streams(), 1);
        session.snapshot().await.unwrap();
        assert_eq!(stats.live_streams(), 0);
        assert!(session.captured_image().is_some());
    }

    #[tokio::test]
    async fn test_failed_inference_returns_to_captured() {
        let image = jpeg(0xE1);
        let mut session = session(
            StubCapture::new().with_frame(image.clone()),
            MockVisionProvider::new("mock").failing("connection refused"),
        );
        session.start_capture().await.unwrap();
        session.snapshot().await.unwrap();

        let err = session.run_inference().await.unwrap_err();
        assert!(matches!(err, AquaError::InferenceFailure { ref provider, .. } if provider == "mock"));
        assert_eq!(session.stage(), Stage::Captured);
        assert_eq!(session.captured_image().unwrap().data(), image.data());
        assert!(session.inference_result().is_none());
        assert!(session.readings().is_none());
        assert!(session.notice().unwrap().is_error());
    }

    #[tokio::test]
    async fn test_empty_content_is_a_failure() {
        let mut session = session(StubCapture::new(), MockVisionProvider::new("mock").with_response("  \n"));
        session.start_capture().await.unwrap();
        session.snapshot().await.unwrap();
        assert!(matches!(
            session.run_inference().await,
            Err(AquaError::InferenceFailure { .. })
        ));
        assert_eq!(session.stage(), Stage::Captured);
    }

    #[tokio::test]
    async fn test_failed_inference_can_be_retried() {
        let mut session = session(StubCapture::new(), MockVisionProvider::new("mock").failing("timeout"));
        session.start_capture().await.unwrap();
        session.snapshot().await.unwrap();
        assert!(session.run_inference().await.is_err());
        assert!(session.run_inference().await.is_err());
        assert_eq!(session.stage(), Stage::Captured);
    }

    #[tokio::test]
    async fn test_retake_clears_stale_results() {
        let first = jpeg(0xE1);
        let second = jpeg(0xE2);
        let mut session = session(
            StubCapture::new().with_frame(first.clone()).with_frame(second.clone()),
            MockVisionProvider::new("mock").with_response(LABEL_TEXT),
        );
        session.start_capture().await.unwrap();
        session.snapshot().await.unwrap();
        session.run_inference().await.unwrap();
        assert_eq!(session.stage(), Stage::Done);

        session.retake().await.unwrap();
        assert_eq!(session.stage(), Stage::Capturing);
        assert_eq!(session.cycle(), 1);
        assert!(session.captured_image().is_none());
        assert!(session.inference_result().is_none());
        assert!(session.readings().is_none());

        session.snapshot().await.unwrap();
        assert_eq!(session.stage(), Stage::Captured);
        assert_eq!(session.captured_image().unwrap().data(), second.data());
        assert_ne!(session.captured_image().unwrap().data(), first.data());
        assert!(session.inference_result().is_none());
    }

    #[tokio::test]
    async fn test_denied_capture_stays_idle() {
        let capture = StubCapture::denied();
        let stats = capture.stats();
        let mut session = session(capture, MockVisionProvider::new("mock"));

        let err = session.start_capture().await.unwrap_err();
        assert!(matches!(err, AquaError::CaptureUnavailable(CaptureFault::PermissionDenied(_))));
        assert!(err.is_retryable());
        assert_eq!(session.stage(), Stage::Idle);
        assert_eq!(stats.live_streams(), 0);
        assert_eq!(session.notice().unwrap().message, CAMERA_DENIED_NOTICE);
    }

    #[tokio::test]
    async fn test_failed_snapshot_keeps_stream() {
        let capture = StubCapture::new().failing_frames(CaptureFault::FrameUnavailable("black frame".into()));
        let stats = capture.stats();
        let mut session = session(capture, MockVisionProvider::new("mock"));

        session.start_capture().await.unwrap();
        assert!(session.snapshot().await.is_err());
        assert_eq!(session.stage(), Stage::Capturing);
        assert_eq!(stats.live_streams(), 1);
        assert!(session.take_notice().is_some());
        assert!(session.notice().is_none());

        session.shutdown().await;
        assert_eq!(session.stage(), Stage::Idle);
        assert_eq!(stats.live_streams(), 0);
    }

    #[tokio::test]
    async fn test_run_inference_without_image_is_noop() {
        let provider = Arc::new(MockVisionProvider::new("mock").with_response(LABEL_TEXT));
        let mut session = Session::new(
            Arc::new(StubCapture::new()),
            provider.clone(),
            LabelSet::water_minerals(),
        );

        assert_eq!(session.run_inference().await.unwrap(), InferenceOutcome::Skipped);
        assert_eq!(session.stage(), Stage::Idle);

        session.start_capture().await.unwrap();
        assert_eq!(session.run_inference().await.unwrap(), InferenceOutcome::Skipped);
        assert_eq!(session.stage(), Stage::Capturing);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_second_trigger_while_processing_is_ignored() {
        let mut session = session(StubCapture::new(), MockVisionProvider::new("mock").with_response(LABEL_TEXT));
        session.start_capture().await.unwrap();
        session.snapshot().await.unwrap();

        let job = session.begin_inference().unwrap();
        assert_eq!(session.stage(), Stage::Processing);
        assert!(session.captured_image().is_some());
        assert!(session.begin_inference().is_none());

        let outcome = session.apply_inference(job.run().await).unwrap();
        assert_eq!(outcome, InferenceOutcome::Completed);
    }

    #[tokio::test]
    async fn test_stale_completion_is_discarded() {
        let mut session = session(StubCapture::new(), MockVisionProvider::new("mock").with_response(LABEL_TEXT));
        session.start_capture().await.unwrap();
        session.snapshot().await.unwrap();
        let stale = session.begin_inference().unwrap();
        assert_eq!(stale.cycle(), 0);

        session.retake().await.unwrap();
        session.snapshot().await.unwrap();
        let fresh = session.begin_inference().unwrap();

        let outcome = session.apply_inference(stale.run().await).unwrap();
        assert_eq!(outcome, InferenceOutcome::Discarded);
        assert_eq!(session.stage(), Stage::Processing);

        let outcome = session.apply_inference(fresh.run().await).unwrap();
        assert_eq!(outcome, InferenceOutcome::Completed);
        assert_eq!(session.stage(), Stage::Done);
    }

    #[tokio::test]
    async fn test_invalid_transitions() {
        let mut session = session(StubCapture::new(), MockVisionProvider::new("mock"));
        assert!(matches!(
            session.snapshot().await,
            Err(AquaError::InvalidTransition { stage: Stage::Idle, .. })
        ));
        assert!(matches!(
            session.retake().await,
            Err(AquaError::InvalidTransition { stage: Stage::Idle, .. })
        ));

        session.start_capture().await.unwrap();
        session.start_capture().await.unwrap();
        assert_eq!(session.stage(), Stage::Capturing);
        session.snapshot().await.unwrap();
        assert!(matches!(
            session.start_capture().await,
            Err(AquaError::InvalidTransition { stage: Stage::Captured, .. })
        ));
    }

    #[tokio::test]
    async fn test_request_carries_settings() {
        let mut session = session(StubCapture::new(), MockVisionProvider::new("mock"))
            .with_settings(InferenceSettings {
                model: "llava:13b".into(),
                instruction: "List the minerals".into(),
                temperature: Some(0.1),
            });
        session.start_capture().await.unwrap();
        session.snapshot().await.unwrap();
        let job = session.begin_inference().unwrap();
        assert_eq!(job.request().model, "llava:13b");
        assert_eq!(job.request().instruction, "List the minerals");
        assert_eq!(job.request().temperature, Some(0.1));
        assert_eq!(job.request().image.format(), ImageFormat::Jpeg);
    }
}
