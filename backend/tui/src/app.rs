//! TUI App State
//!
//! Owns the session and the bits of view state the screen needs.

use aqualabel_core::Stage;
use aqualabel_session::{InferenceCompletion, Session};
use tracing::debug;

use crate::input::Intent;
use crate::render::wrapped_line_count;
use crate::worker::InferenceWorker;

pub struct AppState {
    pub session: Session,
    /// First visible line of the raw inference text.
    pub raw_scroll: u16,
    /// Text width of the model output pane, refreshed before each draw.
    pub raw_width: u16,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            raw_scroll: 0,
            raw_width: 80,
            should_quit: false,
        }
    }

    /// Apply one intent. Failures surface through the session notice.
    pub async fn dispatch(&mut self, intent: Intent, worker: &InferenceWorker) {
        let result = match intent {
            Intent::Capture => match self.session.stage() {
                Stage::Idle => self.session.start_capture().await,
                Stage::Capturing => self.session.snapshot().await,
                _ => Ok(()),
            },
            Intent::Retake => {
                if !self.session.stage().can_retake() {
                    return;
                }
                self.raw_scroll = 0;
                self.session.retake().await
            }
            Intent::RunInference => {
                if let Some(job) = self.session.begin_inference() {
                    self.raw_scroll = 0;
                    worker.spawn(job);
                }
                Ok(())
            }
            Intent::ScrollUp => {
                self.raw_scroll = self.raw_scroll.saturating_sub(1);
                Ok(())
            }
            Intent::ScrollDown => {
                if self.raw_scroll < self.max_raw_scroll() {
                    self.raw_scroll += 1;
                }
                Ok(())
            }
            Intent::Quit => {
                self.should_quit = true;
                Ok(())
            }
        };
        if let Err(e) = result {
            debug!(?intent, error = %e, "Intent failed");
        }
    }

    /// Last scroll offset that still shows the final row of model output.
    pub fn max_raw_scroll(&self) -> u16 {
        self.session
            .inference_result()
            .map(|r| wrapped_line_count(r.text(), self.raw_width).saturating_sub(1))
            .unwrap_or(0)
    }

    /// Feed a finished inference back into the session.
    pub fn apply_completion(&mut self, completion: InferenceCompletion) {
        if let Err(e) = self.session.apply_inference(completion) {
            debug!(error = %e, "Inference completion rejected");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aqualabel_inference::MockVisionProvider;
    use aqualabel_media::StubCapture;
    use aqualabel_understanding::LabelSet;
    use std::sync::Arc;
    use std::time::Duration;

    fn app(provider: MockVisionProvider) -> AppState {
        AppState::new(Session::new(
            Arc::new(StubCapture::new()),
            Arc::new(provider),
            LabelSet::water_minerals(),
        ))
    }

    #[tokio::test]
    async fn test_capture_key_starts_then_snaps() {
        let (worker, _rx) = InferenceWorker::channel();
        let mut app = app(MockVisionProvider::new("mock"));

        app.dispatch(Intent::Capture, &worker).await;
        assert_eq!(app.session.stage(), Stage::Capturing);
        app.dispatch(Intent::Capture, &worker).await;
        assert_eq!(app.session.stage(), Stage::Captured);
        app.dispatch(Intent::Capture, &worker).await;
        assert_eq!(app.session.stage(), Stage::Captured);
    }

    #[tokio::test]
    async fn test_inference_round_trip_through_worker() {
        let (worker, mut rx) = InferenceWorker::channel();
        let mut app = app(
            MockVisionProvider::new("mock")
                .with_response("Cálcio 45 mg")
                .with_delay(Duration::from_millis(50)),
        );

        app.dispatch(Intent::Capture, &worker).await;
        app.dispatch(Intent::Capture, &worker).await;
        app.dispatch(Intent::RunInference, &worker).await;
        assert_eq!(app.session.stage(), Stage::Processing);

        // The model is still thinking; a second press must not spawn another call.
        app.dispatch(Intent::RunInference, &worker).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(app.session.stage(), Stage::Processing);

        let completion = rx.recv().await.unwrap();
        app.apply_completion(completion);
        assert_eq!(app.session.stage(), Stage::Done);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_retake_during_processing_drops_old_result() {
        let (worker, mut rx) = InferenceWorker::channel();
        let mut app = app(MockVisionProvider::new("mock").with_response("Magnésio: 10mg"));

        app.dispatch(Intent::Capture, &worker).await;
        app.dispatch(Intent::Capture, &worker).await;
        app.dispatch(Intent::RunInference, &worker).await;
        app.dispatch(Intent::Retake, &worker).await;
        assert_eq!(app.session.stage(), Stage::Capturing);

        app.apply_completion(rx.recv().await.unwrap());
        assert_eq!(app.session.stage(), Stage::Capturing);
        assert!(app.session.readings().is_none());
    }

    #[tokio::test]
    async fn test_scroll_stops_at_end_of_output() {
        let (worker, _rx) = InferenceWorker::channel();
        let mut app = app(MockVisionProvider::new("mock").with_response("Cálcio 45 mg\nMagnésio 10 mg\nSódio 2 mg"));
        app.dispatch(Intent::Capture, &worker).await;
        app.dispatch(Intent::Capture, &worker).await;
        app.session.run_inference().await.unwrap();

        for _ in 0..10 {
            app.dispatch(Intent::ScrollDown, &worker).await;
        }
        assert_eq!(app.raw_scroll, 2);
        app.dispatch(Intent::ScrollUp, &worker).await;
        assert_eq!(app.raw_scroll, 1);

        // A narrow pane wraps each line, leaving more room to scroll.
        app.raw_width = 7;
        assert_eq!(app.max_raw_scroll(), 5);
    }

    #[tokio::test]
    async fn test_quit_and_scroll() {
        let (worker, _rx) = InferenceWorker::channel();
        let mut app = app(MockVisionProvider::new("mock"));
        app.dispatch(Intent::ScrollDown, &worker).await;
        assert_eq!(app.raw_scroll, 0);
        app.dispatch(Intent::ScrollUp, &worker).await;
        assert_eq!(app.raw_scroll, 0);
        app.dispatch(Intent::Quit, &worker).await;
        assert!(app.should_quit);
    }
}
