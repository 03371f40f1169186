//! Inference Worker
//!
//! Runs provider calls off the UI loop and delivers each completion back over
//! a channel, so the screen keeps redrawing while the model thinks.

use aqualabel_session::{InferenceCompletion, InferenceJob};
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Clone)]
pub struct InferenceWorker {
    tx: mpsc::UnboundedSender<InferenceCompletion>,
}

impl InferenceWorker {
    /// A worker and the receiving end the UI loop polls.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<InferenceCompletion>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Spawn the job; it runs to completion even if the UI has moved on.
    pub fn spawn(&self, job: InferenceJob) {
        let tx = self.tx.clone();
        debug!(cycle = job.cycle(), "Spawning inference task");
        tokio::spawn(async move {
            let completion = job.run().await;
            // Receiver gone means the app quit.
            let _ = tx.send(completion);
        });
    }
}
