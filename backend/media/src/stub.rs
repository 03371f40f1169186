//! Scripted capture source for tests and demos.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use aqualabel_core::{CaptureFault, CaptureSource, CaptureStream, CapturedImage, ImageFormat};

/// Smallest byte string every sniffer accepts as a complete JPEG.
pub const TINY_JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0xFF, 0xD9];

/// Counters shared by a stub source and every stream it hands out.
#[derive(Debug, Default)]
pub struct StubStats {
    pub streams_started: AtomicUsize,
    pub streams_stopped: AtomicUsize,
    pub frames_taken: AtomicUsize,
}

impl StubStats {
    /// Streams started but not yet stopped.
    pub fn live_streams(&self) -> usize {
        self.streams_started.load(Ordering::SeqCst) - self.streams_stopped.load(Ordering::SeqCst)
    }
}

pub struct StubCapture {
    start_fault: Option<CaptureFault>,
    frame_fault: Option<CaptureFault>,
    frames: Mutex<VecDeque<CapturedImage>>,
    stats: Arc<StubStats>,
}

impl StubCapture {
    /// A camera that always yields [`TINY_JPEG`] unless frames are queued.
    pub fn new() -> Self {
        Self {
            start_fault: None,
            frame_fault: None,
            frames: Mutex::new(VecDeque::new()),
            stats: Arc::new(StubStats::default()),
        }
    }

    /// The user refuses camera access.
    pub fn denied() -> Self {
        Self::new().failing_start(CaptureFault::PermissionDenied("access refused".into()))
    }

    pub fn failing_start(mut self, fault: CaptureFault) -> Self {
        self.start_fault = Some(fault);
        self
    }

    /// The stream starts but never produces a frame.
    pub fn failing_frames(mut self, fault: CaptureFault) -> Self {
        self.frame_fault = Some(fault);
        self
    }

    /// Queue a specific frame; queued frames are served in order.
    pub fn with_frame(self, image: CapturedImage) -> Self {
        if let Ok(mut frames) = self.frames.lock() {
            frames.push_back(image);
        }
        self
    }

    pub fn stats(&self) -> Arc<StubStats> {
        self.stats.clone()
    }
}

impl Default for StubCapture {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaptureSource for StubCapture {
    fn name(&self) -> &str {
        "stub"
    }

    async fn request_stream(&self) -> Result<Box<dyn CaptureStream>, CaptureFault> {
        if let Some(fault) = &self.start_fault {
            return Err(fault.clone());
        }
        self.stats.streams_started.fetch_add(1, Ordering::SeqCst);
        let next = self.frames.lock().ok().and_then(|mut f| f.pop_front());
        Ok(Box::new(StubStream {
            frame: next,
            frame_fault: self.frame_fault.clone(),
            stats: self.stats.clone(),
            stopped: false,
        }))
    }
}

struct StubStream {
    frame: Option<CapturedImage>,
    frame_fault: Option<CaptureFault>,
    stats: Arc<StubStats>,
    stopped: bool,
}

#[async_trait]
impl CaptureStream for StubStream {
    async fn capture_frame(&mut self) -> Result<CapturedImage, CaptureFault> {
        if let Some(fault) = &self.frame_fault {
            return Err(fault.clone());
        }
        self.stats.frames_taken.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .frame
            .clone()
            .unwrap_or_else(|| CapturedImage::new(TINY_JPEG, ImageFormat::Jpeg).with_source("stub")))
    }

    async fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.stats.streams_stopped.fetch_add(1, Ordering::SeqCst);
        }
    }
}
