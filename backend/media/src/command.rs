//! Camera capture through an external program.
//!
//! The program (ffmpeg, rpicam-still --signal --loop, ...) runs for the
//! lifetime of the stream and keeps rewriting one frame file. A snapshot reads
//! the latest complete frame; stopping the stream kills the program.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, info, warn};

use aqualabel_config::CaptureConfig;
use aqualabel_core::{CaptureFault, CaptureSource, CaptureStream, CapturedImage};

use crate::mime_detect::{detect_format, is_complete_frame};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How much of the camera program's stderr is kept for error messages.
const STDERR_TAIL_BYTES: usize = 8 * 1024;

/// Grace period for the stderr reader to hit EOF after the program exits.
const STDERR_FLUSH: Duration = Duration::from_millis(500);

/// Capture source backed by a long-running camera program.
pub struct CommandCapture {
    program: String,
    args: Vec<String>,
    frame_path: PathBuf,
    warmup: Duration,
    frame_timeout: Duration,
}

impl CommandCapture {
    pub fn new(program: impl Into<String>, args: Vec<String>, frame_path: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args,
            frame_path: frame_path.into(),
            warmup: Duration::from_millis(500),
            frame_timeout: Duration::from_secs(5),
        }
    }

    pub fn from_config(config: &CaptureConfig) -> Self {
        Self::new(config.program(), config.args(), config.frame_path())
            .with_warmup(config.warmup())
            .with_frame_timeout(config.frame_timeout())
    }

    /// Give the camera a moment to adjust exposure before frames are trusted.
    pub fn with_warmup(mut self, warmup: Duration) -> Self {
        self.warmup = warmup;
        self
    }

    pub fn with_frame_timeout(mut self, timeout: Duration) -> Self {
        self.frame_timeout = timeout;
        self
    }

    fn expanded_args(&self) -> Vec<String> {
        let frame = self.frame_path.to_string_lossy();
        self.args.iter().map(|a| a.replace("{frame}", &frame)).collect()
    }
}

fn spawn_fault(program: &str, err: std::io::Error) -> CaptureFault {
    match err.kind() {
        std::io::ErrorKind::PermissionDenied => {
            CaptureFault::PermissionDenied(format!("cannot run {program}: {err}"))
        }
        _ => CaptureFault::DeviceUnavailable(format!("cannot start {program}: {err}")),
    }
}

/// Map an early exit to a fault, using stderr to tell refusals from missing devices.
fn exit_fault(program: &str, status: ExitStatus, stderr: &str) -> CaptureFault {
    let detail = stderr
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("no output")
        .trim()
        .to_string();
    let lowered = stderr.to_lowercase();
    if lowered.contains("permission denied") || lowered.contains("operation not permitted") {
        CaptureFault::PermissionDenied(format!("{program}: {detail}"))
    } else {
        CaptureFault::DeviceUnavailable(format!("{program} exited with {status}: {detail}"))
    }
}

/// Continuously drains the program's stderr, keeping only the last few KiB.
///
/// A pipe nobody reads fills up and blocks the writer, which would freeze the
/// frame file on whatever was written last.
#[derive(Clone, Default)]
struct StderrTail {
    buf: Arc<Mutex<VecDeque<u8>>>,
}

impl StderrTail {
    fn drain(child: &mut Child) -> (Self, Option<JoinHandle<()>>) {
        let tail = Self::default();
        let reader = child.stderr.take().map(|mut stderr| {
            let tail = tail.clone();
            tokio::spawn(async move {
                let mut chunk = [0u8; 4096];
                loop {
                    match stderr.read(&mut chunk).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => tail.push(&chunk[..n]),
                    }
                }
            })
        });
        (tail, reader)
    }

    fn push(&self, bytes: &[u8]) {
        if let Ok(mut buf) = self.buf.lock() {
            buf.extend(bytes);
            let excess = buf.len().saturating_sub(STDERR_TAIL_BYTES);
            buf.drain(..excess);
        }
    }

    fn text(&self) -> String {
        match self.buf.lock() {
            Ok(buf) => {
                let bytes: Vec<u8> = buf.iter().copied().collect();
                String::from_utf8_lossy(&bytes).into_owned()
            }
            Err(_) => String::new(),
        }
    }

    fn last_line(&self) -> Option<String> {
        self.text()
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .map(|l| l.trim().to_string())
    }
}

/// Wait briefly for the reader to collect what an exited program left behind.
async fn flush_stderr(reader: Option<JoinHandle<()>>) {
    if let Some(reader) = reader {
        let _ = timeout(STDERR_FLUSH, reader).await;
    }
}

#[async_trait]
impl CaptureSource for CommandCapture {
    fn name(&self) -> &str {
        &self.program
    }

    async fn request_stream(&self) -> Result<Box<dyn CaptureStream>, CaptureFault> {
        // A frame left by a previous run must not pass for a fresh one.
        let _ = tokio::fs::remove_file(&self.frame_path).await;

        let args = self.expanded_args();
        info!("Capture command: {} {}", self.program, args.join(" "));

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| spawn_fault(&self.program, e))?;
        let (stderr, reader) = StderrTail::drain(&mut child);

        sleep(self.warmup).await;

        let child = match child.try_wait() {
            Ok(None) => Some(child),
            // One-shot still programs exit once the frame is written.
            Ok(Some(status)) if status.success() && self.frame_path.exists() => None,
            Ok(Some(status)) => {
                flush_stderr(reader).await;
                let fault = exit_fault(&self.program, status, &stderr.text());
                warn!(program = %self.program, %status, "Camera program exited early");
                return Err(fault);
            }
            Err(e) => {
                return Err(CaptureFault::DeviceUnavailable(format!(
                    "cannot query {}: {e}",
                    self.program
                )));
            }
        };

        debug!(program = %self.program, frame = %self.frame_path.display(), "Camera stream running");
        Ok(Box::new(CommandStream {
            child,
            program: self.program.clone(),
            frame_path: self.frame_path.clone(),
            frame_timeout: self.frame_timeout,
            stderr,
        }))
    }
}

/// A running camera program and the frame file it refreshes.
pub struct CommandStream {
    child: Option<Child>,
    program: String,
    frame_path: PathBuf,
    frame_timeout: Duration,
    stderr: StderrTail,
}

impl CommandStream {
    async fn read_frame(path: &Path) -> Option<Vec<u8>> {
        let data = tokio::fs::read(path).await.ok()?;
        is_complete_frame(&data).then_some(data)
    }

    fn program_exited(&mut self) -> Option<ExitStatus> {
        self.child.as_mut().and_then(|c| c.try_wait().ok().flatten())
    }
}

#[async_trait]
impl CaptureStream for CommandStream {
    async fn capture_frame(&mut self) -> Result<CapturedImage, CaptureFault> {
        let deadline = Instant::now() + self.frame_timeout;
        loop {
            if let Some(data) = Self::read_frame(&self.frame_path).await {
                let format = detect_format(&data, &self.frame_path);
                debug!(bytes = data.len(), %format, "Read frame");
                return Ok(CapturedImage::new(data, format).with_source(self.program.clone()));
            }
            if let Some(status) = self.program_exited() {
                let detail = self.stderr.last_line().unwrap_or_else(|| "no output".to_string());
                return Err(CaptureFault::FrameUnavailable(format!(
                    "{} exited with {status} before writing a frame: {detail}",
                    self.program
                )));
            }
            if Instant::now() >= deadline {
                return Err(CaptureFault::FrameUnavailable(format!(
                    "no complete frame from {} within {} ms",
                    self.program,
                    self.frame_timeout.as_millis()
                )));
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.start_kill();
            let _ = child.wait().await;
            info!(program = %self.program, "Camera stream stopped");
        }
        let _ = tokio::fs::remove_file(&self.frame_path).await;
    }
}

impl Drop for CommandStream {
    fn drop(&mut self) {
        // The child is killed by kill_on_drop; only the frame file is left.
        if self.child.is_some() {
            let _ = std::fs::remove_file(&self.frame_path);
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use aqualabel_core::ImageFormat;

    fn sh(script: &str, frame: &Path) -> CommandCapture {
        CommandCapture::new("sh", vec!["-c".into(), script.into()], frame)
            .with_warmup(Duration::from_millis(150))
            .with_frame_timeout(Duration::from_millis(400))
    }

    #[tokio::test]
    async fn test_reads_frame_and_stops() {
        let dir = tempfile::tempdir().unwrap();
        let frame = dir.path().join("frame.jpg");
        let source = sh(r"printf '\377\330\377\340\377\331' > {frame}; sleep 10", &frame);

        let mut stream = source.request_stream().await.unwrap();
        let image = stream.capture_frame().await.unwrap();
        assert_eq!(image.format(), ImageFormat::Jpeg);
        assert_eq!(image.len(), 6);
        assert_eq!(image.source(), "sh");

        stream.stop().await;
        assert!(!frame.exists());
    }

    #[tokio::test]
    async fn test_chatty_program_keeps_refreshing_frame() {
        let dir = tempfile::tempdir().unwrap();
        let frame = dir.path().join("frame.jpg");
        let script = r"printf '\377\330\377\340\377\331' > {frame}; \
            head -c 200000 /dev/zero >&2; \
            printf '\377\330\377\341\377\331' > {frame}; sleep 10";
        let source = sh(script, &frame).with_warmup(Duration::from_millis(400));

        let mut stream = source.request_stream().await.unwrap();
        let image = stream.capture_frame().await.unwrap();
        assert_eq!(image.data()[3], 0xE1);
        stream.stop().await;
    }

    #[test]
    fn test_stderr_tail_is_bounded() {
        let tail = StderrTail::default();
        tail.push(&vec![b'x'; STDERR_TAIL_BYTES * 3]);
        tail.push(b"\n/dev/video0: Device or resource busy\n");
        assert_eq!(tail.text().len(), STDERR_TAIL_BYTES);
        assert_eq!(
            tail.last_line().as_deref(),
            Some("/dev/video0: Device or resource busy")
        );
    }

    #[tokio::test]
    async fn test_missing_program_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let source = CommandCapture::new("aqualabel-no-such-camera", vec![], dir.path().join("f.jpg"));
        let err = source.request_stream().await.err().unwrap();
        assert!(matches!(err, CaptureFault::DeviceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_permission_refusal_from_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let source = sh(
            "echo '/dev/video0: Permission denied' >&2; exit 1",
            &dir.path().join("f.jpg"),
        );
        let err = source.request_stream().await.err().unwrap();
        assert!(matches!(err, CaptureFault::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn test_no_frame_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let source = sh("sleep 10", &dir.path().join("f.jpg"));
        let mut stream = source.request_stream().await.unwrap();
        let err = stream.capture_frame().await.unwrap_err();
        assert!(matches!(err, CaptureFault::FrameUnavailable(_)));
        stream.stop().await;
    }
}
