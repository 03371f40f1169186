pub mod error;
pub mod event;
pub mod traits;
pub mod types;

pub use error::{AquaError, CaptureFault};
pub use event::{Notice, NoticeLevel, SessionEvent, SessionEventKind};
pub use traits::{CaptureSource, CaptureStream, VisionProvider, VisionRequest, VisionResponse};
pub use types::{CapturedImage, ImageFormat, InferenceResult, Stage};

/// Instruction sent alongside the captured label photo.
pub const DEFAULT_INSTRUCTION: &str = "Gere uma tabela da composição química da agua";

/// Vision model used when the config does not name one.
pub const DEFAULT_VISION_MODEL: &str = "llama3.2-vision";
