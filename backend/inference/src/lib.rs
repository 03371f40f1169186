//! Vision inference providers for AquaLabel.
//!
//! Every provider implements [`aqualabel_core::VisionProvider`]: one captured
//! image plus an instruction in, free-form model text out.

pub mod providers;

pub use providers::mock::MockVisionProvider;
pub use providers::ollama::OllamaProvider;
pub use providers::openai::OpenAiProvider;
pub use providers::build_provider;
