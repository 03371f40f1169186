use aqualabel_config::InferenceConfig;
use aqualabel_core::{DEFAULT_INSTRUCTION, DEFAULT_VISION_MODEL};

/// Per-session inference parameters sent with every request.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceSettings {
    pub model: String,
    pub instruction: String,
    pub temperature: Option<f32>,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_VISION_MODEL.to_string(),
            instruction: DEFAULT_INSTRUCTION.to_string(),
            temperature: None,
        }
    }
}

impl InferenceSettings {
    pub fn from_config(config: &InferenceConfig) -> Self {
        Self {
            model: config.model().to_string(),
            instruction: config.instruction().to_string(),
            temperature: config.temperature,
        }
    }
}
