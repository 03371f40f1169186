pub mod mock;
pub mod ollama;
pub mod openai;

use std::sync::Arc;

use anyhow::{Context, Result};
use aqualabel_config::{InferenceConfig, ProviderKind};
use aqualabel_core::VisionProvider;

use self::ollama::OllamaProvider;
use self::openai::OpenAiProvider;

/// Build the provider selected by the inference config.
pub fn build_provider(config: &InferenceConfig) -> Result<Arc<dyn VisionProvider>> {
    let provider: Arc<dyn VisionProvider> = match config.provider() {
        ProviderKind::Ollama => Arc::new(
            OllamaProvider::new()
                .with_base_url(config.base_url())
                .with_timeout(config.timeout())?,
        ),
        ProviderKind::OpenAi => {
            let api_key = config
                .api_key
                .clone()
                .filter(|k| !k.is_empty())
                .context("inference.apiKey is required for the openai provider")?;
            Arc::new(
                OpenAiProvider::new(api_key)
                    .with_base_url(config.base_url())
                    .with_timeout(config.timeout())?,
            )
        }
    };
    tracing::debug!(provider = provider.name(), model = config.model(), "Built vision provider");
    Ok(provider)
}
