use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use aqualabel_core::{VisionProvider, VisionRequest, VisionResponse};

/// Ollama local vision model provider.
pub struct OllamaProvider {
    client: Client,
    base_url: String,
}

impl OllamaProvider {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: "http://localhost:11434".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Local vision models are slow; the whole request shares one deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build Ollama HTTP client")?;
        Ok(self)
    }
}

impl Default for OllamaProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Serialize, Deserialize)]
struct OllamaChatMessage {
    role: String,
    content: String,
    /// Raw base64, no data-URL prefix.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaChatMessage,
    eval_count: Option<u64>,
    prompt_eval_count: Option<u64>,
}

fn chat_request(request: &VisionRequest) -> OllamaChatRequest {
    OllamaChatRequest {
        model: request.model.clone(),
        messages: vec![OllamaChatMessage {
            role: "user".to_string(),
            content: request.instruction.clone(),
            images: vec![STANDARD.encode(request.image.data())],
        }],
        stream: false,
        options: request.temperature.map(|temperature| OllamaOptions { temperature }),
    }
}

#[async_trait]
impl VisionProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn describe(&self, request: &VisionRequest) -> Result<VisionResponse> {
        let start = Instant::now();
        let body = chat_request(request);

        debug!(model = %request.model, bytes = request.image.len(), "Sending image to Ollama");

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .context("Ollama HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama returned {}: {}", status, error_body);
        }

        let chat_response: OllamaChatResponse = response
            .json()
            .await
            .context("Failed to parse Ollama response")?;

        let tokens_used = chat_response.eval_count.unwrap_or(0)
            + chat_response.prompt_eval_count.unwrap_or(0);

        Ok(VisionResponse {
            content: chat_response.message.content,
            provider: "ollama".to_string(),
            model: request.model.clone(),
            tokens_used,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aqualabel_core::{CapturedImage, ImageFormat};

    fn request(temperature: Option<f32>) -> VisionRequest {
        VisionRequest {
            model: "llama3.2-vision".into(),
            instruction: "Gere uma tabela da composição química da agua".into(),
            image: CapturedImage::new(vec![0xFF, 0xD8, 0xFF, 0xD9], ImageFormat::Jpeg),
            temperature,
        }
    }

    #[test]
    fn test_request_carries_raw_base64_image() {
        let body = serde_json::to_value(chat_request(&request(None))).unwrap();
        assert_eq!(body["model"], "llama3.2-vision");
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["images"][0], "/9j/2Q==");
        assert!(body.get("options").is_none());
    }

    #[test]
    fn test_temperature_goes_into_options() {
        let body = serde_json::to_value(chat_request(&request(Some(0.0)))).unwrap();
        assert_eq!(body["options"]["temperature"], 0.0);
    }

    #[test]
    fn test_parse_response() {
        let raw = r#"{"model":"llama3.2-vision","message":{"role":"assistant","content":"Cálcio: 30 mg"},"done":true,"eval_count":12,"prompt_eval_count":40}"#;
        let parsed: OllamaChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.message.content, "Cálcio: 30 mg");
        assert!(parsed.message.images.is_empty());
        assert_eq!(parsed.eval_count, Some(12));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let provider = OllamaProvider::new().with_base_url("http://gpu-box:11434/");
        assert_eq!(provider.base_url, "http://gpu-box:11434");
    }
}
