//! Anthropic Messages API client
//!
//! One user message in, the first text block out. Constructed once at
//! startup and shared via `Arc`.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::{AppError, AppResult, ErrorCode, LlmConfig};
use crate::utils::constants::{ANTHROPIC_VERSION, USER_AGENT as USER_AGENT_CONST};

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

pub struct AnthropicClient {
    config: LlmConfig,
    client: reqwest::Client,
}

impl AnthropicClient {
    pub fn new(config: LlmConfig) -> AppResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_CONST));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .gzip(true)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {}", e)))?;

        info!("🤖 Model client ready: {} (max_tokens {})", config.model, config.max_tokens);
        Ok(Self { config, client })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Send one prompt, return the reply text
    pub async fn complete(&self, prompt: &str) -> AppResult<String> {
        let url = format!("{}/messages", self.config.base_url.trim_end_matches('/'));
        let body = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        debug!("📤 Prompt sent ({} chars)", prompt.len());

        let response = self
            .client
            .post(url)
            .header("x-api-key", self.config.api_key.expose())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::new(ErrorCode::ExternalTimeout, "Model request timed out")
                } else {
                    AppError::ai_request_failed(format!("Model request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<response unavailable>".to_string());
            return Err(AppError::ai_request_failed(format!(
                "Model API returned {}: {}",
                status, text
            )));
        }

        let reply: MessagesResponse = response.json().await.map_err(|e| {
            AppError::new(
                ErrorCode::AiUnexpectedResponse,
                format!("Model response invalid: {}", e),
            )
        })?;

        let first = reply.content.into_iter().next();
        match first {
            Some(ContentBlock { kind, text: Some(text) }) if kind == "text" => {
                debug!(
                    "📥 Reply received ({} chars, stop: {})",
                    text.len(),
                    reply.stop_reason.as_deref().unwrap_or("unknown")
                );
                Ok(text)
            }
            Some(block) => Err(AppError::new(
                ErrorCode::AiUnexpectedResponse,
                format!("Unexpected response type from model: {}", block.kind),
            )),
            None => Err(AppError::new(
                ErrorCode::AiUnexpectedResponse,
                "Unexpected response type from model: empty content",
            )),
        }
    }
}
