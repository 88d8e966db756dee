
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::config::LlmConfig;
use crate::http::{agent_with_timeout, request_with_retry};
use crate::llm::ChatModel;
use crate::{RecommenderError, Result};

const CHAT_COMPLETIONS_PATH: &str = "/openai/v1/chat/completions";

/// Sampling temperature sent with every request
pub const TEMPERATURE: f32 = 0.0;

/// Blocking client for Groq's OpenAI-compatible chat completions endpoint
#[derive(Clone)]
pub struct GroqClient {
    base_url: Url,
    model: String,
    api_key: String,
    agent: ureq::Agent,
    retry_attempts: u32,
}

impl std::fmt::Debug for GroqClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroqClient")
            .field("base_url", &self.base_url.as_str())
            .field("model", &self.model)
            .field("retry_attempts", &self.retry_attempts)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl GroqClient {
    #[inline]
    pub fn new(config: &LlmConfig, api_key: impl Into<String>) -> Result<Self> {
        let base_url = config
            .base_url()
            .map_err(|e| RecommenderError::Config(e.to_string()))?;

        Ok(Self {
            base_url,
            model: config.model.clone(),
            api_key: api_key.into(),
            agent: agent_with_timeout(Duration::from_secs(config.timeout_secs)),
            retry_attempts: config.retry_attempts,
        })
    }

    /// Build a client with the key read from the configured environment variable
    #[inline]
    pub fn from_env(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key()
            .map_err(|e| RecommenderError::Config(e.to_string()))?;
        Self::new(config, api_key)
    }

    fn chat_completion(&self, prompt: &str) -> anyhow::Result<String> {
        let url = self
            .base_url
            .join(CHAT_COMPLETIONS_PATH)
            .context("Failed to build chat completions URL")?;

        let request = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: TEMPERATURE,
        };
        let request_json =
            serde_json::to_string(&request).context("Failed to serialize chat request")?;
        let authorization = format!("Bearer {}", self.api_key);

        debug!(
            "Requesting completion from {} (prompt length: {})",
            self.model,
            prompt.len()
        );

        let response_text = request_with_retry(self.base_url.as_str(), self.retry_attempts, || {
            self.agent
                .post(url.as_str())
                .header("Content-Type", "application/json")
                .header("Authorization", authorization.as_str())
                .send(request_json.as_str())
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })
        .context("Chat completion request failed")?;

        let response: ChatResponse =
            serde_json::from_str(&response_text).context("Failed to parse chat completion response")?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow::anyhow!("Chat completion returned no choices"))?;

        info!("Received completion from {} ({} chars)", self.model, content.len());
        Ok(content)
    }
}

impl ChatModel for GroqClient {
    fn complete(&self, prompt: &str) -> Result<String> {
        self.chat_completion(prompt)
            .map_err(|e| RecommenderError::Llm(format!("{:#}", e)))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
