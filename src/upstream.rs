//! Adapter for an OpenAI-style chat-completions endpoint.

use crate::config::Model;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("response contained no message content")]
    EmptyResponse,
}

/// Per-request overrides of the configured sampling defaults.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ModelParameters {
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn model_name(&self) -> &str;
    async fn complete(
        &self,
        prompt: &str,
        context: &[String],
        params: &ModelParameters,
    ) -> Result<String, UpstreamError>;
}

/// Context strings become system messages, in order, ahead of the prompt.
pub fn build_request(cfg: &Model, prompt: &str, context: &[String], params: &ModelParameters) -> ChatRequest {
    let mut messages: Vec<ChatMessage> = context
        .iter()
        .map(|c| ChatMessage { role: "system".into(), content: c.clone() })
        .collect();
    messages.push(ChatMessage { role: "user".into(), content: prompt.to_string() });
    ChatRequest {
        model: cfg.model.clone(),
        messages,
        temperature: params.temperature.unwrap_or(cfg.temperature),
        max_tokens: params.max_tokens.unwrap_or(cfg.max_tokens),
    }
}

pub struct OpenAiClient {
    http: reqwest::Client,
    cfg: Model,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(cfg: Model, api_key: String) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self { http, cfg, api_key })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.cfg.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    fn model_name(&self) -> &str { &self.cfg.model }

    async fn complete(
        &self,
        prompt: &str,
        context: &[String],
        params: &ModelParameters,
    ) -> Result<String, UpstreamError> {
        let body = build_request(&self.cfg, prompt, context, params);
        tracing::debug!(model = %body.model, messages = body.messages.len(), "forwarding prompt");
        let resp = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(UpstreamError::Status { status: status.as_u16(), body });
        }
        let parsed: ChatResponse = resp.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(UpstreamError::EmptyResponse)
    }
}
