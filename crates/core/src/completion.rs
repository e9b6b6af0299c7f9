//! Remote completion service client.
//!
//! Speaks the OpenAI-style chat completions wire format over a plain JSON
//! `POST`, authenticated with a RapidAPI-style key header.

use crate::error::CompletionError;
use crate::fallback::ResponseSource;
use anyhow::Result;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_COMPLETION_URL: &str =
    "https://cheapest-gpt-4-turbo-gpt-4-vision-chatgpt-openai-ai-api.p.rapidapi.com/v1/chat/completions";

/// Connection and sampling settings for the completion service.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub url: String,
    pub api_key: SecretString,
    /// Sent as `x-rapidapi-host` when present.
    pub api_host: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

impl CompletionConfig {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            url: DEFAULT_COMPLETION_URL.to_string(),
            api_key,
            api_host: None,
            model: "gpt-4o".to_string(),
            max_tokens: 100,
            temperature: 0.9,
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub struct CompletionRequest<'a> {
    pub messages: Vec<ChatMessage<'a>>,
    pub model: &'a str,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

/// Builds the single-turn request body for `prompt`.
pub fn build_request<'a>(config: &'a CompletionConfig, prompt: &'a str) -> CompletionRequest<'a> {
    CompletionRequest {
        messages: vec![ChatMessage {
            role: "user",
            content: prompt,
        }],
        model: &config.model,
        max_tokens: config.max_tokens,
        temperature: config.temperature,
    }
}

/// Pulls `choices[0].message.content` out of a response body.
pub fn parse_completion(body: &str) -> Result<String, CompletionError> {
    let response: CompletionResponse =
        serde_json::from_str(body).map_err(|_| CompletionError::MalformedResponse)?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(CompletionError::MalformedResponse)
}

pub struct CompletionClient {
    http: reqwest::Client,
    config: CompletionConfig,
}

impl CompletionClient {
    /// Creates a client whose every request is bounded by `config.timeout`.
    pub fn new(config: CompletionConfig) -> Result<Self, CompletionError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    /// Sends `prompt` as a single user message and returns the first choice.
    pub async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let mut request = self
            .http
            .post(&self.config.url)
            .header("x-rapidapi-key", self.config.api_key.expose_secret())
            .json(&build_request(&self.config, prompt));
        if let Some(host) = &self.config.api_host {
            request = request.header("x-rapidapi-host", host);
        }

        let response = request.send().await?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            warn!(status = status.as_u16(), "Completion service rejected the request");
            return Err(CompletionError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        debug!(bytes = body.len(), "Completion received");
        parse_completion(&body)
    }
}

#[async_trait]
impl ResponseSource for CompletionClient {
    async fn respond(&self, prompt: &str) -> Result<String> {
        Ok(self.complete(prompt).await?)
    }
}
