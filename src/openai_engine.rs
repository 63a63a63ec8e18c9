use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

use crate::engine::{InferenceClient, InferenceError};
use crate::types::RenderedRequest;

#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            timeout: Duration::from_secs(60),
        }
    }
}

impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_base", &self.api_base)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

/// Chat-completions client for OpenAI-compatible endpoints.
pub struct OpenAiEngine {
    client: Client,
    endpoint: String,
    config: OpenAiConfig,
}

impl OpenAiEngine {
    #[tracing::instrument(skip(config), fields(model = %config.model, api_base = %config.api_base))]
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            anyhow::bail!("An API key must be provided");
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to create HTTP client")?;
        let endpoint = format!("{}/chat/completions", config.api_base.trim_end_matches('/'));

        tracing::info!(endpoint = %endpoint, "Inference client ready");
        Ok(Self {
            client,
            endpoint,
            config,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn exchange(
        &self,
        body: &ChatCompletionRequest<'_>,
    ) -> Result<(StatusCode, String), reqwest::Error> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        Ok((status, text))
    }
}

fn status_error(status: StatusCode, body: String) -> InferenceError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => InferenceError::Unauthorized {
            status: status.as_u16(),
            body,
        },
        StatusCode::TOO_MANY_REQUESTS => InferenceError::RateLimited(body),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => InferenceError::Timeout,
        _ => InferenceError::Provider {
            status: status.as_u16(),
            body,
        },
    }
}

fn transport_error(err: reqwest::Error) -> InferenceError {
    if err.is_timeout() {
        InferenceError::Timeout
    } else {
        InferenceError::Transport(err.to_string())
    }
}

#[async_trait]
impl InferenceClient for OpenAiEngine {
    #[tracing::instrument(skip(self, request), fields(model = %self.config.model))]
    async fn infer(&self, request: &RenderedRequest) -> Result<String, InferenceError> {
        let body = ChatCompletionRequest {
            model: &self.config.model,
            temperature: self.config.temperature,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
        };

        let started = Instant::now();
        metrics::counter!("inference_requests_total").increment(1);

        let exchange = self.exchange(&body).await;
        metrics::histogram!("inference_duration_seconds").record(started.elapsed().as_secs_f64());
        let (status, text) = exchange.map_err(transport_error)?;

        if !status.is_success() {
            tracing::debug!(status = %status, "Provider returned an error status");
            return Err(status_error(status, text));
        }

        let completion: ChatCompletionResponse = serde_json::from_str(&text)
            .map_err(|e| InferenceError::MalformedResponse(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| InferenceError::MalformedResponse("response has no message content".into()))
    }
}
