//! OpenAI-compatible chat-completions provider
//!
//! Works against any endpoint that speaks the OpenAI wire format, including
//! Baseten's hosted models.

use async_trait::async_trait;
use backoff::{future::retry, ExponentialBackoff};
use gate_core::InferenceConfig;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::{
    error::{LLMError, Result},
    provider::LLMProvider,
    types::{Message, Response, TokenUsage},
};

/// OpenAI API base URL
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Baseten inference base URL
pub const BASETEN_API_BASE: &str = "https://inference.baseten.co/v1";

/// OpenAI-compatible chat-completions provider
pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    provider_name: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    timeout: Duration,
    max_retry_elapsed: Duration,
}

impl OpenAIProvider {
    /// Create a provider against the OpenAI API
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LLMError::config_error("API key cannot be empty"));
        }

        Ok(Self {
            client: Client::new(),
            api_key,
            model: model.into(),
            base_url: OPENAI_API_BASE.to_string(),
            provider_name: "openai".to_string(),
            temperature: None,
            max_tokens: None,
            timeout: Duration::from_secs(60),
            max_retry_elapsed: Duration::from_secs(30),
        })
    }

    /// Create a provider from the `[inference]` config section
    ///
    /// The API key is read from the environment variable the section names.
    pub fn from_config(config: &InferenceConfig) -> Result<Self> {
        let api_key = config.api_key()?;
        Ok(Self::new(api_key, config.model.clone())?
            .with_base_url(config.base_url.clone())
            .with_provider_name(config.provider.clone())
            .with_temperature(config.temperature)
            .with_timeout(Duration::from_secs(config.request_timeout_secs)))
    }

    /// Point at another OpenAI-compatible endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Name reported by [`LLMProvider::name`]
    pub fn with_provider_name(mut self, name: impl Into<String>) -> Self {
        self.provider_name = name.into();
        self
    }

    /// Sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Completion token limit
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Upper bound on time spent retrying one request
    pub fn with_max_retry_elapsed(mut self, elapsed: Duration) -> Self {
        self.max_retry_elapsed = elapsed;
        self
    }

    /// Endpoint base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Convert our messages to the wire format
    fn format_messages(&self, messages: &[Message]) -> Vec<WireMessage> {
        messages
            .iter()
            .map(|msg| WireMessage {
                role: msg.role.as_str().to_string(),
                content: msg.content.clone(),
                tool_calls: msg.tool_calls.clone(),
                tool_call_id: msg.tool_call_id.clone(),
            })
            .collect()
    }

    fn build_request(&self, messages: &[Message], tools: Option<Vec<Value>>) -> ChatRequest {
        let tool_choice = tools
            .as_ref()
            .filter(|t| !t.is_empty())
            .map(|_| "auto".to_string());
        ChatRequest {
            model: self.model.clone(),
            messages: self.format_messages(messages),
            stream: false,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: tools.filter(|t| !t.is_empty()),
            tool_choice,
        }
    }

    /// Make a retryable API request
    async fn make_request<T: for<'de> Deserialize<'de>>(&self, request_body: &ChatRequest) -> Result<T> {
        let url = self.completions_url();

        let operation = || async {
            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .timeout(self.timeout)
                .json(request_body)
                .send()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        backoff::Error::Permanent(LLMError::Timeout)
                    } else {
                        backoff::Error::Transient {
                            err: LLMError::HttpError(e),
                            retry_after: None,
                        }
                    }
                })?;

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after_secs: Option<u64> = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok());

                tracing::warn!("Rate limited by {}, retrying", self.provider_name);
                return Err(backoff::Error::Transient {
                    err: LLMError::RateLimitExceeded(retry_after_secs),
                    retry_after: retry_after_secs.map(Duration::from_secs),
                });
            }

            if status.is_server_error() {
                let error_text = response.text().await.unwrap_or_default();
                tracing::warn!("Server error from {}: {}", self.provider_name, status);
                return Err(backoff::Error::Transient {
                    err: LLMError::api_error(format!("Server error ({}): {}", status, error_text)),
                    retry_after: None,
                });
            }

            if status.is_client_error() {
                let error_text = response.text().await.unwrap_or_default();
                return Err(backoff::Error::Permanent(LLMError::api_error(format!(
                    "Client error ({}): {}",
                    status, error_text
                ))));
            }

            response
                .json::<T>()
                .await
                .map_err(|e| backoff::Error::Permanent(LLMError::parse_error(e.to_string())))
        };

        let backoff_config = ExponentialBackoff {
            max_elapsed_time: Some(self.max_retry_elapsed),
            ..Default::default()
        };

        retry(backoff_config, operation).await
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    async fn send_message_with_tools(
        &self,
        messages: Vec<Message>,
        tools: Vec<Value>,
    ) -> Result<Value> {
        let request = self.build_request(&messages, Some(tools));
        tracing::debug!(
            "Sending {} messages to {} ({})",
            messages.len(),
            self.provider_name,
            self.model
        );
        self.make_request(&request).await
    }

    async fn send_message(&self, messages: Vec<Message>) -> Result<Response> {
        let request = self.build_request(&messages, None);
        let response: ChatResponse = self.make_request(&request).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LLMError::parse_error("No choices in response"))?;

        Ok(Response {
            content: choice.message.content.unwrap_or_default(),
            model: response.model,
            usage: response.usage,
            finish_reason: choice.finish_reason,
        })
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn name(&self) -> &str {
        &self.provider_name
    }
}

// Wire types

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: String,
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}
