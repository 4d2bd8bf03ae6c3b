//! Client for the external text-completion endpoint
//!
//! One `complete` call is a two-message chat exchange (optional system
//! instruction + user prompt) retried according to a [`RetryPolicy`]. A 405
//! "method not allowed" reply means the endpoint is misconfigured and is
//! never retried.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::retry::{retry, RetryPolicy};
use crate::{
    config::EnrichmentConfig,
    error::{AppError, AppResult},
};

/// Whether a failure is worth retrying
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Transient,
    Permanent,
}

/// Failure of a completion request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceFailure {
    pub kind: FailureKind,
    /// HTTP status when the endpoint answered
    pub status: Option<u16>,
    pub detail: String,
}

impl ServiceFailure {
    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, detail: impl Into<String>) -> Self {
        let kind = if status == 405 {
            FailureKind::Permanent
        } else {
            FailureKind::Transient
        };
        Self {
            kind,
            status: Some(status),
            detail: detail.into(),
        }
    }

    /// Network-level failure; always retryable
    pub fn transport(detail: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transient,
            status: None,
            detail: detail.into(),
        }
    }

    /// The endpoint answered, but not with what was asked for
    pub fn invalid_reply(detail: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transient,
            status: None,
            detail: detail.into(),
        }
    }

    pub fn is_permanent(&self) -> bool {
        self.kind == FailureKind::Permanent
    }
}

impl std::fmt::Display for ServiceFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "status {}: {}", status, self.detail),
            None => write!(f, "{}", self.detail),
        }
    }
}

impl std::error::Error for ServiceFailure {}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }
}

/// Body of a chat-completions request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// One request/response exchange with the endpoint
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    async fn send(&self, request: &CompletionRequest) -> Result<Value, ServiceFailure>;
}

/// reqwest-based transport
pub struct HttpCompletionTransport {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpCompletionTransport {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, timeout: Duration) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("assetdesk-server/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
            api_key,
        })
    }
}

#[async_trait]
impl CompletionTransport for HttpCompletionTransport {
    async fn send(&self, request: &CompletionRequest) -> Result<Value, ServiceFailure> {
        let mut builder = self.http_client.post(&self.endpoint).json(request);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ServiceFailure::transport(format!("Request to completion endpoint failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceFailure::from_status(status.as_u16(), body));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ServiceFailure::transport(format!("Invalid completion response body: {}", e)))
    }
}

/// Structured reply that failed to parse, kept verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawText(pub String);

/// Normalized reply
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// Free-text reply
    Text(String),
    /// Reply parsed as JSON
    Structured(Value),
    /// Structured reply was requested but the text did not parse
    Unparsed(RawText),
}

impl Completion {
    pub fn into_structured(self) -> Result<Value, RawText> {
        match self {
            Completion::Structured(value) => Ok(value),
            Completion::Text(text) => Err(RawText(text)),
            Completion::Unparsed(raw) => Err(raw),
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Completion::Text(text) | Completion::Unparsed(RawText(text)) => text,
            Completion::Structured(value) => value.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct EnrichmentClient {
    transport: Arc<dyn CompletionTransport>,
    model: String,
    temperature: Option<f32>,
    policy: RetryPolicy<ServiceFailure>,
}

impl EnrichmentClient {
    pub fn new(transport: Arc<dyn CompletionTransport>, model: impl Into<String>) -> Self {
        Self {
            transport,
            model: model.into(),
            temperature: None,
            policy: default_policy(),
        }
    }

    /// Client for the configured endpoint, or `None` when enrichment is disabled
    pub fn from_config(config: &EnrichmentConfig) -> AppResult<Option<Self>> {
        let Some(endpoint) = config.endpoint.as_deref().filter(|e| !e.trim().is_empty()) else {
            return Ok(None);
        };

        let transport = HttpCompletionTransport::new(
            endpoint,
            config.api_key.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )?;

        let policy = RetryPolicy::new(
            config.max_attempts,
            Duration::from_millis(config.base_delay_ms),
            config.multiplier,
            ServiceFailure::is_permanent,
        );

        Ok(Some(Self {
            transport: Arc::new(transport),
            model: config.model.clone(),
            temperature: config.temperature,
            policy,
        }))
    }

    pub fn with_policy(mut self, policy: RetryPolicy<ServiceFailure>) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    fn build_request(&self, prompt: &str, system_instruction: Option<&str>) -> CompletionRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system_instruction.filter(|s| !s.is_empty()) {
            messages.push(ChatMessage::new("system", system));
        }
        messages.push(ChatMessage::new("user", prompt));

        CompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
        }
    }

    /// Send one prompt and normalize the reply.
    ///
    /// With `expect_structured`, a reply that is not valid JSON comes back as
    /// [`Completion::Unparsed`] rather than an error.
    pub async fn complete(
        &self,
        prompt: &str,
        system_instruction: Option<&str>,
        expect_structured: bool,
    ) -> Result<Completion, ServiceFailure> {
        let request = self.build_request(prompt, system_instruction);

        let response = retry(&self.policy, "completion", || self.transport.send(&request)).await?;
        let text = extract_text(&response);

        if !expect_structured {
            return Ok(Completion::Text(text));
        }

        match serde_json::from_str::<Value>(text.trim()) {
            Ok(value) => Ok(Completion::Structured(value)),
            Err(e) => {
                tracing::debug!("Completion is not valid JSON: {}", e);
                Ok(Completion::Unparsed(RawText(text)))
            }
        }
    }
}

fn default_policy() -> RetryPolicy<ServiceFailure> {
    RetryPolicy::new(3, Duration::from_secs(1), 2, ServiceFailure::is_permanent)
}

/// Completion text of the first choice (`message.content`, then `text`)
pub fn extract_text(response: &Value) -> String {
    let choice = response.get("choices").and_then(|c| c.get(0));
    let content = choice
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .filter(|v| !v.is_null())
        .or_else(|| choice.and_then(|c| c.get("text")).filter(|v| !v.is_null()));

    content.map(flatten_content).unwrap_or_default()
}

/// Plain text for a content value; `parts` lists are joined, anything else serialized
fn flatten_content(content: &Value) -> String {
    match content {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        Value::Object(map) => match map.get("parts").and_then(Value::as_array) {
            Some(parts) if !parts.is_empty() => join_parts(parts),
            _ => content.to_string(),
        },
        Value::Array(parts) if !parts.is_empty() => join_parts(parts),
        other => other.to_string(),
    }
}

fn join_parts(parts: &[Value]) -> String {
    parts
        .iter()
        .map(|part| match part {
            Value::String(text) => text.clone(),
            Value::Object(_) if part.get("parts").is_some() => flatten_content(part),
            _ => part
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
        .collect()
}
