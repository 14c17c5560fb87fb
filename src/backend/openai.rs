//! OpenAI backend implementation.
//!
//! Secondary cloud provider. Speaks the chat-completions API: system prompt
//! prepended as a `system` role message, Bearer authentication, reply text
//! in `choices[0].message.content`.
//!
//! The wire types here are shared with [`super::gateway`], which talks the
//! same OpenAI-compatible shape to the internal gateway.

use super::error::BackendError;
use super::types::{BackendMessage, GenerateOptions, TokenUsage};
use super::ModelBackend;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// OpenAI backend bound to one model and one tier's parameters.
pub struct OpenAiBackend {
    model: String,
    base_url: String,
    api_key: String,
    default_max_tokens: u32,
    default_temperature: f32,
    max_tokens_ceiling: u32,
    timeout: Duration,
    /// Shared HTTP client for connection pooling
    client: Arc<Client>,
    last_usage: Mutex<Option<TokenUsage>>,
}

impl OpenAiBackend {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        model: String,
        base_url: String,
        api_key: String,
        default_max_tokens: u32,
        default_temperature: f32,
        max_tokens_ceiling: u32,
        timeout: Duration,
        client: Arc<Client>,
    ) -> Self {
        Self {
            model,
            base_url,
            api_key,
            default_max_tokens,
            default_temperature,
            max_tokens_ceiling,
            timeout,
            client,
            last_usage: Mutex::new(None),
        }
    }
}

/// Chat-completions request format, shared by OpenAI and gateway backends.
#[derive(Debug, Serialize)]
pub(crate) struct CompletionsRequest {
    pub model: String,
    pub messages: Vec<CompletionsMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Serialize)]
pub(crate) struct CompletionsMessage {
    pub role: String,
    pub content: String,
}

/// Chat-completions response format.
#[derive(Debug, Deserialize)]
pub(crate) struct CompletionsResponse {
    pub choices: Vec<CompletionsChoice>,
    pub usage: Option<CompletionsUsage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompletionsChoice {
    pub message: CompletionsReply,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompletionsReply {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompletionsUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

/// Build the message array with the system prompt as a leading turn.
pub(crate) fn completions_messages(
    system_prompt: &str,
    messages: &[BackendMessage],
) -> Vec<CompletionsMessage> {
    let mut wire = Vec::with_capacity(messages.len() + 1);
    if !system_prompt.is_empty() {
        wire.push(CompletionsMessage {
            role: "system".to_string(),
            content: system_prompt.to_string(),
        });
    }
    wire.extend(messages.iter().map(|m| CompletionsMessage {
        role: m.role.as_str().to_string(),
        content: m.content.clone(),
    }));
    wire
}

/// Resolve effective max-tokens against a ceiling, capping with a warning.
pub(crate) fn cap_max_tokens(requested: u32, ceiling: u32, model: &str) -> u32 {
    if requested > ceiling {
        tracing::warn!(
            requested,
            ceiling,
            model,
            "requested max_tokens above ceiling, capping"
        );
        ceiling
    } else {
        requested
    }
}

/// Extract the reply text from a parsed completions response.
pub(crate) fn completions_reply_text(
    parsed: &CompletionsResponse,
    raw_body: &str,
) -> Result<String, BackendError> {
    parsed
        .choices
        .first()
        .and_then(|c| c.message.content.clone())
        .ok_or_else(|| {
            tracing::error!(body = %raw_body, "provider response has no choices");
            BackendError::Protocol("Response contains no choices".to_string())
        })
}

#[async_trait]
impl ModelBackend for OpenAiBackend {
    fn provider(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate_reply(
        &self,
        system_prompt: &str,
        messages: &[BackendMessage],
        options: &GenerateOptions,
    ) -> Result<String, BackendError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let timeout_ms = self.timeout.as_millis() as u64;

        let request = CompletionsRequest {
            model: self.model.clone(),
            messages: completions_messages(system_prompt, messages),
            max_tokens: cap_max_tokens(
                options.max_tokens.unwrap_or(self.default_max_tokens),
                self.max_tokens_ceiling,
                &self.model,
            ),
            temperature: options.temperature.unwrap_or(self.default_temperature),
        };

        let response = self
            .client
            .post(&url)
            .header("authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::Timeout(timeout_ms)
                } else {
                    BackendError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::from_status(status.as_u16(), body));
        }

        let body = response
            .text()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let parsed: CompletionsResponse = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(body = %body, error = %e, "unparseable provider response");
            BackendError::Protocol(format!("Failed to parse provider response: {}", e))
        })?;

        let text = completions_reply_text(&parsed, &body)?;

        *self
            .last_usage
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = parsed.usage.map(|u| TokenUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        });

        Ok(text)
    }

    fn last_usage(&self) -> Option<TokenUsage> {
        *self
            .last_usage
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
