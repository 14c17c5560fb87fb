//! Anthropic backend implementation.
//!
//! Primary cloud provider. Speaks the Messages API: system prompt in a
//! dedicated field, `x-api-key` authentication, reply text in
//! `content[0].text`.

use super::error::BackendError;
use super::types::{BackendMessage, GenerateOptions, TokenUsage};
use super::ModelBackend;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic backend bound to one model and one tier's parameters.
pub struct AnthropicBackend {
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

impl AnthropicBackend {
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

    /// Resolve the effective max-tokens for a call, applying the hard
    /// ceiling. Capping logs and proceeds; it never fails the call.
    fn effective_max_tokens(&self, options: &GenerateOptions) -> u32 {
        let requested = options.max_tokens.unwrap_or(self.default_max_tokens);
        if requested > self.max_tokens_ceiling {
            tracing::warn!(
                requested,
                ceiling = self.max_tokens_ceiling,
                model = %self.model,
                "requested max_tokens above ceiling, capping"
            );
            self.max_tokens_ceiling
        } else {
            requested
        }
    }

    fn build_request(
        &self,
        system_prompt: &str,
        messages: &[BackendMessage],
        options: &GenerateOptions,
    ) -> MessagesRequest {
        MessagesRequest {
            model: self.model.clone(),
            max_tokens: self.effective_max_tokens(options),
            system: Some(system_prompt.to_string()).filter(|s| !s.is_empty()),
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: m.content.clone(),
                })
                .collect(),
            temperature: Some(options.temperature.unwrap_or(self.default_temperature)),
        }
    }
}

/// Messages API request format
#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

/// Messages API response format
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[async_trait]
impl ModelBackend for AnthropicBackend {
    fn provider(&self) -> &'static str {
        "anthropic"
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
        let url = format!("{}/v1/messages", self.base_url);
        let request = self.build_request(system_prompt, messages, options);
        let timeout_ms = self.timeout.as_millis() as u64;

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
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

        let parsed: MessagesResponse = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(body = %body, error = %e, "unparseable provider response");
            BackendError::Protocol(format!("Failed to parse provider response: {}", e))
        })?;

        let text = parsed
            .content
            .first()
            .map(|c| c.text.clone())
            .ok_or_else(|| {
                tracing::error!(body = %body, "provider response has no content blocks");
                BackendError::Protocol("Response contains no content".to_string())
            })?;

        *self
            .last_usage
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = parsed.usage.map(|u| TokenUsage {
            input_tokens: u.input_tokens,
            output_tokens: u.output_tokens,
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
