//! Internal gateway backend implementation.
//!
//! Used for deployments that route model traffic through an in-cluster
//! OpenAI-compatible gateway instead of calling a cloud provider directly.
//! Authentication is optional; in-cluster gateways often rely on network
//! policy alone.

use super::error::BackendError;
use super::openai::{
    cap_max_tokens, completions_messages, completions_reply_text, CompletionsRequest,
    CompletionsResponse,
};
use super::types::{BackendMessage, GenerateOptions, TokenUsage};
use super::ModelBackend;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Gateway backend bound to one model and one tier's parameters.
pub struct GatewayBackend {
    model: String,
    base_url: String,
    api_key: Option<String>,
    default_max_tokens: u32,
    default_temperature: f32,
    max_tokens_ceiling: u32,
    timeout: Duration,
    /// Shared HTTP client for connection pooling
    client: Arc<Client>,
    last_usage: Mutex<Option<TokenUsage>>,
}

impl GatewayBackend {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        model: String,
        base_url: String,
        api_key: Option<String>,
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

#[async_trait]
impl ModelBackend for GatewayBackend {
    fn provider(&self) -> &'static str {
        "gateway"
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

        let mut builder = self.client.post(&url).json(&request).timeout(self.timeout);
        if let Some(key) = &self.api_key {
            builder = builder.header("authorization", format!("Bearer {}", key));
        }

        let response = builder.send().await.map_err(|e| {
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
            tracing::error!(body = %body, error = %e, "unparseable gateway response");
            BackendError::Protocol(format!("Failed to parse gateway response: {}", e))
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
