//! Shared test utilities for Atrium integration tests.
//!
//! Provides reusable helpers for building configured factories,
//! orchestrators, and provider response bodies against a wiremock server.

#![allow(dead_code)]

use atrium::config::{AtriumConfig, ProviderKind};
use atrium::domain::UserContext;
use serde_json::json;

/// Config pointed at a mock Anthropic-shaped server, with all three tiers
/// bound to distinct model ids so tests can observe tier selection.
pub fn anthropic_config(base_url: &str) -> AtriumConfig {
    let mut config = AtriumConfig::default();
    config.provider.provider = ProviderKind::Anthropic;
    config.provider.anthropic.api_key = Some("sk-test".to_string());
    config.provider.anthropic.base_url = base_url.trim_end_matches('/').to_string();
    config.tiers.basic.model = "model-basic".to_string();
    config.tiers.standard.model = "model-standard".to_string();
    config.tiers.premium.model = "model-premium".to_string();
    config
}

/// Same shape for the OpenAI provider path.
pub fn openai_config(base_url: &str) -> AtriumConfig {
    let mut config = anthropic_config(base_url);
    config.provider.provider = ProviderKind::OpenAi;
    config.provider.openai.api_key = Some("sk-test".to_string());
    config.provider.openai.base_url = base_url.trim_end_matches('/').to_string();
    config
}

/// Gateway provider config; no credential on purpose.
pub fn gateway_config(base_url: &str) -> AtriumConfig {
    let mut config = anthropic_config(base_url);
    config.provider.provider = ProviderKind::Gateway;
    config.provider.gateway.base_url = Some(base_url.trim_end_matches('/').to_string());
    config
}

/// Minimal Messages API success body.
pub fn anthropic_reply(text: &str, input_tokens: u32, output_tokens: u32) -> serde_json::Value {
    json!({
        "id": "msg_test",
        "type": "message",
        "role": "assistant",
        "content": [{"type": "text", "text": text}],
        "model": "model-test",
        "stop_reason": "end_turn",
        "usage": {"input_tokens": input_tokens, "output_tokens": output_tokens}
    })
}

/// Minimal chat-completions success body.
pub fn completions_reply(text: &str, prompt_tokens: u32, completion_tokens: u32) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": text},
            "finish_reason": "stop"
        }],
        "usage": {
            "prompt_tokens": prompt_tokens,
            "completion_tokens": completion_tokens,
            "total_tokens": prompt_tokens + completion_tokens
        }
    })
}

pub fn staff_user() -> UserContext {
    UserContext {
        user_id: 10,
        tenant_id: 1,
        business_unit_id: Some(5),
        role: "staff".to_string(),
    }
}

pub fn executive_user() -> UserContext {
    UserContext {
        user_id: 20,
        tenant_id: 1,
        business_unit_id: Some(5),
        role: "executive".to_string(),
    }
}
