//! Model provider configuration.
//!
//! Credentials and endpoints for the interchangeable text-generation
//! providers. Values are sourced once at startup (file plus `ATRIUM_*`
//! environment overrides) and handed to the backend factory; nothing in the
//! call path reads process-wide settings.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which provider family serves a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Primary cloud provider (Anthropic Messages API shape).
    #[default]
    Anthropic,
    /// Secondary cloud provider (OpenAI chat-completions shape).
    OpenAi,
    /// Internal OpenAI-compatible gateway.
    Gateway,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Gateway => "gateway",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "anthropic" => Ok(ProviderKind::Anthropic),
            "openai" => Ok(ProviderKind::OpenAi),
            "gateway" => Ok(ProviderKind::Gateway),
            _ => Err(format!("Invalid provider: {}", s)),
        }
    }
}

/// Primary provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnthropicConfig {
    pub api_key: Option<String>,
    pub base_url: String,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.anthropic.com".to_string(),
        }
    }
}

/// Secondary provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com".to_string(),
        }
    }
}

/// Internal gateway settings. The gateway URL is deployment-specific, so
/// there is no meaningful default; the key is optional because in-cluster
/// gateways often skip auth.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

/// Provider selection plus per-provider settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider used for every tier.
    pub provider: ProviderKind,
    pub anthropic: AnthropicConfig,
    pub openai: OpenAiConfig,
    pub gateway: GatewayConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_kind_from_str() {
        assert_eq!(ProviderKind::from_str("anthropic").unwrap(), ProviderKind::Anthropic);
        assert_eq!(ProviderKind::from_str("OpenAI").unwrap(), ProviderKind::OpenAi);
        assert_eq!(ProviderKind::from_str("gateway").unwrap(), ProviderKind::Gateway);
        assert!(ProviderKind::from_str("azure").is_err());
    }

    #[test]
    fn defaults_have_no_keys() {
        let config = ProviderConfig::default();
        assert_eq!(config.provider, ProviderKind::Anthropic);
        assert!(config.anthropic.api_key.is_none());
        assert!(config.gateway.base_url.is_none());
    }
}
