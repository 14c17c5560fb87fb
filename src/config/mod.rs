//! Configuration module for Atrium
//!
//! Provides layered configuration loading from files, environment variables,
//! and defaults.
//!
//! # Configuration Precedence
//!
//! 1. Environment variables (`ATRIUM_*`)
//! 2. Configuration file (TOML)
//! 3. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use atrium::config::AtriumConfig;
//!
//! // Load defaults
//! let config = AtriumConfig::default();
//! assert_eq!(config.limits.request_timeout_seconds, 30);
//!
//! // Parse from TOML
//! let toml = r#"
//! [tiers.standard]
//! model = "claude-3-5-haiku-latest"
//! "#;
//! let config: AtriumConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.tiers.standard.model, "claude-3-5-haiku-latest");
//! ```

pub mod error;
pub mod logging;
pub mod provider;
pub mod tiers;

pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use provider::{AnthropicConfig, GatewayConfig, OpenAiConfig, ProviderConfig, ProviderKind};
pub use tiers::{TierParams, TierTable};

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Limits applied to every model call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Bound on the single network call to the model backend.
    pub request_timeout_seconds: u64,
    /// Hard ceiling on requested max-tokens. Requests above it are capped,
    /// not failed.
    pub max_tokens_ceiling: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            request_timeout_seconds: 30,
            max_tokens_ceiling: 8000,
        }
    }
}

/// Bounds on assembled prompt context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Knowledge excerpts included per turn.
    pub knowledge_limit: usize,
    /// Preview length for excerpts unless full content is requested.
    pub knowledge_preview_chars: usize,
    /// Prior messages quoted into the staff-mode context block.
    pub history_limit: usize,
    /// Clip length for quoted history lines.
    pub history_clip_chars: usize,
    /// Days of operational logs aggregated into the summary.
    pub recent_log_days: u32,
    /// Recent highlight/problem entries quoted verbatim.
    pub recent_log_highlights: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            knowledge_limit: 3,
            knowledge_preview_chars: 200,
            history_limit: 3,
            history_clip_chars: 200,
            recent_log_days: 14,
            recent_log_highlights: 3,
        }
    }
}

/// Unified configuration for the orchestration core.
///
/// Constructed once at process startup and passed into the backend factory
/// and orchestrator; call sites never read global settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AtriumConfig {
    /// Provider selection and credentials
    pub provider: ProviderConfig,
    /// Per-tier model ids and generation parameters
    pub tiers: TierTable,
    /// Request limits (timeout, token ceiling)
    pub limits: LimitsConfig,
    /// Context assembly bounds
    pub context: ContextConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AtriumConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supports ATRIUM_* environment variables for common settings.
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(provider) = std::env::var("ATRIUM_PROVIDER") {
            if let Ok(p) = provider.parse() {
                self.provider.provider = p;
            }
        }
        if let Ok(key) = std::env::var("ATRIUM_ANTHROPIC_API_KEY") {
            self.provider.anthropic.api_key = Some(key);
        }
        if let Ok(key) = std::env::var("ATRIUM_OPENAI_API_KEY") {
            self.provider.openai.api_key = Some(key);
        }
        if let Ok(key) = std::env::var("ATRIUM_GATEWAY_API_KEY") {
            self.provider.gateway.api_key = Some(key);
        }
        if let Ok(url) = std::env::var("ATRIUM_GATEWAY_BASE_URL") {
            self.provider.gateway.base_url = Some(url);
        }

        if let Ok(model) = std::env::var("ATRIUM_MODEL_BASIC") {
            self.tiers.basic.model = model;
        }
        if let Ok(model) = std::env::var("ATRIUM_MODEL_STANDARD") {
            self.tiers.standard.model = model;
        }
        if let Ok(model) = std::env::var("ATRIUM_MODEL_PREMIUM") {
            self.tiers.premium.model = model;
        }

        if let Ok(timeout) = std::env::var("ATRIUM_REQUEST_TIMEOUT_SECS") {
            if let Ok(t) = timeout.parse() {
                self.limits.request_timeout_seconds = t;
            }
        }

        if let Ok(level) = std::env::var("ATRIUM_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("ATRIUM_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        self
    }
}
