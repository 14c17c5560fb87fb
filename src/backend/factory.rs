//! Backend factory: purpose and tenant policy in, configured adapter out.

use super::anthropic::AnthropicBackend;
use super::error::BackendError;
use super::gateway::GatewayBackend;
use super::openai::OpenAiBackend;
use super::ModelBackend;
use crate::config::{AtriumConfig, ProviderKind, TierParams};
use crate::tier::{apply_policy_str, resolve_tier, Tier};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Constructs the right adapter for a resolved tier.
///
/// Holds the full configuration handed over at process startup plus one
/// shared HTTP client, so adapter construction is cheap and call sites
/// never consult global state.
pub struct BackendFactory {
    config: AtriumConfig,
    client: Arc<Client>,
}

impl BackendFactory {
    pub fn new(config: AtriumConfig) -> Self {
        Self {
            config,
            client: Arc::new(Client::new()),
        }
    }

    /// Build with an externally supplied client (tests, custom pools).
    pub fn with_client(config: AtriumConfig, client: Arc<Client>) -> Self {
        Self { config, client }
    }

    /// Tier after purpose resolution and tenant policy, without building
    /// anything. Used by the orchestrator for usage records.
    pub fn effective_tier(&self, purpose: &str, tenant_policy: &str) -> Tier {
        apply_policy_str(resolve_tier(purpose), tenant_policy)
    }

    /// Generation parameters bound to a tier.
    pub fn tier_params(&self, tier: Tier) -> &TierParams {
        self.config.tiers.params(tier)
    }

    /// Resolve purpose and policy, validate configuration, and construct
    /// the adapter.
    ///
    /// # Errors
    ///
    /// [`BackendError::Configuration`] when the tier's model id or the
    /// provider's required credential is missing. Messages name the setting
    /// to fix, never the secret value.
    pub fn create_for_purpose(
        &self,
        purpose: &str,
        tenant_policy: &str,
    ) -> Result<Arc<dyn ModelBackend>, BackendError> {
        let resolved = resolve_tier(purpose);
        let effective = apply_policy_str(resolved, tenant_policy);
        let backend = self.create_for_tier(effective)?;

        tracing::info!(
            purpose,
            resolved_tier = %resolved,
            effective_tier = %effective,
            provider = backend.provider(),
            model = backend.model(),
            "selected model backend"
        );

        Ok(backend)
    }

    /// Construct the adapter for an already-resolved tier.
    pub fn create_for_tier(&self, tier: Tier) -> Result<Arc<dyn ModelBackend>, BackendError> {
        let params = self.config.tiers.params(tier);
        if params.model.is_empty() {
            return Err(BackendError::Configuration(format!(
                "model for tier '{}' is not configured (set [tiers.{}].model or ATRIUM_MODEL_{})",
                tier,
                tier,
                tier.as_str().to_uppercase()
            )));
        }

        let timeout = Duration::from_secs(self.config.limits.request_timeout_seconds);
        let ceiling = self.config.limits.max_tokens_ceiling;

        match self.config.provider.provider {
            ProviderKind::Anthropic => {
                let api_key = self
                    .config
                    .provider
                    .anthropic
                    .api_key
                    .clone()
                    .ok_or_else(|| {
                        BackendError::Configuration(
                            "anthropic api key is not set (set [provider.anthropic].api_key \
                             or ATRIUM_ANTHROPIC_API_KEY)"
                                .to_string(),
                        )
                    })?;
                Ok(Arc::new(AnthropicBackend::new(
                    params.model.clone(),
                    self.config.provider.anthropic.base_url.clone(),
                    api_key,
                    params.max_tokens,
                    params.temperature,
                    ceiling,
                    timeout,
                    Arc::clone(&self.client),
                )))
            }
            ProviderKind::OpenAi => {
                let api_key = self.config.provider.openai.api_key.clone().ok_or_else(|| {
                    BackendError::Configuration(
                        "openai api key is not set (set [provider.openai].api_key \
                         or ATRIUM_OPENAI_API_KEY)"
                            .to_string(),
                    )
                })?;
                Ok(Arc::new(OpenAiBackend::new(
                    params.model.clone(),
                    self.config.provider.openai.base_url.clone(),
                    api_key,
                    params.max_tokens,
                    params.temperature,
                    ceiling,
                    timeout,
                    Arc::clone(&self.client),
                )))
            }
            ProviderKind::Gateway => {
                let base_url = self
                    .config
                    .provider
                    .gateway
                    .base_url
                    .clone()
                    .ok_or_else(|| {
                        BackendError::Configuration(
                            "gateway base url is not set (set [provider.gateway].base_url \
                             or ATRIUM_GATEWAY_BASE_URL)"
                                .to_string(),
                        )
                    })?;
                Ok(Arc::new(GatewayBackend::new(
                    params.model.clone(),
                    base_url,
                    self.config.provider.gateway.api_key.clone(),
                    params.max_tokens,
                    params.temperature,
                    ceiling,
                    timeout,
                    Arc::clone(&self.client),
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> AtriumConfig {
        let mut config = AtriumConfig::default();
        config.provider.anthropic.api_key = Some("sk-test".to_string());
        config.tiers.basic.model = "claude-3-5-haiku-latest".to_string();
        config.tiers.standard.model = "claude-3-5-sonnet-latest".to_string();
        config.tiers.premium.model = "claude-3-opus-latest".to_string();
        config
    }

    #[test]
    fn creates_backend_for_known_purpose() {
        let factory = BackendFactory::new(configured());
        let backend = factory.create_for_purpose("staff_qa", "all").unwrap();
        assert_eq!(backend.provider(), "anthropic");
        assert_eq!(backend.model(), "claude-3-5-sonnet-latest");
    }

    #[test]
    fn policy_downgrades_choose_cheaper_model() {
        let factory = BackendFactory::new(configured());
        let backend = factory
            .create_for_purpose("management_decision", "basic_only")
            .unwrap();
        assert_eq!(backend.model(), "claude-3-5-haiku-latest");
    }

    #[test]
    fn missing_api_key_is_configuration_error() {
        let mut config = configured();
        config.provider.anthropic.api_key = None;
        let factory = BackendFactory::new(config);
        let err = factory.create_for_purpose("staff_qa", "all").err().unwrap();
        match err {
            BackendError::Configuration(msg) => {
                assert!(msg.contains("ATRIUM_ANTHROPIC_API_KEY"));
                assert!(!msg.contains("sk-"));
            }
            other => panic!("expected configuration error, got {other:?}"),
        }
    }

    #[test]
    fn missing_model_is_configuration_error() {
        let mut config = configured();
        config.tiers.premium.model = String::new();
        let factory = BackendFactory::new(config);
        let err = factory
            .create_for_purpose("management_decision", "all")
            .err()
            .unwrap();
        assert!(matches!(err, BackendError::Configuration(msg) if msg.contains("premium")));
    }

    #[test]
    fn gateway_requires_base_url() {
        let mut config = configured();
        config.provider.provider = ProviderKind::Gateway;
        let factory = BackendFactory::new(config);
        let err = factory.create_for_purpose("staff_qa", "all").err().unwrap();
        assert!(matches!(err, BackendError::Configuration(msg) if msg.contains("base url")));
    }

    #[test]
    fn openai_provider_selected_from_config() {
        let mut config = configured();
        config.provider.provider = ProviderKind::OpenAi;
        config.provider.openai.api_key = Some("sk-other".to_string());
        let factory = BackendFactory::new(config);
        let backend = factory.create_for_purpose("staff_qa", "all").unwrap();
        assert_eq!(backend.provider(), "openai");
    }

    #[test]
    fn effective_tier_matches_pure_functions() {
        let factory = BackendFactory::new(configured());
        assert_eq!(factory.effective_tier("staff_qa", "all"), Tier::Standard);
        assert_eq!(
            factory.effective_tier("management_decision", "standard_max"),
            Tier::Standard
        );
        // Unknown policy degrades to standard rather than failing.
        assert_eq!(factory.effective_tier("staff_qa", "bogus"), Tier::Standard);
    }
}
