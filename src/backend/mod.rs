//! Model backend abstraction layer.
//!
//! This module provides the `ModelBackend` trait and supporting types that
//! hide provider-specific wire formats behind one reply-generation contract,
//! so the factory can substitute providers without changing caller code.

use async_trait::async_trait;

pub mod anthropic;
pub mod error;
pub mod factory;
pub mod gateway;
pub mod openai;
pub mod types;

pub use anthropic::AnthropicBackend;
pub use error::BackendError;
pub use factory::BackendFactory;
pub use gateway::GatewayBackend;
pub use openai::OpenAiBackend;
pub use types::{BackendMessage, GenerateOptions, TokenUsage};

/// Unified interface for all text-generation providers.
///
/// Encapsulates provider-specific HTTP protocols, response parsing, and
/// error mapping. This is the system's polymorphism point: the factory
/// returns `Arc<dyn ModelBackend>` and callers never branch on provider.
///
/// # Object Safety
///
/// The trait is object-safe and designed to be used as `Arc<dyn
/// ModelBackend>`. All async methods use `async_trait` for compatibility
/// with trait objects.
///
/// # Behavioral contract
///
/// - Requested max-tokens above the configured ceiling are capped and
///   logged, never rejected.
/// - The single network call is bounded by the configured timeout; a
///   timeout maps to [`BackendError::Timeout`], which is retryable, unlike
///   authentication or malformed-request failures.
/// - Adapters never auto-retry; retry policy belongs to the caller.
#[async_trait]
pub trait ModelBackend: Send + Sync + 'static {
    /// Provider label for logs, usage records, and health reports.
    fn provider(&self) -> &'static str;

    /// Model identifier this backend is bound to.
    fn model(&self) -> &str;

    /// Generate a reply for an ordered message sequence.
    ///
    /// # Returns
    ///
    /// - `Ok(String)` with the reply text on success
    /// - `Err(BackendError::Authentication)` on credential rejection (401/403)
    /// - `Err(BackendError::RateLimited)` on 429
    /// - `Err(BackendError::BadRequest)` on 400, carrying remote detail
    /// - `Err(BackendError::Timeout)` when the deadline elapsed
    /// - `Err(BackendError::Protocol)` when a 2xx body doesn't parse
    async fn generate_reply(
        &self,
        system_prompt: &str,
        messages: &[BackendMessage],
        options: &GenerateOptions,
    ) -> Result<String, BackendError>;

    /// Token usage reported by the provider for the most recent call on
    /// this instance, if any.
    fn last_usage(&self) -> Option<TokenUsage>;
}
