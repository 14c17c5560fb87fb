//! Chat turn orchestration.
//!
//! Request-level coordinator for one AI turn: resolve tenant and scope,
//! load or create the conversation, assemble context, pick a backend
//! through the factory, dispatch, persist the turn, extract candidates,
//! and record usage. One request is one logical task; the only slow await
//! is the model call itself.

pub mod error;
pub mod types;

pub use error::ChatError;
pub use types::{ChatMode, ChatTurnRequest, ChatTurnResponse, HealthReport, HealthState};

use crate::backend::{BackendFactory, BackendMessage, GenerateOptions, ModelBackend};
use crate::config::AtriumConfig;
use crate::context::{ContextAssembler, ContextInputs};
use crate::domain::{
    Conversation, InsightCandidate, IssueCandidate, IssueStatus, MessageRole, StoredMessage,
    TenantAiSettings, UsageRecord,
};
use crate::extract::{extract, Extraction};
use crate::store::{
    ConversationStore, IssueInsightStore, KnowledgeStore, OperationalLogStore, TenantSettingsStore,
    UsageStore,
};
use crate::tier::Tier;
use crate::usage::{truncate_error, UsageLogger};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

const CONVERSATION_TITLE_MAX_CHARS: usize = 50;
const DEDUP_TITLE_FRAGMENT_CHARS: usize = 50;
const DEDUP_DESCRIPTION_FRAGMENT_CHARS: usize = 100;

/// Starter questions offered to a fresh conversation. Tenant-neutral.
const SUGGESTIONS: &[&str] = &[
    "What could we improve in today's operations?",
    "How can we lift sales this week?",
    "How can we make routine work more efficient?",
];

/// The request-level coordinator exposed to the portal's routing layer.
pub struct ChatOrchestrator {
    factory: BackendFactory,
    assembler: ContextAssembler,
    conversations: Arc<dyn ConversationStore>,
    tenants: Arc<dyn TenantSettingsStore>,
    issues: Arc<dyn IssueInsightStore>,
    usage: UsageLogger,
}

impl ChatOrchestrator {
    pub fn new(
        config: AtriumConfig,
        conversations: Arc<dyn ConversationStore>,
        tenants: Arc<dyn TenantSettingsStore>,
        logs: Arc<dyn OperationalLogStore>,
        knowledge: Arc<dyn KnowledgeStore>,
        issues: Arc<dyn IssueInsightStore>,
        usage: Arc<dyn UsageStore>,
    ) -> Self {
        let assembler = ContextAssembler::new(logs, knowledge, config.context.clone());
        Self {
            factory: BackendFactory::new(config),
            assembler,
            conversations,
            tenants,
            issues,
            usage: UsageLogger::new(usage),
        }
    }

    /// Convenience constructor for a store that implements every
    /// collaborator trait (tests, demos).
    pub fn with_shared_store<S>(config: AtriumConfig, store: Arc<S>) -> Self
    where
        S: ConversationStore
            + TenantSettingsStore
            + OperationalLogStore
            + KnowledgeStore
            + IssueInsightStore
            + UsageStore
            + 'static,
    {
        Self::new(
            config,
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store,
        )
    }

    /// Handle one chat turn end to end.
    ///
    /// On a dispatch failure the turn persists nothing: neither the user
    /// message nor an assistant message is written, so a retry starts
    /// clean. The usage record is written either way, after the adapter
    /// call returned or failed.
    pub async fn handle_chat_turn(
        &self,
        request: ChatTurnRequest,
    ) -> Result<ChatTurnResponse, ChatError> {
        let request_id = Uuid::new_v4().to_string();
        let user = &request.user;
        let tenant_id = user.tenant_id;

        // Tenant settings are advisory: a failed lookup degrades to
        // defaults rather than failing the turn.
        let settings = match self.tenants.get_ai_settings(tenant_id).await {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(%request_id, error = %e, "tenant settings lookup failed");
                None
            }
        };

        let business_unit_id = request.business_unit_id.or(user.business_unit_id);

        let conversation = self
            .load_or_create_conversation(&request, business_unit_id, &request_id)
            .await?;

        let history = match self.conversations.list_messages(conversation.id).await {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!(%request_id, error = %e, "history load failed, continuing without");
                Vec::new()
            }
        };

        let mode = request
            .mode
            .unwrap_or_else(|| ChatMode::default_for_role(&user.role));
        let purpose = mode.purpose();
        let policy = settings
            .as_ref()
            .map(|s| s.tier_policy.clone())
            .unwrap_or_else(|| "all".to_string());
        let tier = self.factory.effective_tier(purpose, &policy);

        let prompt = self
            .assemble_prompt(&request, mode, settings.as_ref(), business_unit_id, &history)
            .await;

        let backend = match self.factory.create_for_purpose(purpose, &policy) {
            Ok(backend) => backend,
            Err(e) => {
                tracing::error!(%request_id, error = %e, "backend construction failed");
                self.record_usage(
                    &request,
                    tier,
                    purpose,
                    self.factory.tier_params(tier).model.clone(),
                    business_unit_id,
                    Some(conversation.id),
                    None,
                    None,
                    Some(truncate_error(&e.to_string())),
                )
                .await;
                return Err(ChatError::from_backend(&e, &request_id));
            }
        };

        let options = GenerateOptions {
            max_tokens: settings.as_ref().and_then(|s| s.max_tokens_override),
            temperature: None,
        };
        let messages = self.dispatch_messages(mode, &history, &prompt.user_message);

        let started = Instant::now();
        let dispatched = backend
            .generate_reply(&prompt.system_prompt, &messages, &options)
            .await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        let tokens = backend.last_usage();

        let reply = match dispatched {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(%request_id, error = %e, "model dispatch failed");
                self.record_usage(
                    &request,
                    tier,
                    purpose,
                    backend.model().to_string(),
                    business_unit_id,
                    Some(conversation.id),
                    None,
                    Some(elapsed_ms),
                    Some(truncate_error(&e.to_string())),
                )
                .await;
                return Err(ChatError::from_backend(&e, &request_id));
            }
        };

        let assistant_message = match self
            .persist_turn(conversation.id, &request.message, &reply)
            .await
        {
            Ok(message) => message,
            Err(e) => {
                tracing::error!(%request_id, error = %e, "turn persistence failed");
                // The model call happened, so its cost is still recorded.
                self.record_usage(
                    &request,
                    tier,
                    purpose,
                    backend.model().to_string(),
                    business_unit_id,
                    Some(conversation.id),
                    tokens,
                    Some(elapsed_ms),
                    Some(truncate_error(&format!("turn persistence failed: {e}"))),
                )
                .await;
                return Err(ChatError::Internal { request_id });
            }
        };

        // Extraction runs after the reply is final and never fails the turn.
        let extraction = extract(&reply, &request.message);
        self.persist_extraction(&request, business_unit_id, conversation.id, extraction)
            .await;

        self.record_usage(
            &request,
            tier,
            purpose,
            backend.model().to_string(),
            business_unit_id,
            Some(conversation.id),
            tokens,
            Some(elapsed_ms),
            None,
        )
        .await;

        tracing::info!(
            %request_id,
            conversation_id = conversation.id,
            tenant_id,
            mode = ?mode,
            tier = %tier,
            elapsed_ms,
            "chat turn completed"
        );

        Ok(ChatTurnResponse {
            conversation_id: conversation.id,
            reply,
            message_id: assistant_message.id,
        })
    }

    /// Minimal round-trip through the staff-purpose backend. Requires no
    /// caller authentication; intended for deploy-time verification.
    pub async fn health_check(&self) -> HealthReport {
        let tier = self.factory.effective_tier(ChatMode::StaffQa.purpose(), "all");
        let model = self.factory.tier_params(tier).model.clone();

        let backend: Arc<dyn ModelBackend> = match self.factory.create_for_tier(tier) {
            Ok(backend) => backend,
            Err(e) => {
                return HealthReport {
                    status: HealthState::Unhealthy,
                    provider: "unconfigured".to_string(),
                    model,
                    // BackendError's Display already names the error class.
                    latency_ms: None,
                    message: e.to_string(),
                }
            }
        };

        let options = GenerateOptions {
            max_tokens: Some(10),
            temperature: Some(0.0),
        };
        let started = Instant::now();
        let result = backend
            .generate_reply(
                "You are a test assistant. Respond with exactly 'OK' and nothing else.",
                &[BackendMessage::user("ping")],
                &options,
            )
            .await;
        let latency_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(reply) if !reply.trim().is_empty() => HealthReport {
                status: HealthState::Healthy,
                provider: backend.provider().to_string(),
                model: backend.model().to_string(),
                latency_ms: Some(latency_ms),
                message: "AI service is responding normally".to_string(),
            },
            Ok(_) => HealthReport {
                status: HealthState::Degraded,
                provider: backend.provider().to_string(),
                model: backend.model().to_string(),
                latency_ms: Some(latency_ms),
                message: "AI service responded with empty content".to_string(),
            },
            Err(e) => HealthReport {
                status: HealthState::Unhealthy,
                provider: backend.provider().to_string(),
                model: backend.model().to_string(),
                latency_ms: None,
                message: format!("AI service error: {e}"),
            },
        }
    }

    /// Starter questions for an empty conversation.
    pub fn suggestions(&self) -> Vec<String> {
        SUGGESTIONS.iter().map(|s| s.to_string()).collect()
    }

    async fn load_or_create_conversation(
        &self,
        request: &ChatTurnRequest,
        business_unit_id: Option<i64>,
        request_id: &str,
    ) -> Result<Conversation, ChatError> {
        match request.conversation_id {
            Some(id) => {
                let conversation = self
                    .conversations
                    .get_conversation(id)
                    .await
                    .map_err(|e| {
                        tracing::error!(%request_id, error = %e, "conversation load failed");
                        ChatError::Internal {
                            request_id: request_id.to_string(),
                        }
                    })?;
                // Ownership check: a foreign conversation is reported as
                // missing, never redirected.
                match conversation {
                    Some(c) if c.user_id == request.user.user_id => Ok(c),
                    _ => Err(ChatError::ConversationNotFound {
                        request_id: request_id.to_string(),
                    }),
                }
            }
            None => {
                let title: String = request
                    .message
                    .chars()
                    .take(CONVERSATION_TITLE_MAX_CHARS)
                    .collect();
                self.conversations
                    .create_conversation(
                        request.user.tenant_id,
                        request.user.user_id,
                        business_unit_id,
                        Some(title),
                    )
                    .await
                    .map_err(|e| {
                        tracing::error!(%request_id, error = %e, "conversation create failed");
                        ChatError::Internal {
                            request_id: request_id.to_string(),
                        }
                    })
            }
        }
    }

    async fn assemble_prompt(
        &self,
        request: &ChatTurnRequest,
        mode: ChatMode,
        settings: Option<&TenantAiSettings>,
        business_unit_id: Option<i64>,
        history: &[StoredMessage],
    ) -> crate::context::AssembledPrompt {
        let inputs = ContextInputs {
            question: &request.message,
            tenant_settings: settings,
            unit_label: request.business_unit_label.as_deref(),
            role: &request.user.role,
            business_unit_id,
            user_id: request.user.user_id,
            // Management mode carries history as structured turns instead
            // of quoting it into the context block.
            history: match mode {
                ChatMode::StaffQa => history,
                ChatMode::Management => &[],
            },
            include_full_knowledge: request.include_full_knowledge,
        };
        match mode {
            ChatMode::StaffQa => self.assembler.assemble_staff(&inputs).await,
            ChatMode::Management => self.assembler.assemble_management(&inputs).await,
        }
    }

    /// Message sequence for the backend call.
    fn dispatch_messages(
        &self,
        mode: ChatMode,
        history: &[StoredMessage],
        user_message: &str,
    ) -> Vec<BackendMessage> {
        let mut messages = Vec::new();
        if mode == ChatMode::Management {
            messages.extend(history.iter().map(|m| BackendMessage {
                role: m.role,
                content: m.content.clone(),
            }));
        }
        messages.push(BackendMessage::user(user_message));
        messages
    }

    /// Persist the user/assistant pair, then refresh the conversation
    /// timestamp. Both writes happen inside the caller's per-request
    /// transactional scope, so readers observe the pair or nothing.
    async fn persist_turn(
        &self,
        conversation_id: i64,
        user_content: &str,
        reply: &str,
    ) -> Result<StoredMessage, crate::store::StoreError> {
        self.conversations
            .append_message(conversation_id, MessageRole::User, user_content.to_string())
            .await?;
        let assistant = self
            .conversations
            .append_message(conversation_id, MessageRole::Assistant, reply.to_string())
            .await?;
        self.conversations
            .touch_conversation(conversation_id)
            .await?;
        Ok(assistant)
    }

    /// Propose extracted candidates to the issue/insight store. All
    /// failures are absorbed; the reply is already on its way out.
    async fn persist_extraction(
        &self,
        request: &ChatTurnRequest,
        business_unit_id: Option<i64>,
        conversation_id: i64,
        extraction: Extraction,
    ) {
        if let Some(issue) = extraction.issue {
            let title_fragment: String =
                issue.title.chars().take(DEDUP_TITLE_FRAGMENT_CHARS).collect();
            let description_fragment: String = issue
                .description
                .chars()
                .take(DEDUP_DESCRIPTION_FRAGMENT_CHARS)
                .collect();

            match self
                .issues
                .find_similar_issue(business_unit_id, &title_fragment, &description_fragment)
                .await
            {
                Ok(Some(existing)) => {
                    tracing::debug!(existing, "similar issue exists, skipping creation");
                }
                Ok(None) => {
                    let candidate = IssueCandidate {
                        tenant_id: request.user.tenant_id,
                        business_unit_id,
                        title: issue.title,
                        description: issue.description,
                        topic: issue.topic,
                        status: IssueStatus::Open,
                        created_by_user_id: request.user.user_id,
                        conversation_id: Some(conversation_id),
                    };
                    match self.issues.create_issue(candidate).await {
                        Ok(id) => tracing::info!(issue_id = id, "issue created from chat turn"),
                        Err(e) => tracing::warn!(error = %e, "issue creation failed"),
                    }
                }
                Err(e) => tracing::warn!(error = %e, "issue dedup lookup failed"),
            }
        }

        if let Some(insight) = extraction.insight {
            let candidate = InsightCandidate {
                tenant_id: request.user.tenant_id,
                business_unit_id,
                title: insight.title,
                content: insight.content,
                kind: insight.kind,
                score: insight.score,
                created_by: None,
            };
            match self.issues.create_insight(candidate).await {
                Ok(id) => {
                    tracing::info!(insight_id = id, score = insight.score, "insight created")
                }
                Err(e) => tracing::warn!(error = %e, "insight creation failed"),
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn record_usage(
        &self,
        request: &ChatTurnRequest,
        tier: Tier,
        purpose: &str,
        model: String,
        business_unit_id: Option<i64>,
        conversation_id: Option<i64>,
        tokens: Option<crate::backend::TokenUsage>,
        response_time_ms: Option<u64>,
        error: Option<String>,
    ) {
        self.usage
            .record(UsageRecord {
                tenant_id: request.user.tenant_id,
                user_id: Some(request.user.user_id),
                business_unit_id,
                purpose: purpose.to_string(),
                tier,
                model,
                tokens_input: tokens.map(|t| t.input_tokens),
                tokens_output: tokens.map(|t| t.output_tokens),
                response_time_ms,
                error,
                conversation_id,
            })
            .await;
    }

    /// Factory handle, mainly for callers that want tier metadata.
    pub fn factory(&self) -> &BackendFactory {
        &self.factory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryPortalStore;
    use chrono::Utc;

    fn orchestrator() -> ChatOrchestrator {
        ChatOrchestrator::with_shared_store(
            AtriumConfig::default(),
            Arc::new(InMemoryPortalStore::new()),
        )
    }

    fn history() -> Vec<StoredMessage> {
        vec![
            StoredMessage {
                id: 1,
                conversation_id: 1,
                role: MessageRole::User,
                content: "earlier question".into(),
                created_at: Utc::now(),
            },
            StoredMessage {
                id: 2,
                conversation_id: 1,
                role: MessageRole::Assistant,
                content: "earlier answer".into(),
                created_at: Utc::now(),
            },
        ]
    }

    #[test]
    fn management_dispatch_carries_history_as_turns() {
        let messages =
            orchestrator().dispatch_messages(ChatMode::Management, &history(), "new question");
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].content, "earlier question");
        assert_eq!(messages[1].role, MessageRole::Assistant);
        assert_eq!(messages[2].content, "new question");
        assert_eq!(messages[2].role, MessageRole::User);
    }

    #[test]
    fn staff_dispatch_sends_only_the_composed_message() {
        // Staff history is quoted inside the context block instead.
        let messages =
            orchestrator().dispatch_messages(ChatMode::StaffQa, &history(), "new question");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "new question");
    }

    #[test]
    fn suggestions_are_static_and_tenant_neutral() {
        let suggestions = orchestrator().suggestions();
        assert_eq!(suggestions.len(), 3);
        assert!(suggestions.iter().all(|s| !s.is_empty()));
    }
}
