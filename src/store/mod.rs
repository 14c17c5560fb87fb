//! Collaborator interfaces consumed by the orchestration core.
//!
//! The portal owns persistence, schemas, and transactions; the core only
//! calls through these narrow async traits. A per-request transactional
//! scope is assumed to be held by the caller, so the core never sees a
//! half-committed turn.

pub mod memory;

pub use memory::InMemoryPortalStore;

use crate::domain::{
    Conversation, DailyLogEntry, InsightCandidate, IssueCandidate, KnowledgeExcerpt, LogSummary,
    MessageRole, StoredMessage, TenantAiSettings, UsageRecord,
};
use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by storage collaborators.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(&'static str),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Conversation and message persistence.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn create_conversation(
        &self,
        tenant_id: i64,
        user_id: i64,
        business_unit_id: Option<i64>,
        title: Option<String>,
    ) -> Result<Conversation, StoreError>;

    async fn get_conversation(&self, id: i64) -> Result<Option<Conversation>, StoreError>;

    /// Messages ordered by creation time, oldest first.
    async fn list_messages(&self, conversation_id: i64) -> Result<Vec<StoredMessage>, StoreError>;

    async fn append_message(
        &self,
        conversation_id: i64,
        role: MessageRole,
        content: String,
    ) -> Result<StoredMessage, StoreError>;

    /// Refresh the conversation's updated-at timestamp. Last write wins
    /// across concurrent turns on the same conversation.
    async fn touch_conversation(&self, id: i64) -> Result<(), StoreError>;
}

/// Read-only access to tenant AI settings.
#[async_trait]
pub trait TenantSettingsStore: Send + Sync {
    async fn get_ai_settings(&self, tenant_id: i64)
        -> Result<Option<TenantAiSettings>, StoreError>;
}

/// Operational daily-log reads used for prompt context.
#[async_trait]
pub trait OperationalLogStore: Send + Sync {
    async fn recent_logs(&self, scope_id: i64, days: u32)
        -> Result<Vec<DailyLogEntry>, StoreError>;

    async fn logs_summary(&self, scope_id: i64, days: u32) -> Result<LogSummary, StoreError>;

    async fn today_log(&self, user_id: i64) -> Result<Option<DailyLogEntry>, StoreError>;
}

/// Knowledge-base retrieval. Substring search, not vector search.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Business-unit-scoped items and tenant-wide items (no scope) are both
    /// eligible when `scope_id` is set.
    async fn search_knowledge(
        &self,
        query: &str,
        scope_id: Option<i64>,
        limit: usize,
    ) -> Result<Vec<KnowledgeExcerpt>, StoreError>;
}

/// Issue and insight persistence. Dedup semantics are store-owned; the core
/// only supplies the leading fragments to match against.
#[async_trait]
pub trait IssueInsightStore: Send + Sync {
    async fn find_similar_issue(
        &self,
        business_unit_id: Option<i64>,
        title_fragment: &str,
        description_fragment: &str,
    ) -> Result<Option<i64>, StoreError>;

    async fn create_issue(&self, candidate: IssueCandidate) -> Result<i64, StoreError>;

    async fn create_insight(&self, candidate: InsightCandidate) -> Result<i64, StoreError>;
}

/// Append-only usage log sink. Fire-and-forget from the core's perspective.
#[async_trait]
pub trait UsageStore: Send + Sync {
    async fn append_usage_record(&self, record: UsageRecord) -> Result<(), StoreError>;
}
