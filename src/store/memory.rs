//! In-memory store implementation.
//!
//! Backs the integration tests and local demos. Each collection lives in a
//! `DashMap` keyed by entity id; id allocation is a shared atomic counter so
//! ids are unique across entity kinds within one store instance.

use super::{
    ConversationStore, IssueInsightStore, KnowledgeStore, OperationalLogStore, StoreError,
    TenantSettingsStore, UsageStore,
};
use crate::domain::{
    Conversation, DailyLogEntry, InsightCandidate, IssueCandidate, KnowledgeExcerpt, LogSummary,
    MessageRole, StoredMessage, TenantAiSettings, UsageRecord,
};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, PoisonError};

/// Knowledge row with its optional business-unit scope.
#[derive(Debug, Clone)]
struct KnowledgeRow {
    business_unit_id: Option<i64>,
    excerpt: KnowledgeExcerpt,
}

/// In-memory implementation of every collaborator trait.
#[derive(Default)]
pub struct InMemoryPortalStore {
    next_id: AtomicI64,
    conversations: DashMap<i64, Conversation>,
    messages: DashMap<i64, Vec<StoredMessage>>,
    tenant_settings: DashMap<i64, TenantAiSettings>,
    daily_logs: DashMap<i64, Vec<DailyLogEntry>>,
    today_logs: DashMap<i64, DailyLogEntry>,
    knowledge: Mutex<Vec<KnowledgeRow>>,
    issues: DashMap<i64, IssueCandidate>,
    insights: DashMap<i64, InsightCandidate>,
    usage: Mutex<Vec<UsageRecord>>,
    /// When set, `append_usage_record` fails with this message. Lets tests
    /// exercise the best-effort usage-logging contract.
    fail_usage_writes: Mutex<Option<String>>,
}

impl InMemoryPortalStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            ..Default::default()
        }
    }

    fn alloc_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    // Seeding helpers for tests and demos.

    pub fn set_tenant_settings(&self, tenant_id: i64, settings: TenantAiSettings) {
        self.tenant_settings.insert(tenant_id, settings);
    }

    pub fn add_knowledge(&self, business_unit_id: Option<i64>, excerpt: KnowledgeExcerpt) {
        self.knowledge
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(KnowledgeRow {
                business_unit_id,
                excerpt,
            });
    }

    pub fn add_daily_log(&self, scope_id: i64, entry: DailyLogEntry) {
        self.daily_logs.entry(scope_id).or_default().push(entry);
    }

    pub fn set_today_log(&self, user_id: i64, entry: DailyLogEntry) {
        self.today_logs.insert(user_id, entry);
    }

    pub fn fail_usage_writes(&self, message: &str) {
        *self
            .fail_usage_writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(message.to_string());
    }

    // Inspection helpers.

    pub fn usage_records(&self) -> Vec<UsageRecord> {
        self.usage
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn issues(&self) -> Vec<IssueCandidate> {
        self.issues.iter().map(|e| e.value().clone()).collect()
    }

    pub fn insights(&self) -> Vec<InsightCandidate> {
        self.insights.iter().map(|e| e.value().clone()).collect()
    }

    pub fn conversation_count(&self) -> usize {
        self.conversations.len()
    }
}

#[async_trait]
impl ConversationStore for InMemoryPortalStore {
    async fn create_conversation(
        &self,
        tenant_id: i64,
        user_id: i64,
        business_unit_id: Option<i64>,
        title: Option<String>,
    ) -> Result<Conversation, StoreError> {
        let now = Utc::now();
        let conversation = Conversation {
            id: self.alloc_id(),
            tenant_id,
            user_id,
            business_unit_id,
            title,
            created_at: now,
            updated_at: now,
        };
        self.conversations
            .insert(conversation.id, conversation.clone());
        self.messages.insert(conversation.id, Vec::new());
        Ok(conversation)
    }

    async fn get_conversation(&self, id: i64) -> Result<Option<Conversation>, StoreError> {
        Ok(self.conversations.get(&id).map(|c| c.clone()))
    }

    async fn list_messages(&self, conversation_id: i64) -> Result<Vec<StoredMessage>, StoreError> {
        Ok(self
            .messages
            .get(&conversation_id)
            .map(|m| m.clone())
            .unwrap_or_default())
    }

    async fn append_message(
        &self,
        conversation_id: i64,
        role: MessageRole,
        content: String,
    ) -> Result<StoredMessage, StoreError> {
        if !self.conversations.contains_key(&conversation_id) {
            return Err(StoreError::NotFound("conversation"));
        }
        let message = StoredMessage {
            id: self.alloc_id(),
            conversation_id,
            role,
            content,
            created_at: Utc::now(),
        };
        self.messages
            .entry(conversation_id)
            .or_default()
            .push(message.clone());
        Ok(message)
    }

    async fn touch_conversation(&self, id: i64) -> Result<(), StoreError> {
        match self.conversations.get_mut(&id) {
            Some(mut c) => {
                c.updated_at = Utc::now();
                Ok(())
            }
            None => Err(StoreError::NotFound("conversation")),
        }
    }
}

#[async_trait]
impl TenantSettingsStore for InMemoryPortalStore {
    async fn get_ai_settings(
        &self,
        tenant_id: i64,
    ) -> Result<Option<TenantAiSettings>, StoreError> {
        Ok(self.tenant_settings.get(&tenant_id).map(|s| s.clone()))
    }
}

#[async_trait]
impl OperationalLogStore for InMemoryPortalStore {
    async fn recent_logs(
        &self,
        scope_id: i64,
        _days: u32,
    ) -> Result<Vec<DailyLogEntry>, StoreError> {
        Ok(self
            .daily_logs
            .get(&scope_id)
            .map(|l| l.clone())
            .unwrap_or_default())
    }

    async fn logs_summary(&self, scope_id: i64, _days: u32) -> Result<LogSummary, StoreError> {
        let logs = self
            .daily_logs
            .get(&scope_id)
            .map(|l| l.clone())
            .unwrap_or_default();
        if logs.is_empty() {
            return Ok(LogSummary::default());
        }
        let total_sales: i64 = logs.iter().map(|l| l.sales_amount).sum();
        let total_customers: i64 = logs.iter().map(|l| l.customers_count).sum();
        let count = logs.len() as u32;
        Ok(LogSummary {
            log_count: count,
            total_sales,
            total_customers,
            avg_sales: total_sales as f64 / count as f64,
            avg_customers: total_customers as f64 / count as f64,
        })
    }

    async fn today_log(&self, user_id: i64) -> Result<Option<DailyLogEntry>, StoreError> {
        Ok(self.today_logs.get(&user_id).map(|l| l.clone()))
    }
}

#[async_trait]
impl KnowledgeStore for InMemoryPortalStore {
    async fn search_knowledge(
        &self,
        query: &str,
        scope_id: Option<i64>,
        limit: usize,
    ) -> Result<Vec<KnowledgeExcerpt>, StoreError> {
        let query = query.to_lowercase();
        let rows = self
            .knowledge
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let hits = rows
            .iter()
            .filter(|row| match (scope_id, row.business_unit_id) {
                // Tenant-wide rows are always eligible.
                (_, None) => true,
                (Some(scope), Some(unit)) => scope == unit,
                (None, Some(_)) => false,
            })
            .filter(|row| {
                query.is_empty()
                    || row.excerpt.title.to_lowercase().contains(&query)
                    || row.excerpt.content.to_lowercase().contains(&query)
            })
            .take(limit)
            .map(|row| row.excerpt.clone())
            .collect();
        Ok(hits)
    }
}

#[async_trait]
impl IssueInsightStore for InMemoryPortalStore {
    async fn find_similar_issue(
        &self,
        business_unit_id: Option<i64>,
        title_fragment: &str,
        description_fragment: &str,
    ) -> Result<Option<i64>, StoreError> {
        for entry in self.issues.iter() {
            let issue = entry.value();
            if issue.business_unit_id != business_unit_id {
                continue;
            }
            if (!title_fragment.is_empty() && issue.title.contains(title_fragment))
                || (!description_fragment.is_empty()
                    && issue.description.contains(description_fragment))
            {
                return Ok(Some(*entry.key()));
            }
        }
        Ok(None)
    }

    async fn create_issue(&self, candidate: IssueCandidate) -> Result<i64, StoreError> {
        let id = self.alloc_id();
        self.issues.insert(id, candidate);
        Ok(id)
    }

    async fn create_insight(&self, candidate: InsightCandidate) -> Result<i64, StoreError> {
        let id = self.alloc_id();
        self.insights.insert(id, candidate);
        Ok(id)
    }
}

#[async_trait]
impl UsageStore for InMemoryPortalStore {
    async fn append_usage_record(&self, record: UsageRecord) -> Result<(), StoreError> {
        let failure = self
            .fail_usage_writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(message) = failure {
            return Err(StoreError::Backend(message));
        }
        self.usage
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
        Ok(())
    }
}
