//! Domain entities the orchestration core reads and writes.
//!
//! Storage and lifecycle of these records are owned by the surrounding
//! portal; the core only passes them across the collaborator traits in
//! [`crate::store`].

use crate::tier::Tier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authenticated caller identity, supplied by the external auth layer.
///
/// The core trusts this as given and never re-validates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: i64,
    pub tenant_id: i64,
    pub business_unit_id: Option<i64>,
    /// Role string as issued by the portal ("staff", "manager", "executive", "admin").
    pub role: String,
}

/// One chat session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    pub tenant_id: i64,
    pub user_id: i64,
    pub business_unit_id: Option<i64>,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Message role within a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// One persisted turn utterance. Immutable once written; ordered by
/// creation time within its conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: i64,
    pub conversation_id: i64,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// AI-relevant subset of a tenant's settings. Read-only from the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantAiSettings {
    /// Raw tier policy value as stored by tenant administration. Parsed at
    /// the factory boundary so unknown values degrade instead of failing.
    pub tier_policy: String,
    /// Free-text company context prepended to the system prompt when set.
    pub company_context: Option<String>,
    /// Tenant display name used in the default prompt template.
    pub display_name: Option<String>,
    pub max_tokens_override: Option<u32>,
}

impl Default for TenantAiSettings {
    fn default() -> Self {
        Self {
            tier_policy: "all".to_string(),
            company_context: None,
            display_name: None,
            max_tokens_override: None,
        }
    }
}

/// Append-only audit row for one model call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub tenant_id: i64,
    pub user_id: Option<i64>,
    pub business_unit_id: Option<i64>,
    pub purpose: String,
    pub tier: Tier,
    pub model: String,
    pub tokens_input: Option<u32>,
    pub tokens_output: Option<u32>,
    pub response_time_ms: Option<u64>,
    pub error: Option<String>,
    pub conversation_id: Option<i64>,
}

/// Topic classification for an extracted issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueTopic {
    Menu,
    Operation,
    CustomerComplaint,
    FutureRisk,
    SalesOpportunity,
    Staffing,
    Other,
}

impl IssueTopic {
    /// Parse the topic field of a structured extraction block.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "menu" => Some(IssueTopic::Menu),
            "operation" => Some(IssueTopic::Operation),
            "customer_complaint" => Some(IssueTopic::CustomerComplaint),
            "future_risk" => Some(IssueTopic::FutureRisk),
            "sales_opportunity" => Some(IssueTopic::SalesOpportunity),
            "staffing" => Some(IssueTopic::Staffing),
            "other" => Some(IssueTopic::Other),
            _ => None,
        }
    }
}

/// Lifecycle status of an issue. The core only ever proposes `Open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Open,
    InProgress,
    Resolved,
    Archived,
}

/// A proposed record of a reported operational problem, derived from a chat
/// turn. Persistence and dedup against existing issues are delegated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCandidate {
    pub tenant_id: i64,
    pub business_unit_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub topic: IssueTopic,
    pub status: IssueStatus,
    pub created_by_user_id: i64,
    pub conversation_id: Option<i64>,
}

/// Category of an extracted insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    Risk,
    Opportunity,
    Improvement,
}

impl InsightKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "risk" => Some(InsightKind::Risk),
            "opportunity" => Some(InsightKind::Opportunity),
            "improvement" => Some(InsightKind::Improvement),
            _ => None,
        }
    }
}

/// A proposed AI-surfaced observation, scored 0-100 for importance.
///
/// `created_by: None` marks the record as AI-authored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightCandidate {
    pub tenant_id: i64,
    pub business_unit_id: Option<i64>,
    pub title: String,
    pub content: String,
    pub kind: InsightKind,
    pub score: u8,
    pub created_by: Option<i64>,
}

/// One operational daily-log entry, as exposed by the logging collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyLogEntry {
    pub log_date: String,
    pub sales_amount: i64,
    pub customers_count: i64,
    pub transaction_count: i64,
    pub weather: Option<String>,
    pub highlight: Option<String>,
    pub problem: Option<String>,
}

/// Aggregate over recent daily logs, used as prompt context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogSummary {
    pub log_count: u32,
    pub total_sales: i64,
    pub total_customers: i64,
    pub avg_sales: f64,
    pub avg_customers: f64,
}

/// Knowledge-base excerpt matched by substring search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeExcerpt {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}
