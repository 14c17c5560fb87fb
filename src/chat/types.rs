//! Request/response types for the chat turn handler.

use crate::domain::UserContext;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which prompt/tier family a turn runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatMode {
    /// Lightweight floor-staff QA: lean prompt, standard-tier purpose.
    StaffQa,
    /// Full advisor mode: rich context, premium-tier purpose.
    Management,
}

impl ChatMode {
    /// Purpose string fed to tier resolution and usage records.
    pub fn purpose(&self) -> &'static str {
        match self {
            ChatMode::StaffQa => "staff_qa",
            ChatMode::Management => "management_decision",
        }
    }

    /// Role-based default when the caller didn't pick a mode explicitly.
    pub fn default_for_role(role: &str) -> Self {
        match role.to_ascii_lowercase().as_str() {
            "staff" | "manager" => ChatMode::StaffQa,
            _ => ChatMode::Management,
        }
    }
}

impl FromStr for ChatMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "staff_qa" => Ok(ChatMode::StaffQa),
            "management" | "management_decision" => Ok(ChatMode::Management),
            _ => Err(format!("Invalid chat mode: {}", s)),
        }
    }
}

/// One inbound chat turn.
#[derive(Debug, Clone)]
pub struct ChatTurnRequest {
    pub user: UserContext,
    pub message: String,
    /// Existing conversation, or None to start a new one.
    pub conversation_id: Option<i64>,
    /// Business-unit override; defaults to the user's own unit.
    pub business_unit_id: Option<i64>,
    /// Display label for the unit, when the portal resolved one.
    pub business_unit_label: Option<String>,
    /// Explicit mode wins over the role-based default.
    pub mode: Option<ChatMode>,
    /// Include full knowledge content instead of previews (menu lookups).
    pub include_full_knowledge: bool,
}

impl ChatTurnRequest {
    pub fn new(user: UserContext, message: impl Into<String>) -> Self {
        Self {
            user,
            message: message.into(),
            conversation_id: None,
            business_unit_id: None,
            business_unit_label: None,
            mode: None,
            include_full_knowledge: false,
        }
    }
}

/// Successful turn result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurnResponse {
    pub conversation_id: i64,
    pub reply: String,
    /// Id of the persisted assistant message.
    pub message_id: i64,
}

/// Health probe classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Result of a minimal round-trip through the configured backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthState,
    pub provider: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    pub message: String,
}
