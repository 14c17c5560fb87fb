//! Prompt context assembly.
//!
//! Renders conversation history, operational-log summaries, and knowledge
//! excerpts into one bounded context block plus a system prompt. Assembly
//! never fails a turn: a collaborator error or missing mapping degrades to
//! an empty section.

use crate::config::ContextConfig;
use crate::domain::{StoredMessage, TenantAiSettings};
use crate::store::{KnowledgeStore, OperationalLogStore};
use std::fmt::Write as _;
use std::sync::Arc;

/// System prompt and composed user message for one backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledPrompt {
    pub system_prompt: String,
    pub user_message: String,
}

/// Inputs resolved by the orchestrator before assembly.
pub struct ContextInputs<'a> {
    pub question: &'a str,
    pub tenant_settings: Option<&'a TenantAiSettings>,
    /// Display label for the business unit, when the portal supplied one.
    pub unit_label: Option<&'a str>,
    pub role: &'a str,
    pub business_unit_id: Option<i64>,
    pub user_id: i64,
    /// Prior messages of the conversation, oldest first.
    pub history: &'a [StoredMessage],
    /// Include full knowledge content instead of previews (menu/reference
    /// lookups).
    pub include_full_knowledge: bool,
}

const FALLBACK_COMPANY: &str = "Atrium Portal";
const FALLBACK_UNIT: &str = "company-wide";

/// Builds prompts from the operational-log and knowledge collaborators.
pub struct ContextAssembler {
    logs: Arc<dyn OperationalLogStore>,
    knowledge: Arc<dyn KnowledgeStore>,
    config: ContextConfig,
}

impl ContextAssembler {
    pub fn new(
        logs: Arc<dyn OperationalLogStore>,
        knowledge: Arc<dyn KnowledgeStore>,
        config: ContextConfig,
    ) -> Self {
        Self {
            logs,
            knowledge,
            config,
        }
    }

    /// Lean prompt for the staff QA path: knowledge excerpts plus a short
    /// quote of the recent conversation.
    pub async fn assemble_staff(&self, inputs: &ContextInputs<'_>) -> AssembledPrompt {
        let mut context = String::new();

        let knowledge = self.knowledge_section(inputs).await;
        if !knowledge.is_empty() {
            context.push_str(&knowledge);
            context.push('\n');
        }

        let history = self.history_section(inputs.history);
        if !history.is_empty() {
            context.push_str(&history);
            context.push('\n');
        }

        let user_message = format!(
            "{context}\n[Question]\n{}\n\nAnswer briefly and clearly based on the information above.",
            inputs.question
        );

        AssembledPrompt {
            system_prompt: self.staff_system_prompt(inputs),
            user_message,
        }
    }

    /// Full advisor prompt for the management path: log summary, today's
    /// log, recent notes, knowledge, and the structured-block instruction.
    pub async fn assemble_management(&self, inputs: &ContextInputs<'_>) -> AssembledPrompt {
        let mut context = String::new();

        let logs = self.logs_section(inputs).await;
        if !logs.is_empty() {
            context.push_str(&logs);
            context.push('\n');
        }

        let knowledge = self.knowledge_section(inputs).await;
        if !knowledge.is_empty() {
            context.push_str(&knowledge);
            context.push('\n');
        }

        let user_message = format!(
            "{context}\n[Question]\n{}\n\n{}",
            inputs.question, MANAGEMENT_INSTRUCTIONS
        );

        AssembledPrompt {
            system_prompt: self.management_system_prompt(inputs),
            user_message,
        }
    }

    fn company_name(inputs: &ContextInputs<'_>) -> String {
        inputs
            .tenant_settings
            .and_then(|s| s.display_name.clone())
            .unwrap_or_else(|| FALLBACK_COMPANY.to_string())
    }

    /// Tenant company context wins over the built-in template; the unit
    /// label and role are appended either way.
    fn management_system_prompt(&self, inputs: &ContextInputs<'_>) -> String {
        let base = inputs
            .tenant_settings
            .and_then(|s| s.company_context.clone())
            .unwrap_or_else(|| {
                format!(
                    "You are the internal operations advisor for {}. You understand \
                     the differences between business units and give commercially \
                     realistic, actionable advice.",
                    Self::company_name(inputs)
                )
            });

        let unit = inputs.unit_label.unwrap_or(FALLBACK_UNIT);
        format!(
            "{base}\n\nCurrent user: {} ({})\nBusiness unit: {unit}",
            inputs.role, unit
        )
    }

    fn staff_system_prompt(&self, inputs: &ContextInputs<'_>) -> String {
        let unit = inputs.unit_label.unwrap_or(FALLBACK_UNIT);
        let base = match inputs.tenant_settings.and_then(|s| s.company_context.clone()) {
            Some(context) => format!(
                "{context}\n\nYou are currently answering questions from {unit} staff."
            ),
            None => format!(
                "You are an assistant answering questions from {} staff working at {unit}. \
                 Provide recipes, procedures, and precautions needed on the floor.",
                Self::company_name(inputs)
            ),
        };

        format!(
            "{base}\n\n\
             Answer policy:\n\
             - Keep answers short and plainly worded\n\
             - Show procedures as numbered steps\n\
             - Always include safety notes when relevant\n\
             - If the related knowledge below does not cover the question, say the \
             information is not registered yet and refer the person to their manager\n\n\
             Current user: {} ({unit})",
            inputs.role
        )
    }

    /// Knowledge section, or empty on no hits / store failure.
    async fn knowledge_section(&self, inputs: &ContextInputs<'_>) -> String {
        let hits = match self
            .knowledge
            .search_knowledge(
                inputs.question,
                inputs.business_unit_id,
                self.config.knowledge_limit,
            )
            .await
        {
            Ok(hits) => hits,
            Err(e) => {
                tracing::warn!(error = %e, "knowledge search failed, continuing without");
                return String::new();
            }
        };
        if hits.is_empty() {
            return String::new();
        }

        let mut section = String::from("[Related knowledge]\n");
        for hit in hits {
            let _ = writeln!(section, "## {}", hit.title);
            if inputs.include_full_knowledge
                || hit.content.chars().count() <= self.config.knowledge_preview_chars
            {
                let _ = writeln!(section, "{}", hit.content);
            } else {
                let preview: String = hit
                    .content
                    .chars()
                    .take(self.config.knowledge_preview_chars)
                    .collect();
                let _ = writeln!(section, "{preview}...");
            }
            if !hit.tags.is_empty() {
                let _ = writeln!(section, "Tags: {}", hit.tags.join(", "));
            }
        }
        section
    }

    /// Operational-log section: aggregate summary, today's log, and the
    /// most recent highlight/problem notes.
    async fn logs_section(&self, inputs: &ContextInputs<'_>) -> String {
        let Some(scope_id) = inputs.business_unit_id else {
            // No unit mapping for this user; skip the section entirely.
            return String::new();
        };

        let mut section = String::new();
        let days = self.config.recent_log_days;

        match self.logs.logs_summary(scope_id, days).await {
            Ok(summary) if summary.log_count > 0 => {
                let _ = writeln!(
                    section,
                    "[Recent summary]\n\
                     - Entries over the last {days} days: {}\n\
                     - Average sales: {:.0}\n\
                     - Average customers: {:.1}\n\
                     - Total sales: {}\n\
                     - Total customers: {}",
                    summary.log_count,
                    summary.avg_sales,
                    summary.avg_customers,
                    summary.total_sales,
                    summary.total_customers
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "log summary failed, continuing without");
            }
        }

        match self.logs.today_log(inputs.user_id).await {
            Ok(Some(today)) => {
                let _ = writeln!(
                    section,
                    "[Today]\n- Sales: {}\n- Customers: {}\n- Transactions: {}",
                    today.sales_amount, today.customers_count, today.transaction_count
                );
                if let Some(weather) = &today.weather {
                    let _ = writeln!(section, "- Weather: {weather}");
                }
                if let Some(highlight) = &today.highlight {
                    let _ = writeln!(section, "- What went well: {highlight}");
                }
                if let Some(problem) = &today.problem {
                    let _ = writeln!(section, "- Challenge: {problem}");
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "today log lookup failed, continuing without");
            }
        }

        match self.logs.recent_logs(scope_id, days).await {
            Ok(logs) => {
                let noted: Vec<_> = logs
                    .iter()
                    .filter(|l| l.highlight.is_some() || l.problem.is_some())
                    .take(self.config.recent_log_highlights)
                    .collect();
                if !noted.is_empty() {
                    section.push_str("[Recent log notes]\n");
                    for log in noted {
                        if let Some(highlight) = &log.highlight {
                            let _ = writeln!(section, "- {}: {highlight}", log.log_date);
                        }
                        if let Some(problem) = &log.problem {
                            let _ = writeln!(section, "- {}: {problem}", log.log_date);
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "recent logs lookup failed, continuing without");
            }
        }

        section
    }

    /// Short quote of the recent conversation for the staff path, oldest
    /// first, each line clipped.
    fn history_section(&self, history: &[StoredMessage]) -> String {
        if history.is_empty() {
            return String::new();
        }
        let start = history.len().saturating_sub(self.config.history_limit);
        let mut section = String::from("[Recent conversation]\n");
        for message in &history[start..] {
            let clipped: String = message
                .content
                .chars()
                .take(self.config.history_clip_chars)
                .collect();
            let suffix = if clipped.len() < message.content.len() {
                "..."
            } else {
                ""
            };
            let _ = writeln!(section, "{}: {clipped}{suffix}", message.role.as_str());
        }
        section
    }
}

/// Response-shape instruction for the management path. The fenced JSON
/// contract at the end is what the extractor's primary parse path reads;
/// its field names must stay in sync with `extract::StructuredBlock`.
const MANAGEMENT_INSTRUCTIONS: &str = "\
Based on the situation above, answer as the operations advisor with:\n\
1. Your reading of the current situation\n\
2. One action that can start tomorrow\n\
3. A small experiment to run over one or two weeks, with the metric to watch\n\
4. A wider-angle view across business units\n\
5. Risks and pitfalls to avoid\n\n\
Close with exactly one short follow-up question or simple suggested action.\n\n\
Optional: if you judge this question to describe an operational problem worth \
tracking, append a fenced JSON block in this exact form:\n\
```json\n\
{\n\
  \"issue_title\": \"summary title (max 100 chars)\",\n\
  \"issue_description\": \"details of the problem\",\n\
  \"issue_topic\": \"menu|operation|customer_complaint|future_risk|sales_opportunity|staffing|other\",\n\
  \"insight_title\": \"summary of the proposal (only when important)\",\n\
  \"insight_content\": \"details of the proposal (only when important)\",\n\
  \"insight_type\": \"risk|opportunity|improvement\",\n\
  \"insight_score\": 0\n\
}\n\
```";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DailyLogEntry, KnowledgeExcerpt, MessageRole};
    use crate::store::InMemoryPortalStore;
    use chrono::Utc;

    fn assembler(store: Arc<InMemoryPortalStore>) -> ContextAssembler {
        ContextAssembler::new(store.clone(), store, ContextConfig::default())
    }

    fn inputs<'a>(
        question: &'a str,
        settings: Option<&'a TenantAiSettings>,
        history: &'a [StoredMessage],
    ) -> ContextInputs<'a> {
        ContextInputs {
            question,
            tenant_settings: settings,
            unit_label: Some("Riverside Cafe"),
            role: "manager",
            business_unit_id: Some(1),
            user_id: 10,
            history,
            include_full_knowledge: false,
        }
    }

    #[tokio::test]
    async fn tenant_context_takes_precedence_over_template() {
        let store = Arc::new(InMemoryPortalStore::new());
        let settings = TenantAiSettings {
            company_context: Some("We are a regional cafe group.".into()),
            ..Default::default()
        };
        let prompt = assembler(store)
            .assemble_management(&inputs("q", Some(&settings), &[]))
            .await;
        assert!(prompt.system_prompt.starts_with("We are a regional cafe group."));
        // Unit label and role are still appended.
        assert!(prompt.system_prompt.contains("manager"));
        assert!(prompt.system_prompt.contains("Riverside Cafe"));
    }

    #[tokio::test]
    async fn default_template_used_without_tenant_context() {
        let store = Arc::new(InMemoryPortalStore::new());
        let prompt = assembler(store)
            .assemble_management(&inputs("q", None, &[]))
            .await;
        assert!(prompt.system_prompt.contains("Atrium Portal"));
    }

    #[tokio::test]
    async fn knowledge_is_previewed_not_dumped() {
        let store = Arc::new(InMemoryPortalStore::new());
        store.add_knowledge(
            Some(1),
            KnowledgeExcerpt {
                title: "Latte art basics".into(),
                content: "latte ".repeat(100),
                tags: vec!["menu".into()],
            },
        );
        let prompt = assembler(store)
            .assemble_staff(&inputs("latte", None, &[]))
            .await;
        assert!(prompt.user_message.contains("Latte art basics"));
        assert!(prompt.user_message.contains("..."));
        assert!(!prompt.user_message.contains(&"latte ".repeat(100)));
    }

    #[tokio::test]
    async fn full_knowledge_when_requested() {
        let store = Arc::new(InMemoryPortalStore::new());
        let content = "menu ".repeat(100);
        store.add_knowledge(
            Some(1),
            KnowledgeExcerpt {
                title: "Lunch menu".into(),
                content: content.clone(),
                tags: vec![],
            },
        );
        let mut input = inputs("menu", None, &[]);
        input.include_full_knowledge = true;
        let prompt = assembler(store).assemble_staff(&input).await;
        assert!(prompt.user_message.contains(&content));
    }

    #[tokio::test]
    async fn missing_unit_degrades_to_empty_log_section() {
        let store = Arc::new(InMemoryPortalStore::new());
        store.add_daily_log(1, DailyLogEntry::default());
        let mut input = inputs("q", None, &[]);
        input.business_unit_id = None;
        let prompt = assembler(store).assemble_management(&input).await;
        assert!(!prompt.user_message.contains("[Recent summary]"));
        // The turn still assembles.
        assert!(prompt.user_message.contains("[Question]"));
    }

    #[tokio::test]
    async fn log_summary_renders_for_scoped_unit() {
        let store = Arc::new(InMemoryPortalStore::new());
        store.add_daily_log(
            1,
            DailyLogEntry {
                log_date: "06/01".into(),
                sales_amount: 900,
                customers_count: 45,
                highlight: Some("sold out of scones".into()),
                ..Default::default()
            },
        );
        let prompt = assembler(store)
            .assemble_management(&inputs("q", None, &[]))
            .await;
        assert!(prompt.user_message.contains("[Recent summary]"));
        assert!(prompt.user_message.contains("sold out of scones"));
    }

    #[tokio::test]
    async fn staff_history_quotes_last_messages_in_order() {
        let store = Arc::new(InMemoryPortalStore::new());
        let history: Vec<StoredMessage> = (0..5)
            .map(|i| StoredMessage {
                id: i,
                conversation_id: 1,
                role: if i % 2 == 0 {
                    MessageRole::User
                } else {
                    MessageRole::Assistant
                },
                content: format!("message {i}"),
                created_at: Utc::now(),
            })
            .collect();
        let prompt = assembler(store)
            .assemble_staff(&inputs("q", None, &history))
            .await;
        // Only the last three are quoted.
        assert!(!prompt.user_message.contains("message 1"));
        assert!(prompt.user_message.contains("message 2"));
        assert!(prompt.user_message.contains("message 4"));
        let pos2 = prompt.user_message.find("message 2").unwrap();
        let pos4 = prompt.user_message.find("message 4").unwrap();
        assert!(pos2 < pos4);
    }

    #[tokio::test]
    async fn management_message_carries_block_contract() {
        let store = Arc::new(InMemoryPortalStore::new());
        let prompt = assembler(store)
            .assemble_management(&inputs("q", None, &[]))
            .await;
        assert!(prompt.user_message.contains("issue_title"));
        assert!(prompt.user_message.contains("insight_score"));
        assert!(prompt.user_message.contains("```json"));
    }
}
