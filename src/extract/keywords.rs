//! Keyword tables for heuristic issue/insight extraction.
//!
//! Matching is lowercase substring containment. The tables are deliberately
//! small and domain-flavored; extraction is a heuristic, not a classifier.

use crate::domain::IssueTopic;

/// Terms that mark a question as describing an operational problem.
pub const ISSUE_KEYWORDS: &[&str] = &[
    "problem",
    "issue",
    "trouble",
    "can't",
    "cannot",
    "unable",
    "how do i",
    "how to",
    "error",
    "failed",
    "failing",
    "stuck",
    "not working",
    "doesn't work",
    "complaint",
    "complained",
    "improve",
    "challenge",
];

/// Topic tables, checked in order; the first matching category wins.
pub const TOPIC_TABLES: &[(IssueTopic, &[&str])] = &[
    (
        IssueTopic::Menu,
        &["menu", "recipe", "dish", "ingredient", "preparation", "how to make"],
    ),
    (
        IssueTopic::Operation,
        &["procedure", "process", "workflow", "operation", "checklist", "steps"],
    ),
    (
        IssueTopic::CustomerComplaint,
        &["complaint", "complained", "unhappy", "dissatisfied", "refund", "angry"],
    ),
    (
        IssueTopic::FutureRisk,
        &["future", "risk", "worried", "concern", "long term", "trend"],
    ),
    (
        IssueTopic::SalesOpportunity,
        &["sales", "revenue", "sell more", "grow", "increase", "promotion", "opportunity"],
    ),
    (
        IssueTopic::Staffing,
        &["staffing", "staff", "hiring", "recruit", "shift", "short-handed", "turnover"],
    ),
];

/// Risk-flavored answer terms. Base score 70.
pub const RISK_KEYWORDS: &[&str] = &["risk", "danger", "concern", "threat", "warning", "caution"];

/// Opportunity-flavored answer terms. Base score 65.
pub const OPPORTUNITY_KEYWORDS: &[&str] =
    &["opportunity", "chance", "expand", "growth", "potential", "untapped"];

/// Improvement-flavored answer terms. Base score 60.
pub const IMPROVEMENT_KEYWORDS: &[&str] = &[
    "improve",
    "improvement",
    "suggest",
    "recommend",
    "consider",
    "worth trying",
];

/// Urgency language raises the score.
pub const URGENCY_KEYWORDS: &[&str] = &[
    "urgent",
    "critical",
    "immediately",
    "right away",
    "as soon as possible",
];

/// Triviality language lowers the score.
pub const TRIVIALITY_KEYWORDS: &[&str] = &["minor", "small", "slight", "negligible"];

/// Case-insensitive containment against a keyword table.
pub fn matches_any(text_lower: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| text_lower.contains(kw))
}
