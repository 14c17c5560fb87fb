//! Issue/insight extraction from model output.
//!
//! A pipeline of ordered strategies over an immutable input: structured
//! block parse first, then question and answer heuristics. Each strategy
//! returns no-match instead of raising, so a malformed block degrades to
//! heuristic mode and extraction never blocks the response path.

pub mod keywords;

use crate::domain::{InsightKind, IssueTopic};
use keywords::{
    matches_any, IMPROVEMENT_KEYWORDS, ISSUE_KEYWORDS, OPPORTUNITY_KEYWORDS, RISK_KEYWORDS,
    TOPIC_TABLES, TRIVIALITY_KEYWORDS, URGENCY_KEYWORDS,
};
use serde::Deserialize;

/// Minimum importance score for an insight to be proposed at all.
pub const INSIGHT_SCORE_THRESHOLD: u8 = 60;

const TITLE_MAX_CHARS: usize = 100;
const CONTENT_MAX_CHARS: usize = 500;

/// Issue fields extracted from one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedIssue {
    pub title: String,
    pub description: String,
    pub topic: IssueTopic,
}

/// Insight fields extracted from one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedInsight {
    pub title: String,
    pub content: String,
    pub kind: InsightKind,
    pub score: u8,
}

/// Extraction result: zero-or-one candidate of each kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub issue: Option<ExtractedIssue>,
    pub insight: Option<ExtractedInsight>,
}

/// Extract issue/insight candidates from a model answer and the question
/// that produced it.
///
/// Field values from a well-formed structured block win outright and skip
/// the heuristics entirely. The insight slot is only filled when the score
/// reaches [`INSIGHT_SCORE_THRESHOLD`], whichever path produced it.
pub fn extract(answer: &str, question: &str) -> Extraction {
    let mut extraction = match parse_structured_block(answer, question) {
        Some(extraction) => extraction,
        None => Extraction {
            issue: issue_from_question(question),
            insight: insight_from_answer(answer),
        },
    };

    if let Some(insight) = &extraction.insight {
        if insight.score < INSIGHT_SCORE_THRESHOLD {
            extraction.insight = None;
        }
    }

    extraction
}

/// Structured extraction block, as requested from the model in the
/// management prompt. Field names are a versioned contract; renaming any of
/// them breaks the primary parse path.
#[derive(Debug, Deserialize)]
struct StructuredBlock {
    issue_title: Option<String>,
    issue_description: Option<String>,
    issue_topic: Option<String>,
    insight_title: Option<String>,
    insight_content: Option<String>,
    insight_type: Option<String>,
    insight_score: Option<f64>,
}

/// Locate and parse a fenced ```json block in the answer.
///
/// Returns None both when no block exists and when the block is malformed;
/// the latter logs a warning and lets the heuristics run instead.
fn parse_structured_block(answer: &str, question: &str) -> Option<Extraction> {
    let fence_start = answer.find("```json")?;
    let body_start = fence_start + "```json".len();
    let body_len = answer[body_start..].find("```")?;
    let body = answer[body_start..body_start + body_len].trim();

    let block: StructuredBlock = match serde_json::from_str(body) {
        Ok(block) => block,
        Err(e) => {
            tracing::warn!(error = %e, "malformed structured block, falling back to heuristics");
            return None;
        }
    };

    let issue = if block.issue_title.is_some() || block.issue_description.is_some() {
        Some(ExtractedIssue {
            title: block
                .issue_title
                .unwrap_or_else(|| clip(question, TITLE_MAX_CHARS)),
            description: block
                .issue_description
                .unwrap_or_else(|| question.to_string()),
            topic: block
                .issue_topic
                .as_deref()
                .and_then(IssueTopic::parse)
                .unwrap_or_else(|| infer_topic(question)),
        })
    } else {
        None
    };

    let insight = if block.insight_title.is_some() || block.insight_content.is_some() {
        Some(ExtractedInsight {
            title: block.insight_title.unwrap_or_default(),
            content: block.insight_content.unwrap_or_default(),
            kind: block
                .insight_type
                .as_deref()
                .and_then(InsightKind::parse)
                .unwrap_or(InsightKind::Improvement),
            score: clamp_score(block.insight_score.unwrap_or(0.0)),
        })
    } else {
        None
    };

    Some(Extraction { issue, insight })
}

/// Question heuristic: synthesize an issue when the question reads like a
/// reported problem.
fn issue_from_question(question: &str) -> Option<ExtractedIssue> {
    let lower = question.to_lowercase();
    if !matches_any(&lower, ISSUE_KEYWORDS) {
        return None;
    }
    Some(ExtractedIssue {
        title: clip(question, TITLE_MAX_CHARS),
        description: question.to_string(),
        topic: infer_topic(question),
    })
}

/// First matching topic table wins; `Other` is the fallback.
fn infer_topic(question: &str) -> IssueTopic {
    let lower = question.to_lowercase();
    TOPIC_TABLES
        .iter()
        .find(|(_, keywords)| matches_any(&lower, keywords))
        .map(|(topic, _)| *topic)
        .unwrap_or(IssueTopic::Other)
}

/// Answer heuristic: keyword families assign a kind and base score, then
/// urgency/triviality language adjusts it. The threshold gate lives in
/// [`extract`], so this returns sub-threshold candidates as-is.
fn insight_from_answer(answer: &str) -> Option<ExtractedInsight> {
    let lower = answer.to_lowercase();

    let (kind, base) = if matches_any(&lower, RISK_KEYWORDS) {
        (InsightKind::Risk, 70i32)
    } else if matches_any(&lower, OPPORTUNITY_KEYWORDS) {
        (InsightKind::Opportunity, 65)
    } else if matches_any(&lower, IMPROVEMENT_KEYWORDS) {
        (InsightKind::Improvement, 60)
    } else {
        (InsightKind::Improvement, 50)
    };

    let mut score = base;
    if matches_any(&lower, URGENCY_KEYWORDS) {
        score += 20;
    }
    if matches_any(&lower, TRIVIALITY_KEYWORDS) {
        score -= 10;
    }
    let score = score.clamp(0, 100) as u8;

    let title = answer
        .lines()
        .next()
        .filter(|line| !line.trim().is_empty())
        .map(|line| clip(line, TITLE_MAX_CHARS))
        .unwrap_or_else(|| "AI suggestion".to_string());

    Some(ExtractedInsight {
        title,
        content: clip(answer, CONTENT_MAX_CHARS),
        kind,
        score,
    })
}

fn clamp_score(raw: f64) -> u8 {
    raw.clamp(0.0, 100.0) as u8
}

/// Truncate on a char boundary.
fn clip(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
