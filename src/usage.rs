//! Best-effort usage logging.
//!
//! One record per model call, written after the adapter returns or fails.
//! A failed write degrades to a warning; it never fails the parent turn.

use crate::domain::UsageRecord;
use crate::store::UsageStore;
use std::sync::Arc;

/// Maximum stored error text. Keeps stack traces and provider dumps out of
/// the audit table.
const ERROR_TEXT_MAX_CHARS: usize = 200;

/// Wraps the usage sink with the fire-and-forget contract.
pub struct UsageLogger {
    store: Arc<dyn UsageStore>,
}

impl UsageLogger {
    pub fn new(store: Arc<dyn UsageStore>) -> Self {
        Self { store }
    }

    /// Append one usage record. Errors are absorbed here.
    pub async fn record(&self, record: UsageRecord) {
        tracing::info!(
            tenant_id = record.tenant_id,
            user_id = record.user_id,
            purpose = %record.purpose,
            tier = %record.tier,
            model = %record.model,
            tokens_input = record.tokens_input,
            tokens_output = record.tokens_output,
            response_time_ms = record.response_time_ms,
            has_error = record.error.is_some(),
            "ai usage"
        );

        let tenant_id = record.tenant_id;
        let purpose = record.purpose.clone();
        if let Err(e) = self.store.append_usage_record(record).await {
            tracing::warn!(
                error = %e,
                tenant_id,
                purpose = %purpose,
                "failed to write usage record"
            );
        }
    }
}

/// Clip error text for storage in a usage record.
pub fn truncate_error(message: &str) -> String {
    message.chars().take(ERROR_TEXT_MAX_CHARS).collect()
}
