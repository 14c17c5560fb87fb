//! User-facing error taxonomy for chat turns.
//!
//! Only these variants cross the core's boundary; adapter and store errors
//! are mapped here, each to a distinct caller-visible condition. Every
//! variant carries the turn's request id so support can correlate a user
//! report with the server-side logs.

use crate::backend::BackendError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatError {
    /// Supplied conversation id doesn't exist or belongs to another user.
    /// Deliberately indistinguishable from a missing record.
    #[error("conversation not found [request {request_id}]")]
    ConversationNotFound { request_id: String },

    /// Configuration or credential problem. Fatal until an operator acts;
    /// the message names the setting to fix.
    #[error("AI service is not available: {message} [request {request_id}]")]
    ServiceUnavailable { request_id: String, message: String },

    /// Provider throttled the turn; the caller may retry later.
    #[error("AI service is busy, try again later [request {request_id}]")]
    RateLimited { request_id: String },

    /// The model call timed out; the whole turn may be retried.
    #[error("AI request timed out, try again [request {request_id}]")]
    Timeout { request_id: String },

    /// Provider rejected the request shape. A bug to fix, not retryable.
    #[error("AI request was rejected: {detail} [request {request_id}]")]
    BadRequest { request_id: String, detail: String },

    /// Anything else. Details stay in the logs, never in the response.
    #[error("internal error [request {request_id}]")]
    Internal { request_id: String },
}

impl ChatError {
    /// Stable machine-readable code for the portal's error envelope.
    pub fn error_code(&self) -> &'static str {
        match self {
            ChatError::ConversationNotFound { .. } => "conversation_not_found",
            ChatError::ServiceUnavailable { .. } => "ai_not_configured",
            ChatError::RateLimited { .. } => "ai_rate_limited",
            ChatError::Timeout { .. } => "ai_timeout",
            ChatError::BadRequest { .. } => "ai_bad_request",
            ChatError::Internal { .. } => "ai_error",
        }
    }

    /// Support correlation id attached at turn start.
    pub fn request_id(&self) -> &str {
        match self {
            ChatError::ConversationNotFound { request_id }
            | ChatError::ServiceUnavailable { request_id, .. }
            | ChatError::RateLimited { request_id }
            | ChatError::Timeout { request_id }
            | ChatError::BadRequest { request_id, .. }
            | ChatError::Internal { request_id } => request_id,
        }
    }

    /// Map an adapter failure to the user-facing taxonomy.
    pub fn from_backend(error: &BackendError, request_id: &str) -> Self {
        let request_id = request_id.to_string();
        match error {
            BackendError::Configuration(message) | BackendError::Authentication(message) => {
                ChatError::ServiceUnavailable {
                    request_id,
                    message: message.clone(),
                }
            }
            BackendError::RateLimited(_) => ChatError::RateLimited { request_id },
            BackendError::Timeout(_) => ChatError::Timeout { request_id },
            BackendError::BadRequest(detail) => ChatError::BadRequest {
                request_id,
                detail: detail.clone(),
            },
            // Network, upstream, and protocol failures are opaque to users.
            BackendError::Network(_)
            | BackendError::Upstream { .. }
            | BackendError::Protocol(_) => ChatError::Internal { request_id },
        }
    }
}
