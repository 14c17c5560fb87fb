//! Error types for model backend operations.

use thiserror::Error;

/// Errors that can occur while configuring or calling a model backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Missing or invalid local configuration (credential, model id).
    /// Names the offending setting; never contains the secret value.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Provider rejected the configured credentials (401/403).
    #[error("Authentication rejected by provider: {0}")]
    Authentication(String),

    /// Provider throttled the request (429). The caller may retry with
    /// backoff; the adapter itself does not.
    #[error("Rate limited by provider: {0}")]
    RateLimited(String),

    /// Provider rejected the request shape (400), with remote detail.
    #[error("Provider rejected request: {0}")]
    BadRequest(String),

    /// Request exceeded deadline.
    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    /// Network connectivity error (DNS, connection refused, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// Provider returned an error response not covered above (5xx mostly).
    #[error("Provider error {status}: {message}")]
    Upstream { status: u16, message: String },

    /// Success response that doesn't match the provider's documented shape.
    #[error("Invalid provider response: {0}")]
    Protocol(String),
}

impl BackendError {
    /// Whether the whole turn may reasonably be retried by the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BackendError::RateLimited(_) | BackendError::Timeout(_) | BackendError::Network(_)
        )
    }

    /// Map a non-success HTTP status to the matching variant.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => BackendError::Authentication(body),
            429 => BackendError::RateLimited(body),
            400 => BackendError::BadRequest(body),
            _ => BackendError::Upstream {
                status,
                message: body,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert!(matches!(
            BackendError::from_status(401, String::new()),
            BackendError::Authentication(_)
        ));
        assert!(matches!(
            BackendError::from_status(403, String::new()),
            BackendError::Authentication(_)
        ));
        assert!(matches!(
            BackendError::from_status(429, String::new()),
            BackendError::RateLimited(_)
        ));
        assert!(matches!(
            BackendError::from_status(400, String::new()),
            BackendError::BadRequest(_)
        ));
        assert!(matches!(
            BackendError::from_status(500, String::new()),
            BackendError::Upstream { status: 500, .. }
        ));
    }

    #[test]
    fn retryability() {
        assert!(BackendError::Timeout(30000).is_retryable());
        assert!(BackendError::RateLimited("slow down".into()).is_retryable());
        assert!(!BackendError::Authentication("bad key".into()).is_retryable());
        assert!(!BackendError::Configuration("no key".into()).is_retryable());
        assert!(!BackendError::BadRequest("too long".into()).is_retryable());
    }
}
