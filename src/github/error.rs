//! Fetch error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while fetching the latest commit for a repository
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Repository not found: {0}")]
    NotFound(String),

    #[error("Authentication failed (status {0})")]
    Auth(u16),

    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl FetchError {
    /// Check if this error is worth retrying on a later cycle
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::NotFound(_) => false,
            FetchError::Auth(_) => false,
            FetchError::RateLimited { .. } => true,
            FetchError::Api { status, .. } => *status >= 500,
            FetchError::Network(_) => true,
            FetchError::InvalidResponse(_) => false,
        }
    }

    /// Short kind label for log output
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::NotFound(_) => "not-found",
            FetchError::Auth(_) => "auth",
            FetchError::RateLimited { .. } => "rate-limited",
            FetchError::Api { .. } => "api",
            FetchError::Network(_) => "network",
            FetchError::InvalidResponse(_) => "invalid-response",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_transient() {
        assert!(
            FetchError::RateLimited {
                retry_after: Duration::from_secs(60)
            }
            .is_transient()
        );

        assert!(
            FetchError::Api {
                status: 503,
                message: "unavailable".to_string()
            }
            .is_transient()
        );

        assert!(
            !FetchError::Api {
                status: 422,
                message: "unprocessable".to_string()
            }
            .is_transient()
        );

        assert!(!FetchError::NotFound("acme/widgets".to_string()).is_transient());
        assert!(!FetchError::Auth(401).is_transient());
        assert!(!FetchError::InvalidResponse("empty".to_string()).is_transient());
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(FetchError::NotFound("a/b".to_string()).kind(), "not-found");
        assert_eq!(FetchError::Auth(403).kind(), "auth");
        assert_eq!(
            FetchError::RateLimited {
                retry_after: Duration::from_secs(1)
            }
            .kind(),
            "rate-limited"
        );
    }
}
