//! Error types for the source providers.

use thiserror::Error;

/// Errors that can occur while querying a data source.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Quota or rate limit exhausted (`OVER_QUERY_LIMIT`, HTTP 429)
    #[error("rate limit exceeded for {provider}: {message}")]
    RateLimited {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Key rejected or access denied (`REQUEST_DENIED`, HTTP 401/403)
    #[error("access denied by {provider}: {message}")]
    AccessDenied {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// The provider rejected the request as malformed (`INVALID_REQUEST`)
    #[error("invalid request to {provider}: {message}")]
    InvalidRequest {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Non-success HTTP status not covered by a more specific variant
    #[error("API error ({provider}): status {status}, {message}")]
    ApiError {
        /// Provider name
        provider: String,
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },

    /// Response body could not be understood
    #[error("failed to parse response from {provider}: {message}")]
    ParseError {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Network error (connection refused, reset, DNS, timeout)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl SourceError {
    /// Whether retrying the same call later may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Network(_) => true,
            Self::ApiError { status, .. } => *status == 429 || *status >= 500,
            Self::AccessDenied { .. }
            | Self::InvalidRequest { .. }
            | Self::ParseError { .. }
            | Self::Internal(_) => false,
        }
    }
}

/// Result type alias for source operations.
pub type Result<T> = std::result::Result<T, SourceError>;
