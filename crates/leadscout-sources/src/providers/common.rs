//! Common utilities shared across source providers.

use crate::error::{Result, SourceError};
use leadscout_core::Throttle;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Build an HTTP client with the given timeout and user agent.
///
/// # Errors
/// Returns error if the HTTP client cannot be created.
pub fn build_http_client(timeout_secs: u64, user_agent: &str) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(user_agent)
        .build()
        .map_err(|e| SourceError::Internal(format!("failed to create HTTP client: {e}")))
}

/// Map a non-success HTTP status to a source error.
#[must_use]
pub fn status_error(provider: &str, status: StatusCode, body: String) -> SourceError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => SourceError::RateLimited {
            provider: provider.to_string(),
            message: body,
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SourceError::AccessDenied {
            provider: provider.to_string(),
            message: body,
        },
        _ => SourceError::ApiError {
            provider: provider.to_string(),
            status: status.as_u16(),
            message: body,
        },
    }
}

/// Check the status and decode a JSON body.
pub async fn read_json<T: DeserializeOwned>(provider: &str, response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(status_error(provider, status, body));
    }

    response.json().await.map_err(|e| {
        if e.is_decode() {
            SourceError::ParseError {
                provider: provider.to_string(),
                message: e.to_string(),
            }
        } else {
            SourceError::Network(e)
        }
    })
}

/// Paces the calls a provider makes within one search.
///
/// The caller already waited on the shared API throttle before invoking the
/// provider, so the first call of a search goes out immediately and every
/// later one waits its turn on the same throttle.
pub struct CallPacer<'a> {
    throttle: &'a Throttle,
    first: bool,
}

impl<'a> CallPacer<'a> {
    /// Start pacing a new search.
    #[must_use]
    pub fn new(throttle: &'a Throttle) -> Self {
        Self {
            throttle,
            first: true,
        }
    }

    /// Wait until the next call may be sent.
    pub async fn ready(&mut self) {
        if self.first {
            self.first = false;
            return;
        }
        self.throttle.ready().await;
    }
}
