//! Website email extraction.

use crate::patterns::extract_emails_from_html;
use crate::robots::fetch_robots_txt;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors building an extractor.
#[derive(Error, Debug)]
pub enum EmailError {
    /// HTTP client could not be created
    #[error("failed to create HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Emails found on a business website.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailFindings {
    /// Addresses in order of first occurrence, unique case-insensitively
    pub emails: Vec<String>,
    /// Page the addresses were found on
    pub source_page: Option<String>,
}

/// Trait for looking up contact emails on a business website.
///
/// Implementations must never fail the caller: anything that goes wrong
/// (robots.txt disallow, network errors, bad status) yields `None`.
#[async_trait]
pub trait EmailExtractor: Send + Sync {
    /// Look for emails on `website_url`.
    async fn extract(&self, website_url: &str) -> Option<EmailFindings>;
}

/// Extractor that fetches the business homepage over HTTP.
pub struct HttpEmailExtractor {
    client: Client,
    user_agent: String,
}

impl HttpEmailExtractor {
    /// Create an extractor with the given user agent and timeout.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, EmailError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            user_agent: user_agent.to_string(),
        })
    }

    async fn robots_allow(&self, url: &Url) -> bool {
        match fetch_robots_txt(&self.client, url).await {
            Ok(robots) => robots.is_allowed(&self.user_agent, url.path()),
            Err(e) => {
                // Many small-business sites have no robots.txt at all.
                tracing::debug!(url = %url, error = %e, "robots.txt check failed, allowing");
                true
            }
        }
    }

    async fn fetch_page(&self, url: &Url) -> Option<String> {
        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, "text/html,application/xhtml+xml")
            .header(ACCEPT_LANGUAGE, "de-DE,de;q=0.9,en;q=0.8")
            .send()
            .await;

        match response {
            Ok(r) if r.status().is_success() => match r.text().await {
                Ok(body) => Some(body),
                Err(e) => {
                    tracing::debug!(url = %url, error = %e, "failed to read page body");
                    None
                }
            },
            Ok(r) => {
                tracing::debug!(url = %url, status = r.status().as_u16(), "page fetch returned error status");
                None
            }
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "page fetch failed");
                None
            }
        }
    }
}

#[async_trait]
impl EmailExtractor for HttpEmailExtractor {
    async fn extract(&self, website_url: &str) -> Option<EmailFindings> {
        let url = Url::parse(website_url).ok()?;
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }

        if !self.robots_allow(&url).await {
            tracing::info!(url = %url, "robots.txt disallows fetching, skipping email extraction");
            return None;
        }

        let html = self.fetch_page(&url).await?;
        let emails = extract_emails_from_html(&html);
        tracing::debug!(url = %url, count = emails.len(), "extracted emails");

        let source_page = (!emails.is_empty()).then(|| website_url.to_string());
        Some(EmailFindings {
            emails,
            source_page,
        })
    }
}
