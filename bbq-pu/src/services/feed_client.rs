//! SFBB player ID map client
//!
//! Fetches the upstream CSV with an identifying User-Agent and a request
//! timeout. The body is returned untouched for the tokenizer.

use bbq_common::config::FeedConfig;
use std::time::Duration;
use thiserror::Error;

/// Upstream fetch failures. Both mean "upstream unavailable"; nothing
/// has been parsed or written when either is returned.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Upstream answered with a non-2xx status
    #[error("Upstream fetch failed: {0} {1}")]
    Status(u16, String),

    /// Transport failure or timeout
    #[error("Fetch error: {0}")]
    Network(String),
}

/// HTTP client for the player ID map feed
#[derive(Debug, Clone)]
pub struct FeedClient {
    http_client: reqwest::Client,
    url: String,
}

impl FeedClient {
    pub fn new(config: &FeedConfig) -> Result<Self, FeedError> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FeedError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            url: config.url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// GET the feed and return its body as text
    pub async fn fetch_csv(&self) -> Result<String, FeedError> {
        tracing::debug!(url = %self.url, "Fetching player ID map");

        let response = self
            .http_client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FeedError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(
                status.as_u16(),
                status.canonical_reason().unwrap_or("Error").to_string(),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FeedError::Network(e.to_string()))?;

        tracing::debug!(bytes = body.len(), "Fetched player ID map");
        Ok(body)
    }
}
