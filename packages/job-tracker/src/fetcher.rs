//! Listing fetcher.
//!
//! Retrieves the raw body of a job listing page. Failures are classified so
//! the add-job flow can say whether the server never answered, answered with
//! an error status, or the request could not be built at all.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use tracing::{debug, warn};
use url::Url;

use crate::error::{FetchError, FetchResult};

/// Many listing sites reject requests without a browser identification.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537";

/// Fetches a listing page by URL.
#[async_trait]
pub trait ListingFetcher: Send + Sync {
    /// Return the response body, or a classified failure.
    async fn fetch(&self, url: &str) -> FetchResult<String>;

    fn name(&self) -> &str;
}

/// reqwest-backed fetcher with a bounded timeout.
pub struct HttpFetcher {
    client: reqwest::Client,
    user_agent: String,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            user_agent: BROWSER_USER_AGENT.to_string(),
        })
    }

    /// Set a custom user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

#[async_trait]
impl ListingFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<String> {
        let parsed = parse_listing_url(url)?;
        debug!(url = %parsed, "HTTP fetch starting");

        let response = self
            .client
            .get(parsed)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "HTTP request failed");
                classify_send_error(url, e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Http {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(|e| FetchError::Network {
            url: url.to_string(),
            message: format!("failed reading body: {}", e),
        })?;

        debug!(url = %url, content_length = body.len(), "Listing fetched");
        Ok(body)
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Only absolute http(s) URLs are fetchable.
fn parse_listing_url(url: &str) -> FetchResult<Url> {
    let trimmed = url.trim();
    let parsed = Url::parse(trimmed).map_err(|e| FetchError::Setup {
        url: trimmed.to_string(),
        message: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(FetchError::Setup {
            url: trimmed.to_string(),
            message: format!("unsupported scheme: {}", other),
        }),
    }
}

fn classify_send_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_builder() {
        return FetchError::Setup {
            url: url.to_string(),
            message: error.to_string(),
        };
    }

    let message = if error.is_timeout() {
        format!("timed out: {}", error)
    } else {
        error.to_string()
    };

    FetchError::Network {
        url: url.to_string(),
        message,
    }
}
