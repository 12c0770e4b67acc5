use crate::config::FetchConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Source of page and stylesheet text.
///
/// `None` means the resource is unavailable for any reason (transport error,
/// non-success status, empty body). Implementations never surface errors to
/// the pipeline; a missing resource becomes an empty contribution.
#[async_trait]
pub trait PageFetch: Send + Sync {
    /// Fetch `url` as text.
    async fn fetch_text(&self, url: &str) -> Option<String>;
}

/// HTTP client for pages and stylesheets
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Creates a new fetcher with the default timeout and user agent
    pub fn new() -> Result<Self> {
        Self::with_config(&FetchConfig::default())
    }

    /// Creates a new fetcher with a custom request timeout (primarily for tests)
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        Self::build(timeout, &FetchConfig::default().user_agent)
    }

    /// Creates a fetcher from the `[fetch]` configuration section
    pub fn with_config(config: &FetchConfig) -> Result<Self> {
        Self::build(Duration::from_secs(config.timeout_secs), &config.user_agent)
    }

    fn build(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(Error::Network)?;
        Ok(Self { client })
    }

    /// Fetches a URL, keeping the reason for a failure
    pub async fn fetch(&self, url: &str) -> Result<String> {
        let target = Url::parse(url).map_err(|e| Error::InvalidUrl(format!("'{url}': {e}")))?;
        let response = self.client.get(target).send().await?;
        let status = response.status();

        if !status.is_success() {
            if status == StatusCode::NOT_FOUND {
                return Err(Error::NotFound(format!("Resource not found at '{url}'")));
            }

            return match response.error_for_status() {
                Ok(_) => Err(Error::Other(format!("Unexpected status {status} for '{url}'"))),
                Err(err) => Err(Error::Network(err)),
            };
        }

        let content = response.text().await?;
        info!("Fetched {} bytes from {}", content.len(), url);
        Ok(content)
    }
}

#[async_trait]
impl PageFetch for Fetcher {
    async fn fetch_text(&self, url: &str) -> Option<String> {
        match self.fetch(url).await {
            Ok(content) if !content.is_empty() => Some(content),
            Ok(_) => {
                debug!(%url, "empty response body");
                None
            },
            Err(err) => {
                debug!(%url, error = %err, category = err.category(), "fetch unavailable");
                None
            },
        }
    }
}

// Note: Default is not implemented as Fetcher::new() can fail.
// Use Fetcher::new() directly and handle the Result.
