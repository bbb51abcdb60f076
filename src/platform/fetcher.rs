//! HTTP page fetcher for the video host

use crate::error::RvhError;
use reqwest::{Client, ClientBuilder, Response};
use scraper::Html;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Desktop browser user agent; the host serves stripped pages to unknown agents
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Per-request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: Option<String>,
    /// Proxy URL
    pub proxy_url: Option<String>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: None,
            proxy_url: None,
        }
    }
}

impl HttpClientConfig {
    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = Some(user_agent.to_string());
        self
    }

    /// Route requests through a proxy
    pub fn with_proxy(mut self, proxy_url: &str) -> Self {
        self.proxy_url = Some(proxy_url.to_string());
        self
    }
}

/// A fetched page: where it ended up and its raw body
#[derive(Debug, Clone)]
pub struct ParsedPage {
    url: Url,
    text: String,
}

impl ParsedPage {
    /// Create a page from its final URL and body text
    pub fn new(url: Url, text: impl Into<String>) -> Self {
        Self {
            url,
            text: text.into(),
        }
    }

    /// Final URL of the page (after redirects)
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Raw body text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Parse the body into a document tree
    ///
    /// `Html` is not `Send`; parse, inspect and drop it between awaits.
    pub fn document(&self) -> Html {
        Html::parse_document(&self.text)
    }
}

/// Page retrieval seam used by the extractor, resolver and aggregator
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch a page and keep its body
    async fn fetch(&self, url: &Url) -> Result<ParsedPage, RvhError>;

    /// Fetch a page for its server-side side effect only
    async fn fetch_discard(&self, url: &Url) -> Result<(), RvhError>;
}

/// `reqwest`-backed fetcher with a shared cookie jar
pub struct HttpFetcher {
    client: Client,
    config: HttpClientConfig,
}

impl HttpFetcher {
    /// Create a fetcher with default configuration
    pub fn new() -> Result<Self, RvhError> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a fetcher with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self, RvhError> {
        let mut builder = ClientBuilder::new()
            .timeout(config.timeout)
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .user_agent(
                config
                    .user_agent
                    .clone()
                    .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            );

        if let Some(proxy_url) = &config.proxy_url {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| RvhError::ClientError(format!("Invalid proxy {}: {}", proxy_url, e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| RvhError::ClientError(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Get the underlying HTTP client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Get client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Create a GET request with common browser headers
    fn create_request(&self, url: &Url) -> reqwest::RequestBuilder {
        self.client
            .get(url.clone())
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("Cache-Control", "no-cache")
    }

    /// Send a GET and reject anything but a 2xx
    async fn send(&self, url: &Url) -> Result<Response, RvhError> {
        let response = match self.create_request(url).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                warn!("Request to {} timed out", url);
                return Err(RvhError::fetch_failed(
                    url.as_str(),
                    format!("timed out after {}", humantime::format_duration(self.config.timeout)),
                ));
            }
            Err(e) => return Err(RvhError::fetch_failed(url.as_str(), e)),
        };

        let status = response.status();
        if !status.is_success() {
            warn!("HTTP request to {} failed with status: {}", url, status);
            return Err(RvhError::fetch_failed(url.as_str(), format!("HTTP {}", status)));
        }

        Ok(response)
    }
}

#[async_trait::async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<ParsedPage, RvhError> {
        debug!("GET {}", url);
        let response = self.send(url).await?;
        let final_url = response.url().clone();
        let text = response
            .text()
            .await
            .map_err(|e| RvhError::fetch_failed(url.as_str(), e))?;

        debug!("Fetched {} ({} bytes)", final_url, text.len());
        Ok(ParsedPage::new(final_url, text))
    }

    async fn fetch_discard(&self, url: &Url) -> Result<(), RvhError> {
        debug!("GET {} (body discarded)", url);
        self.send(url).await?;
        Ok(())
    }
}
