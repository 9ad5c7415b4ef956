//! HTTP fetch layer
//!
//! Every request here is bounded by a per-request timeout and, for bodies,
//! a byte cap. Failures are never errors: a page that cannot be fetched, is
//! not HTML, or reads like a soft-404 simply comes back as `None`.

use crate::config::UserAgentConfig;
use crate::extract::looks_invalid;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{redirect::Policy, Client, Response};
use std::time::Duration;
use url::Url;

/// Upper bound for robots.txt and sitemap bodies
pub const MAX_TEXT_BYTES: usize = 5 * 1024 * 1024;

/// Byte cap for the GET fallback of [`Fetcher::check_url_ok`]
const CHECK_BYTES: usize = 128 * 1024;

const HTML_ACCEPT: &str = "text/html,application/xhtml+xml;q=0.9,*/*;q=0.5";

/// Builds the shared client: identifying user agent, at most 5 redirects,
/// compressed responses accepted
///
/// Timeouts are set per request, not on the client.
///
/// # Example
///
/// ```no_run
/// use guide_harvest::config::UserAgentConfig;
/// use guide_harvest::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "GuideHarvest".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/bot".to_string(),
///     contact_email: "bot@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config).expect("TLS backend available");
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent_string(config))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(5))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Formats the user agent: `CrawlerName/Version (+ContactURL; ContactEmail)`
pub fn user_agent_string(config: &UserAgentConfig) -> String {
    format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    )
}

/// True when a Content-Type header denotes an HTML document
fn is_html(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.contains("text/html") || content_type.contains("application/xhtml+xml")
}

fn content_type(response: &Response) -> &str {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// Reads a response body, stopping once `max_bytes` have been consumed
async fn read_capped(mut response: Response, max_bytes: usize) -> Option<Vec<u8>> {
    let mut body = Vec::new();

    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                let room = max_bytes - body.len();
                if chunk.len() >= room {
                    body.extend_from_slice(&chunk[..room]);
                    tracing::trace!("Body of {} capped at {} bytes", response.url(), max_bytes);
                    break;
                }
                body.extend_from_slice(&chunk);
            }
            Ok(None) => break,
            Err(e) => {
                tracing::debug!("Failed reading body of {}: {}", response.url(), e);
                return None;
            }
        }
    }

    Some(body)
}

/// Cheap-to-clone handle over the shared HTTP client
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Creates a fetcher identifying itself with the configured user agent
    pub fn new(config: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::from_client(build_http_client(config)?))
    }

    /// Wraps an existing client
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    async fn get(&self, url: &Url, timeout: Duration, accept: &str) -> Option<Response> {
        let response = match self
            .client
            .get(url.as_str())
            .header(ACCEPT, accept)
            .timeout(timeout)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("GET {} failed: {}", url, e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!("GET {} returned HTTP {}", url, response.status());
            return None;
        }

        Some(response)
    }

    /// Fetches an HTML page
    ///
    /// Returns `None` when the request fails or times out, the status is not
    /// a success, the Content-Type is not HTML, or the (capped) body looks
    /// like a soft-404, an empty listing or a `noindex` page.
    pub async fn fetch_html(&self, url: &Url, timeout: Duration, max_bytes: usize) -> Option<String> {
        let response = self.get(url, timeout, HTML_ACCEPT).await?;

        let mime = content_type(&response).to_string();
        if !is_html(&mime) {
            tracing::debug!("Skipping {}: content type '{}'", url, mime);
            return None;
        }

        let body = read_capped(response, max_bytes).await?;
        let html = String::from_utf8_lossy(&body).into_owned();

        if html.trim().is_empty() {
            return None;
        }

        if looks_invalid(&html) {
            tracing::debug!("Skipping {}: looks like a soft-404", url);
            return None;
        }

        Some(html)
    }

    /// Fetches a text resource (robots.txt, sitemap XML)
    ///
    /// Same as [`fetch_html`](Self::fetch_html) without the Content-Type and
    /// soft-404 gates; the body is capped at [`MAX_TEXT_BYTES`].
    pub async fn fetch_text(&self, url: &Url, timeout: Duration) -> Option<String> {
        let response = self.get(url, timeout, "*/*").await?;
        let body = read_capped(response, MAX_TEXT_BYTES).await?;
        Some(String::from_utf8_lossy(&body).into_owned())
    }

    /// Checks that a URL is a live, indexable HTML page
    ///
    /// A successful `HEAD` with an HTML Content-Type is enough. Otherwise a
    /// short `GET` must return HTML that passes the soft-404 heuristics.
    pub async fn check_url_ok(&self, url: &Url, timeout: Duration) -> bool {
        match self
            .client
            .head(url.as_str())
            .header(ACCEPT, HTML_ACCEPT)
            .timeout(timeout)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() && is_html(content_type(&response)) => {
                return true;
            }
            Ok(response) => {
                tracing::trace!("HEAD {} returned HTTP {}, trying GET", url, response.status());
            }
            Err(e) => {
                tracing::trace!("HEAD {} failed ({}), trying GET", url, e);
            }
        }

        self.fetch_html(url, timeout, CHECK_BYTES).await.is_some()
    }
}
