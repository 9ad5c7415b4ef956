//! Robots.txt handling module
//!
//! This module provides the crawl kill-switch: a site whose robots.txt
//! disallows `/` for every agent is not crawled at all. Path-level rules are
//! not enforced.

mod parser;

pub use parser::RobotsPolicy;

use crate::crawler::Fetcher;
use std::time::Duration;
use url::Url;

/// Timeout for the robots.txt request
pub const ROBOTS_TIMEOUT: Duration = Duration::from_secs(4);

/// Fetches and parses robots.txt for an origin
///
/// Returns `None` when the file cannot be fetched (missing, non-success
/// status, network failure or timeout).
pub async fn fetch_robots(fetcher: &Fetcher, origin: &Url) -> Option<RobotsPolicy> {
    let robots_url = origin.join("/robots.txt").ok()?;
    let body = fetcher.fetch_text(&robots_url, ROBOTS_TIMEOUT).await?;
    Some(RobotsPolicy::from_content(&body))
}

/// Checks whether the origin's robots.txt shuts crawling off
///
/// Fails open: an unreachable robots.txt never disallows.
pub async fn check_disallowed(fetcher: &Fetcher, origin: &Url) -> bool {
    fetch_robots(fetcher, origin)
        .await
        .map(|policy| policy.disallows_everything())
        .unwrap_or(false)
}
