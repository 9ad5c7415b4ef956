//! Live site-search
//!
//! Finds the pages of one site most relevant to a free-text query without
//! touching the cache:
//! - Shortlist URLs from the sitemap (or homepage links) by path tokens
//! - Fetch the best candidates and score path, title and body
//! - Verify each candidate is a live page and compute its confidence
//! - Return the top hits, dropping low-confidence ones when possible

mod score;
mod tokens;

pub use score::{composite_score, confidence, path_score, proximity_bonus, Candidate};
pub use tokens::{fold, occurrences, tokenize, words, MAX_TOKENS};

use crate::config::SearchConfig;
use crate::crawler::{discover_sitemap_urls, Fetcher};
use crate::extract::{extract_links, extract_meta, extract_readable_text};
use crate::robots::fetch_robots;
use crate::url::{origin_of, parse_website_url};
use crate::Result;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

/// Candidates fetched and scored per query
pub const MAX_CANDIDATES: usize = 15;

/// Hits returned per query
pub const MAX_RESULTS: usize = 5;

/// Minimum confidence a hit needs when the query has tokens
pub const MIN_CONFIDENCE: f64 = 0.6;

/// Homepage links considered when no sitemap entry matches
const MAX_HOMEPAGE_LINKS: usize = 200;

/// Sitemap URLs considered before token filtering
const MAX_SITEMAP_URLS: usize = 5_000;

/// One ranked page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub score: i32,
    pub verified: bool,
    pub confidence: f64,
}

/// Answer to one site-search query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub base: String,
    pub q: String,
    pub results: Vec<SearchHit>,
}

/// Keeps URLs whose path shares a token with the query, best first
fn shortlist(urls: Vec<Url>, tokens: &[String]) -> Vec<(Url, i32)> {
    let mut seen = HashSet::new();
    let mut scored: Vec<(Url, i32)> = urls
        .into_iter()
        .filter(|url| seen.insert(url.as_str().to_string()))
        .map(|url| {
            let score = path_score(&url, tokens);
            (url, score)
        })
        .filter(|(_, score)| tokens.is_empty() || *score > 0)
        .collect();

    // Stable sort keeps sitemap order among equal scores
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored
}

/// Applies the confidence threshold, ranking and result cap
///
/// When the threshold would leave nothing, the unfiltered ranking is used.
fn rank(mut hits: Vec<SearchHit>, has_tokens: bool) -> Vec<SearchHit> {
    hits.sort_by(|a, b| b.score.cmp(&a.score));

    let mut seen = HashSet::new();
    hits.retain(|hit| seen.insert(hit.url.clone()));

    if has_tokens {
        let confident: Vec<SearchHit> = hits
            .iter()
            .filter(|hit| hit.confidence >= MIN_CONFIDENCE)
            .cloned()
            .collect();
        if !confident.is_empty() {
            hits = confident;
        }
    }

    hits.truncate(MAX_RESULTS);
    hits
}

/// Searches one site for the pages most relevant to `q`
///
/// Only a malformed `base` is an error; an unreachable site yields an empty
/// result list.
///
/// # Example
///
/// ```no_run
/// use guide_harvest::config::{SearchConfig, UserAgentConfig};
/// use guide_harvest::crawler::Fetcher;
/// use guide_harvest::search::site_search;
///
/// # async fn example(agent: UserAgentConfig) -> Result<(), Box<dyn std::error::Error>> {
/// let fetcher = Fetcher::new(&agent)?;
/// let response = site_search(&fetcher, "https://adega.example", "vinho tinto", &SearchConfig::default()).await?;
/// for hit in response.results {
///     println!("{} ({:.2})", hit.url, hit.confidence);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn site_search(
    fetcher: &Fetcher,
    base: &str,
    q: &str,
    config: &SearchConfig,
) -> Result<SearchResponse> {
    let origin = origin_of(&parse_website_url(base)?);
    let timeout = Duration::from_millis(config.timeout_ms);
    let tokens = tokenize(q);

    let robots = fetch_robots(fetcher, &origin).await;
    let sitemap_urls =
        discover_sitemap_urls(fetcher, &origin, robots.as_ref(), timeout, MAX_SITEMAP_URLS).await;
    let mut candidates = shortlist(sitemap_urls, &tokens);

    if candidates.is_empty() {
        tracing::debug!("No sitemap candidates for '{}', trying homepage links", q);
        let links = match fetcher.fetch_html(&origin, timeout, config.max_html_bytes).await {
            Some(html) => extract_links(&origin, &html)
                .into_iter()
                .take(MAX_HOMEPAGE_LINKS)
                .collect(),
            None => Vec::new(),
        };
        candidates = shortlist(links, &tokens);
    }

    candidates.truncate(MAX_CANDIDATES);
    tracing::debug!("Scoring {} candidates on {}", candidates.len(), origin);

    let evaluations = candidates
        .iter()
        .map(|(url, _)| evaluate(fetcher, url, q, &tokens, timeout, config.max_html_bytes));
    let hits: Vec<SearchHit> = join_all(evaluations).await.into_iter().flatten().collect();

    let results = rank(hits, !tokens.is_empty());
    tracing::info!("Site search on {} for '{}': {} results", origin, q, results.len());

    Ok(SearchResponse {
        base: origin.to_string(),
        q: q.to_string(),
        results,
    })
}

/// Fetches, scores and verifies one candidate
///
/// A candidate whose page cannot be fetched is dropped.
async fn evaluate(
    fetcher: &Fetcher,
    url: &Url,
    q: &str,
    tokens: &[String],
    timeout: Duration,
    max_bytes: usize,
) -> Option<SearchHit> {
    let html = fetcher.fetch_html(url, timeout, max_bytes).await?;
    let title = extract_meta(&html).title;
    let body = extract_readable_text(&html);

    let candidate = Candidate::new(url, title.as_deref(), &body);
    let verified = fetcher.check_url_ok(url, timeout).await;

    Some(SearchHit {
        url: url.to_string(),
        title,
        score: composite_score(&candidate, q, tokens),
        verified,
        confidence: confidence(&candidate, tokens),
    })
}
