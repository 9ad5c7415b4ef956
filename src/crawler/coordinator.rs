//! Crawl engine - bounded frontier walk over one website
//!
//! A crawl runs through these steps:
//! - Resolve the request against the configured defaults
//! - Answer from the recent-crawl window when the same crawl just ran
//! - Apply the robots.txt kill-switch
//! - Seed from the first non-empty sitemap, or the homepage
//! - Drain the frontier with a fixed pool of workers until it is empty or
//!   enough pages were harvested

use crate::config::CrawlerConfig;
use crate::crawler::frontier::{Frontier, FrontierItem};
use crate::crawler::limits::{self, clamp};
use crate::crawler::seeding::discover_sitemap_urls;
use crate::crawler::Fetcher;
use crate::extract::{extract_links, scrape_page, ScrapedPage};
use crate::robots::fetch_robots;
use crate::url::{has_non_page_extension, origin_of, parse_website_url};
use crate::{HarvestError, Result};
use futures::future::join_all;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Notify};
use url::Url;

/// Warning attached to a crawl refused by robots.txt
pub const ROBOTS_WARNING: &str = "robots.txt disallows crawling this site";

/// A crawl trigger; every bound is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlRequest {
    pub website_url: String,
    #[serde(default)]
    pub max_pages: Option<usize>,
    #[serde(default)]
    pub max_depth: Option<u32>,
    #[serde(default)]
    pub max_concurrency: Option<usize>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub max_html_bytes: Option<usize>,
    #[serde(default)]
    pub include_patterns: Vec<String>,
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
    #[serde(default)]
    pub respect_robots_txt: Option<bool>,
}

impl CrawlRequest {
    /// Creates a request using the configured defaults for every bound
    pub fn new(website_url: impl Into<String>) -> Self {
        Self {
            website_url: website_url.into(),
            ..Self::default()
        }
    }
}

/// Fully resolved crawl parameters
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub origin: Url,
    pub max_pages: usize,
    pub max_depth: u32,
    pub max_concurrency: usize,
    pub timeout: Duration,
    pub max_html_bytes: usize,
    pub include: Vec<Regex>,
    pub exclude: Vec<Regex>,
    pub respect_robots_txt: bool,
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|source| HarvestError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })
        })
        .collect()
}

impl CrawlOptions {
    /// Fills missing values from `defaults` and clamps every bound
    ///
    /// Fails before any network activity on a malformed website URL or an
    /// invalid include/exclude pattern.
    ///
    /// # Example
    ///
    /// ```
    /// use guide_harvest::config::CrawlerConfig;
    /// use guide_harvest::crawler::{CrawlOptions, CrawlRequest};
    ///
    /// let mut request = CrawlRequest::new("https://adega.example/loja?x=1");
    /// request.max_pages = Some(1_000);
    ///
    /// let options = CrawlOptions::resolve(&request, &CrawlerConfig::default()).unwrap();
    /// assert_eq!(options.origin.as_str(), "https://adega.example/");
    /// assert_eq!(options.max_pages, 200);
    /// assert_eq!(options.max_depth, 2);
    /// ```
    pub fn resolve(request: &CrawlRequest, defaults: &CrawlerConfig) -> Result<Self> {
        let website = parse_website_url(&request.website_url)?;

        Ok(Self {
            origin: origin_of(&website),
            max_pages: clamp(
                request.max_pages.unwrap_or(defaults.max_pages),
                &limits::MAX_PAGES,
            ),
            max_depth: clamp(
                request.max_depth.unwrap_or(defaults.max_depth),
                &limits::MAX_DEPTH,
            ),
            max_concurrency: clamp(
                request.max_concurrency.unwrap_or(defaults.max_concurrency),
                &limits::MAX_CONCURRENCY,
            ),
            timeout: Duration::from_millis(clamp(
                request.timeout_ms.unwrap_or(defaults.timeout_ms),
                &limits::TIMEOUT_MS,
            )),
            max_html_bytes: clamp(
                request.max_html_bytes.unwrap_or(defaults.max_html_bytes),
                &limits::MAX_HTML_BYTES,
            ),
            include: compile_patterns(&request.include_patterns)?,
            exclude: compile_patterns(&request.exclude_patterns)?,
            respect_robots_txt: request
                .respect_robots_txt
                .unwrap_or(defaults.respect_robots_txt),
        })
    }

    /// True if a discovered link passes the include/exclude filters
    pub fn allows(&self, url: &Url) -> bool {
        if has_non_page_extension(url) {
            return false;
        }
        let target = url.as_str();
        let included = self.include.is_empty() || self.include.iter().any(|re| re.is_match(target));
        included && !self.exclude.iter().any(|re| re.is_match(target))
    }

    /// Identity of a crawl for the recent-crawl window
    ///
    /// Covers the origin, the page and depth bounds and the filters.
    pub fn cache_key(&self) -> String {
        let join = |patterns: &[Regex]| {
            patterns
                .iter()
                .map(|re| re.as_str())
                .collect::<Vec<_>>()
                .join("\u{1f}")
        };

        let mut hasher = Sha256::new();
        hasher.update(
            format!(
                "{}|{}|{}|{}|{}",
                self.origin,
                self.max_pages,
                self.max_depth,
                join(&self.include),
                join(&self.exclude)
            )
            .as_bytes(),
        );
        hex::encode(hasher.finalize())
    }
}

/// Result of one crawl
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlOutcome {
    pub base: String,
    pub total: usize,
    pub pages: Vec<ScrapedPage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl CrawlOutcome {
    fn harvested(origin: &Url, pages: Vec<ScrapedPage>) -> Self {
        Self {
            base: origin.to_string(),
            total: pages.len(),
            pages,
            warning: None,
        }
    }

    fn disallowed(origin: &Url) -> Self {
        Self {
            base: origin.to_string(),
            total: 0,
            pages: Vec::new(),
            warning: Some(ROBOTS_WARNING.to_string()),
        }
    }
}

/// Shared state of one frontier walk
struct WalkState {
    frontier: Frontier,
    pages: Vec<ScrapedPage>,
    in_flight: usize,
}

struct RecentCrawl {
    finished: Instant,
    outcome: CrawlOutcome,
}

/// The crawl engine
///
/// Holds the HTTP fetcher, the configured crawl defaults and the short
/// window of recently finished crawls used to absorb duplicate requests.
pub struct Harvester {
    fetcher: Fetcher,
    defaults: CrawlerConfig,
    recent: Mutex<HashMap<String, RecentCrawl>>,
}

impl Harvester {
    /// Creates a crawl engine
    pub fn new(fetcher: Fetcher, defaults: CrawlerConfig) -> Self {
        Self {
            fetcher,
            defaults,
            recent: Mutex::new(HashMap::new()),
        }
    }

    /// The fetcher shared by every crawl
    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// The defaults requests are resolved against
    pub fn defaults(&self) -> &CrawlerConfig {
        &self.defaults
    }

    fn recent_window(&self) -> Duration {
        Duration::from_secs(self.defaults.recent_window_secs)
    }

    /// Crawls one website
    ///
    /// A site shut off by robots.txt, or whose every seed fails, yields an
    /// empty outcome rather than an error. Errors are reserved for malformed
    /// requests.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use guide_harvest::config::{CrawlerConfig, UserAgentConfig};
    /// use guide_harvest::crawler::{CrawlRequest, Fetcher, Harvester};
    ///
    /// # async fn example(agent: UserAgentConfig) -> Result<(), Box<dyn std::error::Error>> {
    /// let harvester = Harvester::new(Fetcher::new(&agent)?, CrawlerConfig::default());
    /// let outcome = harvester.crawl(&CrawlRequest::new("https://adega.example")).await?;
    /// println!("{} pages from {}", outcome.total, outcome.base);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn crawl(&self, request: &CrawlRequest) -> Result<CrawlOutcome> {
        let options = CrawlOptions::resolve(request, &self.defaults)?;
        let key = options.cache_key();

        if let Some(outcome) = self.recent_outcome(&key).await {
            tracing::info!("Reusing crawl of {} finished moments ago", options.origin);
            return Ok(outcome);
        }

        let robots = fetch_robots(&self.fetcher, &options.origin).await;
        if options.respect_robots_txt
            && robots
                .as_ref()
                .is_some_and(|policy| policy.disallows_everything())
        {
            tracing::warn!("Not crawling {}: {}", options.origin, ROBOTS_WARNING);
            return Ok(CrawlOutcome::disallowed(&options.origin));
        }

        let started = Instant::now();
        let mut seeds = discover_sitemap_urls(
            &self.fetcher,
            &options.origin,
            robots.as_ref(),
            options.timeout,
            options.max_pages * 3,
        )
        .await;
        if seeds.is_empty() {
            tracing::info!("No sitemap for {}, seeding from the homepage", options.origin);
            seeds.push(options.origin.clone());
        }

        let pages = self.walk(&options, seeds).await;
        tracing::info!(
            "Crawled {}: {} pages in {:?}",
            options.origin,
            pages.len(),
            started.elapsed()
        );

        let outcome = CrawlOutcome::harvested(&options.origin, pages);
        self.remember(key, outcome.clone()).await;
        Ok(outcome)
    }

    async fn recent_outcome(&self, key: &str) -> Option<CrawlOutcome> {
        let recent = self.recent.lock().await;
        recent
            .get(key)
            .filter(|entry| entry.finished.elapsed() < self.recent_window())
            .map(|entry| entry.outcome.clone())
    }

    async fn remember(&self, key: String, outcome: CrawlOutcome) {
        let window = self.recent_window();
        let mut recent = self.recent.lock().await;
        recent.retain(|_, entry| entry.finished.elapsed() < window);
        recent.insert(
            key,
            RecentCrawl {
                finished: Instant::now(),
                outcome,
            },
        );
    }

    /// Drains the frontier with `max_concurrency` workers
    async fn walk(&self, options: &CrawlOptions, seeds: Vec<Url>) -> Vec<ScrapedPage> {
        let mut frontier = Frontier::new();
        for seed in seeds {
            frontier.seed(seed);
        }

        let state = Mutex::new(WalkState {
            frontier,
            pages: Vec::new(),
            in_flight: 0,
        });
        let progress = Notify::new();

        let (shared, progress) = (&state, &progress);
        let workers =
            (0..options.max_concurrency).map(|id| self.worker(id, options, shared, progress));
        join_all(workers).await;

        let state = state.into_inner();
        tracing::debug!(
            "Frontier walk of {} saw {} URLs",
            options.origin,
            state.frontier.seen_count()
        );
        state.pages
    }

    /// One worker: pop, visit, push children, until there is nothing left
    ///
    /// A worker finding the queue empty while others are still fetching
    /// waits for one of them to finish, since it may enqueue new links.
    async fn worker(
        &self,
        id: usize,
        options: &CrawlOptions,
        state: &Mutex<WalkState>,
        progress: &Notify,
    ) {
        loop {
            let item = {
                let mut walk = state.lock().await;
                if walk.pages.len() >= options.max_pages {
                    break;
                }
                let next = walk.frontier.pop();
                match next {
                    Some(item) => {
                        walk.in_flight += 1;
                        item
                    }
                    None if walk.in_flight == 0 => break,
                    None => {
                        // Registered before the lock is released so no wakeup is missed
                        let wake = progress.notified();
                        drop(walk);
                        wake.await;
                        continue;
                    }
                }
            };

            tracing::trace!("Worker {} visiting {} (depth {})", id, item.url, item.depth);
            let visited = self.visit(&item, options).await;

            {
                let mut walk = state.lock().await;
                walk.in_flight -= 1;
                if let Some((page, links)) = visited {
                    for link in links {
                        walk.frontier.push(link, item.depth + 1);
                    }
                    walk.pages.push(page);
                }
            }
            progress.notify_waiters();
        }

        // Let idle workers re-check the stop conditions
        progress.notify_waiters();
    }

    /// Fetches and scrapes one URL
    ///
    /// Returns the page and, below the depth limit, the links to follow.
    async fn visit(
        &self,
        item: &FrontierItem,
        options: &CrawlOptions,
    ) -> Option<(ScrapedPage, Vec<Url>)> {
        let html = self
            .fetcher
            .fetch_html(&item.url, options.timeout, options.max_html_bytes)
            .await?;

        let Some(page) = scrape_page(&item.url, &html) else {
            tracing::debug!("Skipping thin page {}", item.url);
            return None;
        };

        let links = if item.depth < options.max_depth {
            extract_links(&item.url, &html)
                .into_iter()
                .filter(|link| options.allows(link))
                .collect()
        } else {
            Vec::new()
        };

        Some((page, links))
    }
}
