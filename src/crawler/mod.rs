//! Crawler module for website harvesting
//!
//! This module contains the crawl engine and what it is built from:
//! - HTTP fetching with timeouts, byte caps and soft-404 rejection
//! - Sitemap-first seed discovery
//! - The priority-biased frontier
//! - Crawl coordination over a bounded worker pool

mod coordinator;
mod fetcher;
mod frontier;
pub mod limits;
mod seeding;

pub use coordinator::{CrawlOptions, CrawlOutcome, CrawlRequest, Harvester, ROBOTS_WARNING};
pub use fetcher::{build_http_client, user_agent_string, Fetcher, MAX_TEXT_BYTES};
pub use frontier::{Frontier, FrontierItem};
pub use seeding::{discover_sitemap_urls, sitemap_candidates, urls_from_sitemap, MAX_CHILD_SITEMAPS};
