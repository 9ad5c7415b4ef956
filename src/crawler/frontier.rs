//! Crawl frontier
//!
//! Two tiers: links scoring at or above [`HIGH_PRIORITY`] go to the front of
//! the high tier, everything else to the back of the low tier. The high tier
//! is always drained first, so a likely product or category page is
//! attempted before any ordinary link queued earlier. Every URL ever queued
//! is remembered and never queued again.

use crate::extract::{link_priority, HIGH_PRIORITY};
use std::collections::{HashSet, VecDeque};
use url::Url;

/// A URL waiting to be crawled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierItem {
    pub url: Url,
    pub depth: u32,
}

/// Priority-biased queue of URLs with a seen set
#[derive(Debug, Default)]
pub struct Frontier {
    high: VecDeque<FrontierItem>,
    low: VecDeque<FrontierItem>,
    seen: HashSet<String>,
}

impl Frontier {
    /// Creates an empty frontier
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a seed at depth 0, keeping seed order
    ///
    /// Returns false if the URL was already seen.
    pub fn seed(&mut self, url: Url) -> bool {
        if !self.seen.insert(url.as_str().to_string()) {
            return false;
        }
        self.low.push_back(FrontierItem { url, depth: 0 });
        true
    }

    /// Queues a discovered link, placing it by [`link_priority`]
    ///
    /// Returns false if the URL was already seen.
    pub fn push(&mut self, url: Url, depth: u32) -> bool {
        if !self.seen.insert(url.as_str().to_string()) {
            return false;
        }

        let priority = link_priority(&url);
        let item = FrontierItem { url, depth };
        if priority >= HIGH_PRIORITY {
            tracing::trace!("Queued {} first (priority {})", item.url, priority);
            self.high.push_front(item);
        } else {
            self.low.push_back(item);
        }
        true
    }

    /// Takes the next URL to crawl
    pub fn pop(&mut self) -> Option<FrontierItem> {
        self.high.pop_front().or_else(|| self.low.pop_front())
    }

    /// Number of queued URLs
    pub fn len(&self) -> usize {
        self.high.len() + self.low.len()
    }

    /// True when nothing is queued
    pub fn is_empty(&self) -> bool {
        self.high.is_empty() && self.low.is_empty()
    }

    /// True if the URL has ever been queued
    pub fn has_seen(&self, url: &Url) -> bool {
        self.seen.contains(url.as_str())
    }

    /// Number of distinct URLs ever queued
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}
