//! Sitemap-first seed discovery
//!
//! Candidate sitemaps are the ones robots.txt declares, followed by the two
//! conventional locations. They are tried in order and the first one that
//! yields any page URL wins; a sitemap index is expanded one level deep.

use crate::crawler::Fetcher;
use crate::extract::{extract_child_sitemaps, extract_sitemap_urls, is_sitemap_index};
use crate::robots::RobotsPolicy;
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

/// Conventional sitemap locations probed after the declared ones
const CONVENTIONAL_SITEMAPS: &[&str] = &["/sitemap.xml", "/sitemap_index.xml"];

/// Maximum child sitemaps fetched from one sitemap index
pub const MAX_CHILD_SITEMAPS: usize = 5;

/// Lists the sitemap URLs to try for an origin, in order
pub fn sitemap_candidates(origin: &Url, robots: Option<&RobotsPolicy>) -> Vec<Url> {
    let declared = robots
        .map(|policy| policy.sitemaps())
        .unwrap_or_default()
        .iter()
        .filter_map(|raw| origin.join(raw.trim()).ok())
        .filter(|url| url.scheme() == "http" || url.scheme() == "https");

    let conventional = CONVENTIONAL_SITEMAPS
        .iter()
        .filter_map(|path| origin.join(path).ok());

    let mut seen = HashSet::new();
    declared
        .chain(conventional)
        .filter(|url| seen.insert(url.as_str().to_string()))
        .collect()
}

/// Fetches one sitemap and returns the page URLs it lists
///
/// A sitemap index contributes the pages of its first
/// [`MAX_CHILD_SITEMAPS`] children; nested indexes are not followed.
pub async fn urls_from_sitemap(
    fetcher: &Fetcher,
    sitemap: &Url,
    origin: &Url,
    timeout: Duration,
) -> Vec<Url> {
    let Some(xml) = fetcher.fetch_text(sitemap, timeout).await else {
        return Vec::new();
    };

    if !is_sitemap_index(&xml) {
        return extract_sitemap_urls(&xml, origin);
    }

    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for child in extract_child_sitemaps(&xml, origin)
        .into_iter()
        .take(MAX_CHILD_SITEMAPS)
    {
        tracing::debug!("Expanding child sitemap {}", child);
        let Some(child_xml) = fetcher.fetch_text(&child, timeout).await else {
            continue;
        };
        urls.extend(
            extract_sitemap_urls(&child_xml, origin)
                .into_iter()
                .filter(|url| seen.insert(url.as_str().to_string())),
        );
    }

    urls
}

/// Discovers seed URLs from the origin's sitemaps
///
/// Returns at most `limit` URLs from the first candidate sitemap that lists
/// any, or an empty list when none does.
pub async fn discover_sitemap_urls(
    fetcher: &Fetcher,
    origin: &Url,
    robots: Option<&RobotsPolicy>,
    timeout: Duration,
    limit: usize,
) -> Vec<Url> {
    for sitemap in sitemap_candidates(origin, robots) {
        let mut urls = urls_from_sitemap(fetcher, &sitemap, origin, timeout).await;
        if !urls.is_empty() {
            urls.truncate(limit);
            tracing::info!("Seeding {} URLs from {}", urls.len(), sitemap);
            return urls;
        }
        tracing::debug!("No page URLs in {}", sitemap);
    }

    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(urls: Vec<Url>) -> Vec<String> {
        urls.into_iter().map(|u| u.to_string()).collect()
    }

    #[test]
    fn test_conventional_candidates_without_robots() {
        let origin = Url::parse("https://example.com/").unwrap();
        assert_eq!(
            strings(sitemap_candidates(&origin, None)),
            vec![
                "https://example.com/sitemap.xml",
                "https://example.com/sitemap_index.xml"
            ]
        );
    }

    #[test]
    fn test_declared_candidates_come_first() {
        let origin = Url::parse("https://example.com/").unwrap();
        let robots = RobotsPolicy::from_content(
            "User-agent: *\nAllow: /\nSitemap: https://example.com/produtos.xml\nSitemap: /sitemap.xml\n",
        );
        assert_eq!(
            strings(sitemap_candidates(&origin, Some(&robots))),
            vec![
                "https://example.com/produtos.xml",
                "https://example.com/sitemap.xml",
                "https://example.com/sitemap_index.xml"
            ]
        );
    }
}
