//! Text reports for crawl outcomes, cache listings and search results

use crate::crawler::CrawlOutcome;
use crate::extract::PageKind;
use crate::search::SearchResponse;
use crate::storage::{CacheSummary, DocumentStatus};
use std::collections::HashMap;
use std::fmt::Write;

const KINDS: [PageKind; 4] = [PageKind::Product, PageKind::Page, PageKind::Blog, PageKind::Faq];

/// Pages per kind, in a fixed kind order, omitting kinds with no pages
pub fn kind_breakdown(outcome: &CrawlOutcome) -> Vec<(PageKind, usize)> {
    let mut counts: HashMap<PageKind, usize> = HashMap::new();
    for page in &outcome.pages {
        *counts.entry(page.kind).or_insert(0) += 1;
    }

    KINDS
        .iter()
        .filter_map(|kind| counts.get(kind).map(|count| (*kind, *count)))
        .collect()
}

/// Renders a short summary of one crawl
pub fn render_crawl_outcome(outcome: &CrawlOutcome) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== Crawl Summary ===\n");
    let _ = writeln!(out, "Base: {}", outcome.base);
    let _ = writeln!(out, "Pages: {}", outcome.total);
    if let Some(warning) = &outcome.warning {
        let _ = writeln!(out, "Warning: {}", warning);
    }

    let breakdown = kind_breakdown(outcome);
    if !breakdown.is_empty() {
        let _ = writeln!(out, "\nPages by Kind:");
        for (kind, count) in breakdown {
            let percentage = (count as f64 / outcome.total.max(1) as f64) * 100.0;
            let _ = writeln!(out, "  {:<8} {:>5} ({:.1}%)", kind, count, percentage);
        }
    }

    out
}

/// Renders one line per cached snapshot
pub fn render_cache_listing(entries: &[CacheSummary]) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== Cached Guides ===\n");
    if entries.is_empty() {
        let _ = writeln!(out, "No cached guides.");
        return out;
    }

    let mut active = 0;
    for entry in entries {
        let status = match entry.status {
            DocumentStatus::Active => {
                active += 1;
                "active"
            }
            DocumentStatus::Expired => "expired",
        };
        let _ = writeln!(
            out,
            "  {:<8} {} {} ({} pages, expires {})",
            status,
            entry.slug,
            entry.website_url,
            entry.pages,
            entry.expires_at.to_rfc3339()
        );
    }
    let _ = writeln!(out, "\n{} of {} snapshots active", active, entries.len());

    out
}

/// Renders ranked site-search hits
pub fn render_search_hits(response: &SearchResponse) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Search '{}' on {}:", response.q, response.base);
    if response.results.is_empty() {
        let _ = writeln!(out, "  (no results)");
        return out;
    }

    for (rank, hit) in response.results.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {}. [{:>3}] {} {}{}",
            rank + 1,
            hit.score,
            hit.url,
            hit.title.as_deref().unwrap_or(""),
            if hit.verified { "" } else { " (unverified)" }
        );
        let _ = writeln!(out, "       confidence {:.2}", hit.confidence);
    }

    out
}

pub fn print_crawl_outcome(outcome: &CrawlOutcome) {
    print!("{}", render_crawl_outcome(outcome));
}

pub fn print_cache_listing(entries: &[CacheSummary]) {
    print!("{}", render_cache_listing(entries));
}

pub fn print_search_hits(response: &SearchResponse) {
    print!("{}", render_search_hits(response));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ScrapedPage;
    use crate::search::SearchHit;
    use chrono::{Duration, Utc};

    fn page(path: &str, kind: PageKind) -> ScrapedPage {
        ScrapedPage {
            url: format!("https://adega.example{}", path),
            title: None,
            description: None,
            text: "texto".to_string(),
            kind,
        }
    }

    #[test]
    fn test_kind_breakdown_order() {
        let outcome = CrawlOutcome {
            base: "https://adega.example/".to_string(),
            total: 3,
            pages: vec![
                page("/faq", PageKind::Faq),
                page("/produtos/a", PageKind::Product),
                page("/produtos/b", PageKind::Product),
            ],
            warning: None,
        };
        assert_eq!(
            kind_breakdown(&outcome),
            vec![(PageKind::Product, 2), (PageKind::Faq, 1)]
        );

        let report = render_crawl_outcome(&outcome);
        assert!(report.contains("Pages: 3"));
        assert!(report.contains("66.7%"));
        assert!(!report.contains("Warning"));
    }

    #[test]
    fn test_cache_listing() {
        let now = Utc::now();
        let entries = vec![
            CacheSummary {
                slug: "adega".to_string(),
                website_url: "https://adega.example".to_string(),
                pages: 12,
                timestamp: now,
                expires_at: now + Duration::hours(4),
                status: DocumentStatus::Active,
            },
            CacheSummary {
                slug: "queijos".to_string(),
                website_url: "https://queijos.example".to_string(),
                pages: 3,
                timestamp: now - Duration::hours(5),
                expires_at: now - Duration::hours(1),
                status: DocumentStatus::Expired,
            },
        ];
        let report = render_cache_listing(&entries);
        assert!(report.contains("adega https://adega.example (12 pages"));
        assert!(report.contains("expired  queijos"));
        assert!(report.contains("1 of 2 snapshots active"));

        assert!(render_cache_listing(&[]).contains("No cached guides."));
    }

    #[test]
    fn test_search_hits() {
        let response = SearchResponse {
            base: "https://adega.example/".to_string(),
            q: "vinho tinto".to_string(),
            results: vec![SearchHit {
                url: "https://adega.example/vinho-tinto".to_string(),
                title: Some("Vinho Tinto".to_string()),
                score: 120,
                verified: false,
                confidence: 1.0,
            }],
        };
        let report = render_search_hits(&response);
        assert!(report.contains("1. [120] https://adega.example/vinho-tinto Vinho Tinto (unverified)"));
        assert!(report.contains("confidence 1.00"));
    }
}
