//! Storage module for cached crawl results
//!
//! Each tenant's latest crawl is kept as one [`CacheDocument`] with a
//! time-to-live. Documents are held in memory under both the tenant slug and
//! the site's domain, and persisted as one JSON file per tenant.

mod file;
mod traits;

pub use file::FileCacheStore;
pub use traits::{CacheStore, StorageError, StorageResult};

use crate::extract::ScrapedPage;
use crate::url::{extract_domain, normalize_domain, parse_website_url};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Default snapshot time-to-live
pub const DEFAULT_TTL_HOURS: u64 = 4;

/// Lifecycle status of a cached snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Active,
    Expired,
}

/// One tenant's latest crawl snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheDocument {
    pub guide_slug: String,
    pub website_url: String,
    pub domain: String,
    pub pages: Vec<ScrapedPage>,
    pub timestamp: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: DocumentStatus,
}

impl CacheDocument {
    /// Builds an active snapshot taken at `now`
    pub fn new(
        guide_slug: &str,
        website_url: &str,
        pages: Vec<ScrapedPage>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            guide_slug: guide_slug.to_string(),
            website_url: website_url.to_string(),
            domain: domain_key(website_url),
            pages,
            timestamp: now,
            expires_at: now + ttl,
            status: DocumentStatus::Active,
        }
    }

    /// True once the time-to-live has passed
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// A snapshot is served only while active, unexpired and non-empty
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.status == DocumentStatus::Active && !self.is_expired(now) && !self.pages.is_empty()
    }

    /// Summary line for cache listings
    pub fn summary(&self, now: DateTime<Utc>) -> CacheSummary {
        CacheSummary {
            slug: self.guide_slug.clone(),
            website_url: self.website_url.clone(),
            pages: self.pages.len(),
            timestamp: self.timestamp,
            expires_at: self.expires_at,
            status: if self.is_valid(now) {
                DocumentStatus::Active
            } else {
                DocumentStatus::Expired
            },
        }
    }
}

/// Listing entry for one persisted snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheSummary {
    pub slug: String,
    pub website_url: String,
    pub pages: usize,
    pub timestamp: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: DocumentStatus,
}

/// Domain key for a website URL or bare host
///
/// # Example
///
/// ```
/// use guide_harvest::storage::domain_key;
///
/// assert_eq!(domain_key("https://WWW.Adega.example/loja"), "adega.example");
/// assert_eq!(domain_key("www.adega.example"), "adega.example");
/// ```
pub fn domain_key(raw: &str) -> String {
    parse_website_url(raw)
        .ok()
        .and_then(|url| extract_domain(&url))
        .unwrap_or_else(|| normalize_domain(raw.trim().trim_end_matches('/')))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::PageKind;

    fn page() -> ScrapedPage {
        ScrapedPage {
            url: "https://adega.example/sobre".to_string(),
            title: Some("Sobre".to_string()),
            description: None,
            text: "texto".to_string(),
            kind: PageKind::Page,
        }
    }

    #[test]
    fn test_new_document() {
        let now = Utc::now();
        let doc = CacheDocument::new(
            "adega",
            "https://www.adega.example/",
            vec![page()],
            now,
            Duration::hours(4),
        );
        assert_eq!(doc.domain, "adega.example");
        assert_eq!(doc.expires_at - doc.timestamp, Duration::hours(4));
        assert_eq!(doc.status, DocumentStatus::Active);
        assert!(doc.is_valid(now));
    }

    #[test]
    fn test_validity() {
        let now = Utc::now();
        let ttl = Duration::hours(4);

        let doc = CacheDocument::new("adega", "https://adega.example", vec![page()], now, ttl);
        assert!(doc.is_valid(now + Duration::hours(3)));
        assert!(!doc.is_valid(now + ttl));
        assert!(!doc.is_valid(now + Duration::hours(5)));

        let empty = CacheDocument::new("adega", "https://adega.example", vec![], now, ttl);
        assert!(!empty.is_valid(now));

        let mut expired = doc.clone();
        expired.status = DocumentStatus::Expired;
        assert!(!expired.is_valid(now));
        assert_eq!(expired.summary(now).status, DocumentStatus::Expired);
    }

    #[test]
    fn test_document_json_shape() {
        let doc = CacheDocument::new(
            "adega",
            "https://adega.example",
            vec![page()],
            Utc::now(),
            Duration::hours(4),
        );
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["guideSlug"], "adega");
        assert_eq!(json["websiteUrl"], "https://adega.example");
        assert_eq!(json["status"], "active");
        assert!(json.get("expiresAt").is_some());
    }
}
