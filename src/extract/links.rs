//! Hyperlink and sitemap URL extraction
//!
//! Anchors are found with a regex over the raw markup rather than a DOM walk
//! so that partially downloaded (byte-capped) pages still yield links.

use crate::url::{clean_link, has_non_page_extension, same_site};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

static ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<a\b([^>]*)>").expect("hardcoded regex pattern is valid"));

static HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#)
        .expect("hardcoded regex pattern is valid")
});

static REL_NOFOLLOW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)\brel\s*=\s*["']?[^"'>]*\bnofollow\b"#)
        .expect("hardcoded regex pattern is valid")
});

static LOC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<loc>\s*(?:<!\[CDATA\[)?\s*(.*?)\s*(?:\]\]>)?\s*</loc>")
        .expect("hardcoded regex pattern is valid")
});

static SITEMAP_INDEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<sitemapindex\b").expect("hardcoded regex pattern is valid")
});

/// Extracts crawlable same-site links from a page
///
/// # Link Rules
///
/// **Include:** `<a href>` targets on the same site as `base`, resolved to
/// absolute `http(s)` URLs with fragments and tracking parameters removed.
///
/// **Exclude:**
/// - `rel="nofollow"` anchors
/// - `javascript:`, `mailto:`, `tel:` and `data:` links
/// - fragment-only links (same page anchors)
/// - links to other hosts
///
/// The result is de-duplicated and keeps document order.
///
/// # Example
///
/// ```
/// use guide_harvest::extract::extract_links;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/").unwrap();
/// let html = r#"<a href="/sobre">Sobre</a><a href="https://other.com/">x</a>"#;
/// let links = extract_links(&base, html);
/// assert_eq!(links, vec![Url::parse("https://example.com/sobre").unwrap()]);
/// ```
pub fn extract_links(base: &Url, html: &str) -> Vec<Url> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for anchor in ANCHOR.captures_iter(html) {
        let attrs = anchor.get(1).map(|m| m.as_str()).unwrap_or("");

        if REL_NOFOLLOW.is_match(attrs) {
            continue;
        }

        let Some(href) = HREF.captures(attrs).and_then(|caps| {
            caps.get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .map(|m| m.as_str())
        }) else {
            continue;
        };

        let href = html_escape::decode_html_entities(href);
        let Some(url) = resolve_link(&href, base) else {
            continue;
        };

        if !same_site(&url, base) {
            continue;
        }

        if seen.insert(url.as_str().to_string()) {
            links.push(url);
        }
    }

    links
}

/// Resolves a link href to a cleaned absolute URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    if absolute.scheme() == "http" || absolute.scheme() == "https" {
        Some(clean_link(absolute))
    } else {
        None
    }
}

/// Extracts every `<loc>` value of a sitemap document as a URL
fn extract_locs(xml: &str) -> impl Iterator<Item = Url> + '_ {
    LOC.captures_iter(xml).filter_map(|caps| {
        let raw = caps.get(1)?.as_str();
        let decoded = html_escape::decode_html_entities(raw);
        Url::parse(decoded.trim()).ok()
    })
}

/// Extracts page URLs listed in a sitemap
///
/// Only same-site `http(s)` URLs are kept. Nested sitemaps and other
/// non-page resources (`.xml`, `.pdf`, `.zip`, `.json`, ...) are excluded.
///
/// # Example
///
/// ```
/// use guide_harvest::extract::extract_sitemap_urls;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/").unwrap();
/// let xml = r#"<urlset>
///   <url><loc>https://example.com/produtos/vinho-1</loc></url>
///   <url><loc>https://example.com/sitemap-extra.xml</loc></url>
/// </urlset>"#;
/// let urls = extract_sitemap_urls(xml, &base);
/// assert_eq!(urls.len(), 1);
/// ```
pub fn extract_sitemap_urls(xml: &str, base: &Url) -> Vec<Url> {
    let mut seen = HashSet::new();
    extract_locs(xml)
        .filter(|url| url.scheme() == "http" || url.scheme() == "https")
        .filter(|url| same_site(url, base))
        .filter(|url| !has_non_page_extension(url))
        .map(clean_link)
        .filter(|url| seen.insert(url.as_str().to_string()))
        .collect()
}

/// True when the document is a sitemap index rather than a URL set
pub fn is_sitemap_index(xml: &str) -> bool {
    SITEMAP_INDEX.is_match(xml)
}

/// Extracts the child sitemaps listed in a sitemap index
pub fn extract_child_sitemaps(xml: &str, base: &Url) -> Vec<Url> {
    let mut seen = HashSet::new();
    extract_locs(xml)
        .filter(|url| same_site(url, base))
        .filter(|url| seen.insert(url.as_str().to_string()))
        .collect()
}
