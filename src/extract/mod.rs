//! Content extraction module for Guide-Harvest
//!
//! Pure functions over fetched markup: metadata and readable text, link and
//! sitemap extraction, page kind classification, frontier priority and
//! soft-404 detection. Nothing in here performs I/O.

mod classify;
mod html;
mod links;
mod validity;

pub use classify::{classify_kind, link_priority, PageKind, HIGH_PRIORITY};
pub(crate) use classify::PRODUCT_PATH;
pub use html::{
    cap_text, collapse_whitespace, extract_meta, extract_readable_text, is_thin, PageMeta,
    MAX_TEXT_CHARS, MIN_TEXT_CHARS,
};
pub use links::{extract_child_sitemaps, extract_links, extract_sitemap_urls, is_sitemap_index};
pub use validity::{declares_noindex, looks_invalid, shows_error_heading, shows_no_results};

use serde::{Deserialize, Serialize};
use url::Url;

/// One harvested document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedPage {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub text: String,
    pub kind: PageKind,
}

/// Turns fetched markup into a [`ScrapedPage`]
///
/// Returns `None` for thin pages, which are never harvested.
///
/// # Example
///
/// ```
/// use guide_harvest::extract::{scrape_page, PageKind};
/// use url::Url;
///
/// let url = Url::parse("https://example.com/sobre").unwrap();
/// assert!(scrape_page(&url, "<p>OK</p>").is_none());
///
/// let html = format!("<title>Sobre</title><p>{}</p>", "texto ".repeat(50));
/// let page = scrape_page(&url, &html).unwrap();
/// assert_eq!(page.kind, PageKind::Page);
/// ```
pub fn scrape_page(url: &Url, html: &str) -> Option<ScrapedPage> {
    let text = extract_readable_text(html);
    if is_thin(&text) {
        return None;
    }

    let meta = extract_meta(html);
    let kind = classify_kind(url, meta.title.as_deref(), Some(html));

    Some(ScrapedPage {
        url: url.to_string(),
        title: meta.title,
        description: meta.description,
        text: cap_text(&text),
        kind,
    })
}
