//! Metadata and readable-text extraction
//!
//! Title and description come from the parsed document; the readable body
//! text is produced by stripping non-content markup, decoding entities and
//! collapsing whitespace.

use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;

/// Pages with less readable text than this are discarded
pub const MIN_TEXT_CHARS: usize = 200;

/// Maximum number of characters kept per page
pub const MAX_TEXT_CHARS: usize = 12_000;

/// Page metadata taken from `<title>` and `<meta>` tags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMeta {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Elements whose whole content is dropped before text extraction
static NON_CONTENT_BLOCKS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        "head", "script", "style", "noscript", "svg", "template", "iframe", "canvas", "select",
    ]
    .iter()
    .filter_map(|tag| Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>")).ok())
    .collect()
});

static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("hardcoded regex pattern is valid"));

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("hardcoded regex pattern is valid"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("hardcoded regex pattern is valid"));

/// Extracts the page title and description
///
/// The title falls back to `og:title`, the description to `og:description`.
///
/// # Example
///
/// ```
/// use guide_harvest::extract::extract_meta;
///
/// let html = r#"<html><head><title> Adega &amp; Cia </title>
///   <meta name="description" content="Vinhos finos"></head></html>"#;
/// let meta = extract_meta(html);
/// assert_eq!(meta.title.as_deref(), Some("Adega & Cia"));
/// assert_eq!(meta.description.as_deref(), Some("Vinhos finos"));
/// ```
pub fn extract_meta(html: &str) -> PageMeta {
    let document = Html::parse_document(html);

    let title = select_text(&document, "title")
        .or_else(|| select_attr(&document, r#"meta[property="og:title"]"#, "content"));
    let description = select_attr(&document, r#"meta[name="description"]"#, "content")
        .or_else(|| select_attr(&document, r#"meta[property="og:description"]"#, "content"));

    PageMeta { title, description }
}

fn select_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

fn select_attr(document: &Html, selector: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .filter_map(|element| element.value().attr(attr))
        .map(collapse_whitespace)
        .find(|s| !s.is_empty())
}

/// Extracts the readable body text of a page
///
/// # Example
///
/// ```
/// use guide_harvest::extract::extract_readable_text;
///
/// let html = "<p>Vinho&nbsp;tinto</p><script>var x = 1;</script><p>seco</p>";
/// assert_eq!(extract_readable_text(html), "Vinho tinto seco");
/// ```
pub fn extract_readable_text(html: &str) -> String {
    let mut text = COMMENT.replace_all(html, " ").into_owned();
    for block in NON_CONTENT_BLOCKS.iter() {
        text = block.replace_all(&text, " ").into_owned();
    }
    let stripped = TAG.replace_all(&text, " ");
    let decoded = html_escape::decode_html_entities(&stripped);
    collapse_whitespace(&decoded)
}

/// Collapses runs of whitespace (including non-breaking spaces) to one space
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// True when the readable text is too short to be worth keeping
pub fn is_thin(text: &str) -> bool {
    text.chars().count() < MIN_TEXT_CHARS
}

/// Caps text at [`MAX_TEXT_CHARS`] characters
pub fn cap_text(text: &str) -> String {
    match text.char_indices().nth(MAX_TEXT_CHARS) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
