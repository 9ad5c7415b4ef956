//! Page kind classification and frontier priority scoring
//!
//! Both are ordered rule tables: classification takes the first matching
//! rule, priority sums the weights of every matching rule.

use crate::url::has_non_page_extension;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use url::Url;

/// Kind of a harvested page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    Product,
    Page,
    Blog,
    Faq,
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Product => "product",
            Self::Page => "page",
            Self::Blog => "blog",
            Self::Faq => "faq",
        };
        f.write_str(name)
    }
}

/// Links scoring at or above this are attempted before ordinary links
pub const HIGH_PRIORITY: i32 = 20;

fn rx(pattern: &str) -> Regex {
    Regex::new(pattern).expect("hardcoded regex pattern is valid")
}

/// Product-like paths; shared with the site-search product boost
pub(crate) static PRODUCT_PATH: LazyLock<Regex> = LazyLock::new(|| {
    rx(r"(?i)/(produtos?|products?|p|item|itens|loja|shop|store|comprar|buy|sku)(/|-|$)")
});

static PRODUCT_TITLE: LazyLock<Regex> =
    LazyLock::new(|| rx(r"(?i)\b(comprar|compre|pre[cç]o|r\$|buy now|add to cart|price)"));

static PRODUCT_SCHEMA: LazyLock<Regex> =
    LazyLock::new(|| rx(r#"(?i)"@type"\s*:\s*\[?\s*"product""#));

static FAQ_HINT: LazyLock<Regex> = LazyLock::new(|| {
    rx(r"(?i)(faq|perguntas[-_ ]frequentes|d[uú]vidas|ajuda|help|suporte|support)")
});

static BLOG_HINT: LazyLock<Regex> =
    LazyLock::new(|| rx(r"(?i)(blog|not[ií]cias?|news|artigos?|article|posts?/|receitas?)"));

static CATEGORY_PATH: LazyLock<Regex> = LazyLock::new(|| {
    rx(r"(?i)/(categorias?|category|categories|colec[aã]o|colecoes|collections?|cat[aá]logo|catalog|departamento|department)(/|-|$)")
});

static LOW_VALUE_PATH: LazyLock<Regex> =
    LazyLock::new(|| rx(r"(?i)([?&](page|pagina|p)=\d+|/(page|pagina)/\d+|sitemap)"));

/// Signals inspected when classifying a page
struct KindSignals<'a> {
    path: &'a str,
    title: &'a str,
    html: &'a str,
}

type KindRule = (fn(&KindSignals<'_>) -> bool, PageKind);

fn has_product_path(s: &KindSignals<'_>) -> bool {
    PRODUCT_PATH.is_match(s.path)
}

fn has_product_title(s: &KindSignals<'_>) -> bool {
    PRODUCT_TITLE.is_match(s.title)
}

fn has_product_schema(s: &KindSignals<'_>) -> bool {
    PRODUCT_SCHEMA.is_match(s.html)
}

fn has_faq_hint(s: &KindSignals<'_>) -> bool {
    FAQ_HINT.is_match(s.path) || FAQ_HINT.is_match(s.title)
}

fn has_blog_hint(s: &KindSignals<'_>) -> bool {
    BLOG_HINT.is_match(s.path) || BLOG_HINT.is_match(s.title)
}

/// Classification rules in priority order
const KIND_RULES: &[KindRule] = &[
    (has_product_path, PageKind::Product),
    (has_product_title, PageKind::Product),
    (has_product_schema, PageKind::Product),
    (has_faq_hint, PageKind::Faq),
    (has_blog_hint, PageKind::Blog),
];

/// Classifies a page by kind
///
/// Product signals win first (path or title keywords, or a `Product`
/// structured-data block), then FAQ keywords, then blog keywords; anything
/// else is a generic page.
///
/// # Example
///
/// ```
/// use guide_harvest::extract::{classify_kind, PageKind};
/// use url::Url;
///
/// let url = Url::parse("https://example.com/produtos/vinho-1").unwrap();
/// assert_eq!(classify_kind(&url, None, None), PageKind::Product);
///
/// let url = Url::parse("https://example.com/sobre").unwrap();
/// assert_eq!(classify_kind(&url, Some("Sobre nós"), None), PageKind::Page);
/// ```
pub fn classify_kind(url: &Url, title: Option<&str>, html: Option<&str>) -> PageKind {
    let signals = KindSignals {
        path: url.path(),
        title: title.unwrap_or(""),
        html: html.unwrap_or(""),
    };

    KIND_RULES
        .iter()
        .find(|(matches, _)| matches(&signals))
        .map(|(_, kind)| *kind)
        .unwrap_or(PageKind::Page)
}

type PriorityRule = (fn(&Url) -> bool, i32);

fn is_product_link(url: &Url) -> bool {
    PRODUCT_PATH.is_match(url.path())
}

fn is_category_link(url: &Url) -> bool {
    CATEGORY_PATH.is_match(url.path())
}

fn is_help_link(url: &Url) -> bool {
    FAQ_HINT.is_match(url.path())
}

fn is_low_value_link(url: &Url) -> bool {
    let target = match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    };
    LOW_VALUE_PATH.is_match(&target)
}

/// Frontier priority weights; every matching rule contributes
const PRIORITY_RULES: &[PriorityRule] = &[
    (is_product_link, 30),
    (is_category_link, 20),
    (is_help_link, 8),
    (is_low_value_link, -50),
    (has_non_page_extension, -100),
];

/// Scores how early a link should be crawled
///
/// Used only to order the frontier, never to exclude a link.
///
/// # Example
///
/// ```
/// use guide_harvest::extract::link_priority;
/// use url::Url;
///
/// let product = Url::parse("https://example.com/produto/merlot").unwrap();
/// let paged = Url::parse("https://example.com/blog?page=3").unwrap();
/// assert_eq!(link_priority(&product), 30);
/// assert_eq!(link_priority(&paged), -50);
/// ```
pub fn link_priority(url: &Url) -> i32 {
    PRIORITY_RULES
        .iter()
        .filter(|(matches, _)| matches(url))
        .map(|(_, weight)| *weight)
        .sum()
}
