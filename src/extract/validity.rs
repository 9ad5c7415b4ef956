//! Soft-404 detection
//!
//! Many sites answer missing pages, error pages and empty search listings
//! with HTTP 200. These bodies must never reach the cache or be offered as
//! a search hit, so both the fetcher and the liveness check run them
//! through [`looks_invalid`].

use regex::Regex;
use std::sync::LazyLock;

fn rx(pattern: &str) -> Regex {
    Regex::new(pattern).expect("hardcoded regex pattern is valid")
}

static TITLE: LazyLock<Regex> = LazyLock::new(|| rx(r"(?is)<title\b[^>]*>(.*?)</title\s*>"));

static H1: LazyLock<Regex> = LazyLock::new(|| rx(r"(?is)<h1\b[^>]*>(.*?)</h1\s*>"));

static INNER_TAG: LazyLock<Regex> = LazyLock::new(|| rx(r"(?s)<[^>]*>"));

static META_TAG: LazyLock<Regex> = LazyLock::new(|| rx(r"(?is)<meta\b[^>]*>"));

static ROBOTS_NAME: LazyLock<Regex> =
    LazyLock::new(|| rx(r#"(?i)\bname\s*=\s*["']?(robots|googlebot)\b"#));

static NOINDEX_CONTENT: LazyLock<Regex> =
    LazyLock::new(|| rx(r#"(?i)\bcontent\s*=\s*["']?[^"'>]*\bnoindex\b"#));

/// Error-page phrasing, checked against the title and first heading
///
/// A bare status code only counts when it opens the text on its own
/// ("404", "404 - ...") or follows error wording ("Erro 500"), so product
/// titles carrying quantities stay valid.
static ERROR_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    rx(r"(?i)(p[aá]gina n[aã]o encontrada|p[aá]gina inexistente|n[aã]o encontrad[ao]|not found|^\s*(404|403|410|500|502|503)\s*([-–:|]|$)|\b(erro|error|c[oó]digo|http)\s*:?\s*(404|403|410|500|502|503)\b|internal server error|service unavailable|bad gateway|forbidden|acesso negado)")
});

/// Empty-listing phrasing, checked against the whole body
static NO_RESULTS: LazyLock<Regex> = LazyLock::new(|| {
    rx(r"(?i)(nenhum (resultado|produto) (foi )?encontrado|n[aã]o (encontramos|foram encontrados) (resultados|produtos)|sua (busca|pesquisa) n[aã]o (retornou|encontrou)|0 resultados|no results found|no products found|your search returned no results)")
});

fn first_text(re: &Regex, html: &str) -> String {
    re.captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| INNER_TAG.replace_all(m.as_str(), " ").into_owned())
        .map(|text| html_escape::decode_html_entities(&text).into_owned())
        .unwrap_or_default()
}

/// True when the page declares `noindex` in a robots meta tag
pub fn declares_noindex(html: &str) -> bool {
    META_TAG
        .find_iter(html)
        .map(|m| m.as_str())
        .any(|tag| ROBOTS_NAME.is_match(tag) && NOINDEX_CONTENT.is_match(tag))
}

/// True when the title or first heading reads like an error page
pub fn shows_error_heading(html: &str) -> bool {
    let title = first_text(&TITLE, html);
    let heading = first_text(&H1, html);
    ERROR_HEADING.is_match(&title) || ERROR_HEADING.is_match(&heading)
}

/// True when the body reads like an empty search or listing page
pub fn shows_no_results(html: &str) -> bool {
    NO_RESULTS.is_match(html)
}

/// Heuristic soft-404 detector
///
/// # Example
///
/// ```
/// use guide_harvest::extract::looks_invalid;
///
/// assert!(looks_invalid("<title>Página não encontrada</title>"));
/// assert!(looks_invalid(r#"<meta name="robots" content="noindex, follow">"#));
/// assert!(!looks_invalid("<title>Vinhos tintos</title><p>Catálogo</p>"));
/// ```
pub fn looks_invalid(html: &str) -> bool {
    shows_error_heading(html) || declares_noindex(html) || shows_no_results(html)
}
