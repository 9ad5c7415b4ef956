use crate::{UrlError, UrlResult};
use url::Url;

/// Tracking query parameters removed from harvested links
const TRACKING_PARAMS: &[&str] = &[
    "fbclid", "gclid", "dclid", "msclkid", "yclid", "igshid", "mc_cid", "mc_eid", "_ga", "_gl",
    "ref", "srsltid",
];

/// File extensions that never denote an HTML page
pub const NON_PAGE_EXTENSIONS: &[&str] = &[
    "xml", "pdf", "zip", "rar", "gz", "json", "txt", "csv", "jpg", "jpeg", "png", "gif", "webp",
    "svg", "ico", "bmp", "avif", "css", "js", "mjs", "map", "mp3", "mp4", "avi", "mov", "webm",
    "woff", "woff2", "ttf", "eot", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "exe", "dmg",
];

/// Parses a tenant website URL
///
/// Only absolute `http`/`https` URLs with a host are accepted.
///
/// # Examples
///
/// ```
/// use guide_harvest::url::parse_website_url;
///
/// assert!(parse_website_url("https://adega.example").is_ok());
/// assert!(parse_website_url("ftp://adega.example").is_err());
/// assert!(parse_website_url("adega.example").is_err());
/// ```
pub fn parse_website_url(raw: &str) -> UrlResult<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(UrlError::MissingDomain),
    }
}

/// Returns true when the URL is a well-formed `http(s)` website URL
pub fn is_website_url(raw: &str) -> bool {
    parse_website_url(raw).is_ok()
}

/// Cleans a discovered link
///
/// Removes the fragment and every tracking parameter (`utm_*` plus the
/// click identifiers in [`TRACKING_PARAMS`]). Remaining parameters keep
/// their original order.
pub fn clean_link(mut url: Url) -> Url {
    url.set_fragment(None);

    if url.query().is_some() {
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !is_tracking_param(key))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(kept);
        }
    }

    url
}

fn is_tracking_param(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key.as_str())
}

/// Checks whether the URL path ends in a known non-page file extension
pub fn has_non_page_extension(url: &Url) -> bool {
    let last = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");

    match last.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            NON_PAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
        }
        _ => false,
    }
}
