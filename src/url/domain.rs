use url::Url;

/// Extracts the cache domain key from a URL
///
/// The key is the lowercase host with a leading `www.` removed, so that
/// `https://www.Example.com` and `http://example.com/about` share a key.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use guide_harvest::url::extract_domain;
///
/// let url = Url::parse("https://WWW.Example.com/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(normalize_domain)
}

/// Normalizes a bare host or domain string to its cache key form
pub fn normalize_domain(host: &str) -> String {
    let host = host.trim().trim_end_matches('.').to_lowercase();
    match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => host,
    }
}

/// Returns the origin (`scheme://host[:port]`) of a URL as a root URL
pub fn origin_of(url: &Url) -> Url {
    let mut origin = url.clone();
    origin.set_path("/");
    origin.set_query(None);
    origin.set_fragment(None);
    // Credentials never belong to a crawl origin
    let _ = origin.set_username("");
    let _ = origin.set_password(None);
    origin
}

/// Checks whether two URLs point at the same site
///
/// Hosts are compared ignoring case and a leading `www.`; ports must match.
pub fn same_site(a: &Url, b: &Url) -> bool {
    match (extract_domain(a), extract_domain(b)) {
        (Some(ha), Some(hb)) => ha == hb && a.port_or_known_default() == b.port_or_known_default(),
        _ => false,
    }
}
