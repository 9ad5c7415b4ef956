//! Relevance scoring for site-search candidates

use crate::extract::PRODUCT_PATH;
use crate::search::tokens::{fold, occurrences, words};
use url::Url;

/// Only this much of the body counts towards confidence
pub const CONFIDENCE_BODY_BYTES: usize = 20_000;

/// Token positions inspected per token for the proximity bonus
const MAX_POSITIONS: usize = 64;

/// Folded fields of one candidate page
#[derive(Debug, Clone, Default)]
pub struct Candidate {
    /// Path words joined with single spaces
    pub path: String,
    /// Folded `/`-separated path segments
    pub path_segments: Vec<String>,
    pub product: bool,
    pub title: String,
    pub body: String,
}

impl Candidate {
    pub fn new(url: &Url, title: Option<&str>, body: &str) -> Self {
        Self {
            path: words(url.path()).join(" "),
            path_segments: url
                .path()
                .split('/')
                .filter(|segment| !segment.is_empty())
                .map(fold)
                .collect(),
            product: PRODUCT_PATH.is_match(url.path()),
            title: fold(title.unwrap_or("")),
            body: fold(body),
        }
    }
}

/// Path-only score used to shortlist candidates before fetching them
///
/// Each token earns 3 per occurrence in the path, plus 2 when it is a whole
/// path segment (`/tinto/`, not `/vinho-tinto/`).
pub fn path_score(url: &Url, tokens: &[String]) -> i32 {
    let candidate = Candidate::new(url, None, "");
    tokens.iter().map(|token| path_points(&candidate, token)).sum()
}

fn path_points(candidate: &Candidate, token: &str) -> i32 {
    let mut points = occurrences(&candidate.path, token) as i32 * 3;
    if candidate.path_segments.iter().any(|segment| segment == token) {
        points += 2;
    }
    points
}

/// Composite relevance score of a fetched candidate
///
/// | Signal | Points |
/// |--------|--------|
/// | token in path | 3 per occurrence, +2 as a whole path segment |
/// | token in title | 3 per occurrence |
/// | token present in title / path | +12 / +8 |
/// | product-like path | +30 |
/// | whole query (3+ chars) in title / path / body | +40 / +25 / +20 |
/// | two tokens within 50 / 120 body characters | +20 / +10 |
pub fn composite_score(candidate: &Candidate, query: &str, tokens: &[String]) -> i32 {
    let mut score = 0;

    for token in tokens {
        score += path_points(candidate, token);
        score += occurrences(&candidate.title, token) as i32 * 3;
        if candidate.title.contains(token.as_str()) {
            score += 12;
        }
        if candidate.path.contains(token.as_str()) {
            score += 8;
        }
    }

    if candidate.product {
        score += 30;
    }

    score + phrase_bonus(candidate, query) + proximity_bonus(&candidate.body, tokens)
}

fn phrase_bonus(candidate: &Candidate, query: &str) -> i32 {
    let phrase = fold(query.trim());
    if phrase.chars().count() < 3 {
        return 0;
    }
    let path_phrase = words(query).join(" ");

    let mut bonus = 0;
    if candidate.title.contains(&phrase) {
        bonus += 40;
    }
    if !path_phrase.is_empty() && candidate.path.contains(&path_phrase) {
        bonus += 25;
    }
    if candidate.body.contains(&phrase) {
        bonus += 20;
    }
    bonus
}

/// Bonus for two different tokens occurring close together in the body
pub fn proximity_bonus(body: &str, tokens: &[String]) -> i32 {
    if tokens.len() < 2 {
        return 0;
    }

    let positions: Vec<Vec<usize>> = tokens
        .iter()
        .map(|token| {
            body.match_indices(token.as_str())
                .map(|(at, _)| at)
                .take(MAX_POSITIONS)
                .collect()
        })
        .collect();

    let mut closest = usize::MAX;
    for (i, first) in positions.iter().enumerate() {
        for second in &positions[i + 1..] {
            for a in first {
                for b in second {
                    closest = closest.min(a.abs_diff(*b));
                }
            }
        }
    }

    match closest {
        d if d <= 50 => 20,
        d if d <= 120 => 10,
        _ => 0,
    }
}

/// Longest prefix of `text` within `max_bytes`, cut on a char boundary
fn head(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Share of distinct tokens found in the title, path or body head
///
/// 1.0 when there are no tokens.
pub fn confidence(candidate: &Candidate, tokens: &[String]) -> f64 {
    if tokens.is_empty() {
        return 1.0;
    }

    let body = head(&candidate.body, CONFIDENCE_BODY_BYTES);
    let found = tokens
        .iter()
        .filter(|token| {
            candidate.title.contains(token.as_str())
                || candidate.path.contains(token.as_str())
                || body.contains(token.as_str())
        })
        .count();

    found as f64 / tokens.len() as f64
}
