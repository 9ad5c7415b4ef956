//! Robots.txt parser implementation
//!
//! Only two things are read from a robots.txt: whether the wildcard group
//! shuts the whole site off, and which sitemaps the site declares. Both come
//! from the robotstxt crate.

use robotstxt::{parse_robotstxt, DefaultMatcher, RobotsParseHandler};

/// Parsed robots.txt data
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RobotsPolicy {
    /// The site root is disallowed for `*`
    blanket_disallow: bool,
    /// `Sitemap:` declarations, in file order
    sitemaps: Vec<String>,
}

/// Collects `Sitemap:` lines; every other directive is left to the matcher
#[derive(Default)]
struct SitemapCollector {
    sitemaps: Vec<String>,
}

impl RobotsParseHandler for SitemapCollector {
    fn handle_robots_start(&mut self) {}

    fn handle_robots_end(&mut self) {}

    fn handle_user_agent(&mut self, _line_num: u32, _user_agent: &str) {}

    fn handle_allow(&mut self, _line_num: u32, _value: &str) {}

    fn handle_disallow(&mut self, _line_num: u32, _value: &str) {}

    fn handle_sitemap(&mut self, _line_num: u32, value: &str) {
        let value = value.trim();
        if !value.is_empty() {
            self.sitemaps.push(value.to_string());
        }
    }

    fn handle_unknown_action(&mut self, _line_num: u32, _action: &str, _value: &str) {}
}

impl RobotsPolicy {
    /// Parses raw robots.txt content
    ///
    /// The site counts as closed when the `*` agent may not fetch `/`.
    /// `Sitemap:` lines are global and collected wherever they appear.
    pub fn from_content(content: &str) -> Self {
        if content.trim().is_empty() {
            return Self::allow_all();
        }

        let mut matcher = DefaultMatcher::default();
        let blanket_disallow = !matcher.one_agent_allowed_by_robots(content, "*", "/");

        let mut collector = SitemapCollector::default();
        parse_robotstxt(content, &mut collector);

        Self {
            blanket_disallow,
            sitemaps: collector.sitemaps,
        }
    }

    /// Creates a permissive policy used when robots.txt is unavailable
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// True when the wildcard group disallows the whole site
    pub fn disallows_everything(&self) -> bool {
        self.blanket_disallow
    }

    /// Sitemap URLs declared in the file
    pub fn sitemaps(&self) -> &[String] {
        &self.sitemaps
    }
}
