use serde::Deserialize;

/// Main configuration structure for Guide-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default, rename = "tenant")]
    pub tenants: Vec<TenantEntry>,
}

/// Default bounds for on-demand crawls
///
/// Values supplied with a crawl request override these and are clamped
/// into the same ranges.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of pages harvested per crawl
    #[serde(rename = "max-pages")]
    pub max_pages: usize,

    /// Maximum link depth followed from a seed
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Number of concurrent frontier workers
    #[serde(rename = "max-concurrency")]
    pub max_concurrency: usize,

    /// Per-request timeout (milliseconds)
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Maximum number of body bytes read per page
    #[serde(rename = "max-html-bytes")]
    pub max_html_bytes: usize,

    /// Whether the robots.txt kill-switch is honoured
    #[serde(rename = "respect-robots-txt")]
    pub respect_robots_txt: bool,

    /// How long an identical crawl request is answered from memory (seconds)
    #[serde(rename = "recent-window-secs")]
    pub recent_window_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: 40,
            max_depth: 2,
            max_concurrency: 8,
            timeout_ms: 8_000,
            max_html_bytes: 250 * 1024,
            respect_robots_txt: true,
            recent_window_secs: 120,
        }
    }
}

/// How the crawler introduces itself to the sites it visits
///
/// Rendered as `Name/Version (+contact-url; contact-email)`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UserAgentConfig {
    pub crawler_name: String,
    pub crawler_version: String,
    /// Page explaining the crawler to site owners
    pub contact_url: String,
    pub contact_email: String,
}

/// Cache store configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory holding one JSON document per tenant
    pub directory: String,

    /// Time-to-live of a cached crawl (hours)
    #[serde(rename = "ttl-hours")]
    pub ttl_hours: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            directory: "./cache/website-scraper".to_string(),
            ttl_hours: 4,
        }
    }
}

/// Periodic sweep configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Hours between two sweeps
    #[serde(rename = "interval-hours")]
    pub interval_hours: u64,

    /// Number of tenants crawled concurrently during a sweep
    #[serde(rename = "tenant-concurrency")]
    pub tenant_concurrency: usize,

    #[serde(rename = "max-pages")]
    pub max_pages: usize,

    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    #[serde(rename = "max-concurrency")]
    pub max_concurrency: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_hours: 4,
            tenant_concurrency: 3,
            max_pages: 40,
            max_depth: 2,
            max_concurrency: 12,
        }
    }
}

/// Live site-search configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    #[serde(rename = "max-html-bytes")]
    pub max_html_bytes: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 6_000,
            max_html_bytes: 300_000,
        }
    }
}

/// One tenant of the config-backed tenant directory
#[derive(Debug, Clone, Deserialize)]
pub struct TenantEntry {
    pub slug: String,

    #[serde(rename = "website-url", default)]
    pub website_url: Option<String>,

    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}
