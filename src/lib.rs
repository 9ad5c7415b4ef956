//! Guide-Harvest: website crawling and caching for guide tenants
//!
//! This crate harvests the textual content of a tenant's website, classifies
//! the pages it finds, and keeps the result in a TTL'd cache. It also answers
//! live "most relevant page for a query" lookups against a site without
//! touching the cache.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod robots;
pub mod schedule;
pub mod search;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Guide-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Invalid URL pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Guide '{slug}' has no website URL")]
    MissingWebsite { slug: String },

    #[error("Guide '{slug}' has an invalid website URL '{url}'")]
    InvalidWebsite { slug: String, url: String },

    #[error("Guide not found: {0}")]
    TenantNotFound(String),

    #[error("Tenant directory error: {0}")]
    Directory(String),

    #[error("Sweep task failed: {0}")]
    SweepTask(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Guide-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlOutcome, CrawlRequest, Harvester};
pub use extract::{PageKind, ScrapedPage};
pub use schedule::{RunStats, Scheduler};
pub use search::{site_search, SearchHit, SearchResponse};
pub use storage::{CacheDocument, CacheStore, FileCacheStore};
