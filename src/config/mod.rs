//! Configuration module for Guide-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use guide_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("guide-harvest.toml")).unwrap();
//! println!("Crawls default to {} pages", config.crawler.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CacheConfig, Config, CrawlerConfig, SchedulerConfig, SearchConfig, TenantEntry,
    UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
