use crate::config::types::{
    CacheConfig, Config, CrawlerConfig, SchedulerConfig, TenantEntry, UserAgentConfig,
};
use crate::crawler::limits;
use crate::url::parse_website_url;
use crate::ConfigError;
use std::collections::HashSet;
use std::ops::RangeInclusive;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_cache_config(&config.cache)?;
    validate_scheduler_config(&config.scheduler)?;
    validate_tenants(&config.tenants)?;
    Ok(())
}

fn check_range<T>(name: &str, value: T, range: RangeInclusive<T>) -> Result<(), ConfigError>
where
    T: PartialOrd + std::fmt::Display,
{
    if !range.contains(&value) {
        return Err(ConfigError::Validation(format!(
            "{} must be between {} and {}, got {}",
            name,
            range.start(),
            range.end(),
            value
        )));
    }
    Ok(())
}

/// Validates crawler defaults against the same ranges requests are clamped to
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    check_range("max-pages", config.max_pages, limits::MAX_PAGES)?;
    check_range("max-depth", config.max_depth, limits::MAX_DEPTH)?;
    check_range(
        "max-concurrency",
        config.max_concurrency,
        limits::MAX_CONCURRENCY,
    )?;
    check_range("timeout-ms", config.timeout_ms, limits::TIMEOUT_MS)?;
    check_range(
        "max-html-bytes",
        config.max_html_bytes,
        limits::MAX_HTML_BYTES,
    )?;
    Ok(())
}

/// The user agent must identify the crawler and give a way to reach its operator
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    let name = config.crawler_name.as_str();
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ConfigError::Validation(format!(
            "crawler-name must be a non-empty token of letters, digits and '-', got '{}'",
            name
        )));
    }

    parse_website_url(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("contact-url: {}", e)))?;

    validate_email(&config.contact_email)
}

fn validate_cache_config(config: &CacheConfig) -> Result<(), ConfigError> {
    if config.directory.trim().is_empty() {
        return Err(ConfigError::Validation(
            "cache directory cannot be empty".to_string(),
        ));
    }
    if config.ttl_hours == 0 {
        return Err(ConfigError::Validation(
            "ttl-hours must be >= 1".to_string(),
        ));
    }
    Ok(())
}

fn validate_scheduler_config(config: &SchedulerConfig) -> Result<(), ConfigError> {
    if config.interval_hours == 0 {
        return Err(ConfigError::Validation(
            "interval-hours must be >= 1".to_string(),
        ));
    }
    if config.tenant_concurrency == 0 {
        return Err(ConfigError::Validation(
            "tenant-concurrency must be >= 1".to_string(),
        ));
    }
    check_range(
        "scheduler max-pages",
        config.max_pages,
        limits::MAX_PAGES,
    )?;
    check_range(
        "scheduler max-depth",
        config.max_depth,
        limits::MAX_DEPTH,
    )?;
    check_range(
        "scheduler max-concurrency",
        config.max_concurrency,
        limits::MAX_CONCURRENCY,
    )?;
    Ok(())
}

/// Tenant slugs must be present and unique; website URLs are checked per sweep
fn validate_tenants(tenants: &[TenantEntry]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for tenant in tenants {
        if tenant.slug.trim().is_empty() {
            return Err(ConfigError::Validation(
                "tenant slug cannot be empty".to_string(),
            ));
        }
        if !seen.insert(tenant.slug.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate tenant slug '{}'",
                tenant.slug
            )));
        }
    }
    Ok(())
}

/// `local@domain.tld` with exactly one `@`
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.split('.').count() >= 2
                && domain.split('.').all(|label| !label.is_empty())
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "contact-email is not a valid address: '{}'",
            email
        )))
    }
}
