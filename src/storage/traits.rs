//! Cache store trait and error types
//!
//! This module defines the interface the crawl engine and scheduler use to
//! persist and look up tenant snapshots.

use crate::extract::ScrapedPage;
use crate::storage::{CacheDocument, CacheSummary};
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid cache key: {0}")]
    InvalidKey(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A TTL'd store of tenant snapshots, keyed by tenant slug and by domain
///
/// A miss and an expired entry look the same to callers: `Ok(None)`.
/// Errors are reserved for failures to persist.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Replaces the tenant's snapshot with a fresh one
    async fn save(
        &self,
        guide_slug: &str,
        website_url: &str,
        pages: Vec<ScrapedPage>,
    ) -> StorageResult<CacheDocument>;

    /// Valid snapshot for a tenant
    async fn get_valid_by_guide(&self, guide_slug: &str) -> StorageResult<Option<CacheDocument>>;

    /// Valid snapshot for a domain (`www.` and case are ignored)
    async fn get_valid_by_domain(&self, domain: &str) -> StorageResult<Option<CacheDocument>>;

    /// Deletes expired snapshots, returning how many were removed
    async fn cleanup_expired(&self) -> StorageResult<usize>;

    /// Summaries of every persisted snapshot, sorted by slug
    async fn list(&self) -> StorageResult<Vec<CacheSummary>>;
}
