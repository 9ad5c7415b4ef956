//! File-backed cache store
//!
//! Lookups hit memory first and fall back to the tenant's JSON file. A
//! document is written to a temporary file and renamed over the old one, so
//! a reader never sees a half-written snapshot.

use crate::config::CacheConfig;
use crate::extract::ScrapedPage;
use crate::storage::traits::{CacheStore, StorageError, StorageResult};
use crate::storage::{domain_key, CacheDocument, CacheSummary, DEFAULT_TTL_HOURS};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::sync::{Mutex, RwLock};

/// In-memory layer over one JSON file per tenant
pub struct FileCacheStore {
    directory: PathBuf,
    ttl: Duration,
    by_guide: RwLock<HashMap<String, CacheDocument>>,
    by_domain: RwLock<HashMap<String, CacheDocument>>,
    /// Held across write, rename and the memory update of one snapshot
    writes: Mutex<()>,
    temp_seq: AtomicU64,
}

/// File name for a tenant's snapshot
///
/// Anything outside `[A-Za-z0-9_-]` is replaced so a slug can never
/// escape the cache directory.
fn file_name(guide_slug: &str) -> StorageResult<String> {
    let slug = guide_slug.trim();
    if slug.is_empty() {
        return Err(StorageError::InvalidKey("empty guide slug".to_string()));
    }
    let safe: String = slug
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    Ok(format!("{}.json", safe))
}

/// Reads one persisted snapshot; a missing file is `None`
async fn read_document(path: &Path) -> StorageResult<Option<CacheDocument>> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn write_and_rename(temp: &Path, path: &Path, body: &[u8]) -> StorageResult<()> {
    fs::write(temp, body).await?;
    fs::rename(temp, path).await?;
    Ok(())
}

impl FileCacheStore {
    /// Creates a store over `directory` with the given time-to-live
    ///
    /// The directory is created on the first save.
    pub fn new(directory: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            directory: directory.into(),
            ttl,
            by_guide: RwLock::new(HashMap::new()),
            by_domain: RwLock::new(HashMap::new()),
            writes: Mutex::new(()),
            temp_seq: AtomicU64::new(0),
        }
    }

    /// Creates a store from the `[cache]` configuration section
    pub fn from_config(config: &CacheConfig) -> Self {
        let hours = if config.ttl_hours == 0 {
            DEFAULT_TTL_HOURS
        } else {
            config.ttl_hours
        };
        Self::new(&config.directory, Duration::hours(hours as i64))
    }

    /// Directory holding the tenant files
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_for(&self, guide_slug: &str) -> StorageResult<PathBuf> {
        Ok(self.directory.join(file_name(guide_slug)?))
    }

    /// Persists a document and makes it visible under both keys
    ///
    /// Replaces any earlier snapshot of the same tenant wholesale. Writes
    /// are serialized, so the file and the memory maps always end on the
    /// same snapshot.
    pub async fn put(&self, document: CacheDocument) -> StorageResult<()> {
        let path = self.path_for(&document.guide_slug)?;
        let body = serde_json::to_vec_pretty(&document)?;

        let _guard = self.writes.lock().await;
        let temp = self.temp_path(&path);

        fs::create_dir_all(&self.directory).await?;
        if let Err(e) = write_and_rename(&temp, &path, &body).await {
            let _ = fs::remove_file(&temp).await;
            return Err(e);
        }

        self.remember(document).await;
        Ok(())
    }

    /// Scratch file next to `path`, unique per process and per write
    fn temp_path(&self, path: &Path) -> PathBuf {
        let seq = self.temp_seq.fetch_add(1, Ordering::Relaxed);
        path.with_extension(format!("json.{}.{}.tmp", std::process::id(), seq))
    }

    /// Caches a document in memory under both keys
    async fn remember(&self, document: CacheDocument) {
        let previous = self
            .by_guide
            .write()
            .await
            .insert(document.guide_slug.clone(), document.clone());

        let mut by_domain = self.by_domain.write().await;
        if let Some(previous) = previous {
            if previous.domain != document.domain {
                by_domain.remove(&previous.domain);
            }
        }
        by_domain.insert(document.domain.clone(), document);
    }

    async fn forget(&self, document: &CacheDocument) {
        self.by_guide.write().await.remove(&document.guide_slug);

        let mut by_domain = self.by_domain.write().await;
        let owned = by_domain
            .get(&document.domain)
            .is_some_and(|cached| cached.guide_slug == document.guide_slug);
        if owned {
            by_domain.remove(&document.domain);
        }
    }

    /// Reads every persisted snapshot, skipping unreadable files
    async fn scan(&self) -> StorageResult<Vec<(PathBuf, CacheDocument)>> {
        let mut entries = match fs::read_dir(&self.directory).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut documents = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            match read_document(&path).await {
                Ok(Some(document)) => documents.push((path, document)),
                Ok(None) => {}
                Err(e) => tracing::warn!("Skipping unreadable cache file {}: {}", path.display(), e),
            }
        }
        Ok(documents)
    }
}

#[async_trait]
impl CacheStore for FileCacheStore {
    async fn save(
        &self,
        guide_slug: &str,
        website_url: &str,
        pages: Vec<ScrapedPage>,
    ) -> StorageResult<CacheDocument> {
        let document = CacheDocument::new(guide_slug, website_url, pages, Utc::now(), self.ttl);
        self.put(document.clone()).await?;
        tracing::info!(
            "Cached {} pages for '{}' until {}",
            document.pages.len(),
            guide_slug,
            document.expires_at
        );
        Ok(document)
    }

    async fn get_valid_by_guide(&self, guide_slug: &str) -> StorageResult<Option<CacheDocument>> {
        let now = Utc::now();

        if let Some(document) = self.by_guide.read().await.get(guide_slug) {
            return Ok(Some(document.clone()).filter(|doc| doc.is_valid(now)));
        }

        let path = self.path_for(guide_slug)?;
        let document = match read_document(&path).await {
            Ok(Some(document)) => document,
            Ok(None) => return Ok(None),
            Err(StorageError::Serialization(e)) => {
                tracing::warn!("Ignoring corrupt cache file {}: {}", path.display(), e);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        self.remember(document.clone()).await;
        Ok(Some(document).filter(|doc| doc.is_valid(now)))
    }

    async fn get_valid_by_domain(&self, domain: &str) -> StorageResult<Option<CacheDocument>> {
        let now = Utc::now();
        let key = domain_key(domain);

        if let Some(document) = self.by_domain.read().await.get(&key) {
            return Ok(Some(document.clone()).filter(|doc| doc.is_valid(now)));
        }

        let found = self
            .scan()
            .await?
            .into_iter()
            .map(|(_, document)| document)
            .find(|document| document.domain == key);

        match found {
            Some(document) => {
                self.remember(document.clone()).await;
                Ok(Some(document).filter(|doc| doc.is_valid(now)))
            }
            None => Ok(None),
        }
    }

    async fn cleanup_expired(&self) -> StorageResult<usize> {
        let now = Utc::now();
        let mut removed = 0;

        for (path, document) in self.scan().await? {
            if !document.is_expired(now) {
                continue;
            }
            match fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
            self.forget(&document).await;
            tracing::debug!("Removed expired cache for '{}'", document.guide_slug);
        }

        if removed > 0 {
            tracing::info!("Removed {} expired cache documents", removed);
        }
        Ok(removed)
    }

    async fn list(&self) -> StorageResult<Vec<CacheSummary>> {
        let now = Utc::now();
        let mut summaries: Vec<CacheSummary> = self
            .scan()
            .await?
            .iter()
            .map(|(_, document)| document.summary(now))
            .collect();
        summaries.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(summaries)
    }
}
