//! Periodic all-tenants sweep with a single-flight guard
//!
//! The scheduler is either stopped or started; a started scheduler fires a
//! sweep immediately and then once per interval. Whatever triggers it, at
//! most one sweep runs at a time: a caller arriving while one is in flight
//! gets that sweep's live [`RunStats`] instead of starting another.

use crate::config::SchedulerConfig;
use crate::crawler::{CrawlRequest, Harvester};
use crate::schedule::directory::{Tenant, TenantDirectory};
use crate::schedule::stats::{RunStats, SweepDetail};
use crate::storage::CacheStore;
use crate::url::parse_website_url;
use crate::{HarvestError, Result};
use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Statistics of one sweep, shared with callers while it runs
pub type SharedStats = Arc<RwLock<RunStats>>;

/// Reason recorded when a crawl harvested nothing
const NO_PAGES: &str = "no pages harvested";

/// Snapshot returned by [`Scheduler::status`]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStatus {
    pub running: bool,
    pub scheduled: bool,
    pub last_stats: Option<RunStats>,
}

#[derive(Default)]
struct SchedulerState {
    running: bool,
    last_stats: Option<SharedStats>,
    timer: Option<JoinHandle<()>>,
}

struct Inner {
    harvester: Arc<Harvester>,
    cache: Arc<dyn CacheStore>,
    directory: Arc<dyn TenantDirectory>,
    config: SchedulerConfig,
    state: Mutex<SchedulerState>,
}

/// Cheap-to-clone handle on the process-wide scheduler
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

impl Scheduler {
    pub fn new(
        harvester: Arc<Harvester>,
        cache: Arc<dyn CacheStore>,
        directory: Arc<dyn TenantDirectory>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                harvester,
                cache,
                directory,
                config,
                state: Mutex::new(SchedulerState::default()),
            }),
        }
    }

    fn interval(&self) -> Duration {
        Duration::from_secs(self.inner.config.interval_hours.max(1) * 3600)
    }

    /// Starts periodic sweeps, the first one immediately
    ///
    /// Returns false if the scheduler was already started.
    pub async fn start(&self) -> bool {
        let mut state = self.inner.state.lock().await;
        if state.timer.is_some() {
            return false;
        }

        let scheduler = self.clone();
        let interval = self.interval();
        state.timer = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                // Detached so that stop() never cancels a sweep halfway
                let sweep = scheduler.clone();
                tokio::spawn(async move {
                    if let Err(e) = sweep.run().await {
                        tracing::error!("Scheduled sweep failed: {}", e);
                    }
                });
            }
        }));

        tracing::info!("Scheduler started, sweeping every {:?}", interval);
        true
    }

    /// Stops periodic sweeps; a sweep already running finishes normally
    ///
    /// Returns false if the scheduler was not started.
    pub async fn stop(&self) -> bool {
        let timer = self.inner.state.lock().await.timer.take();
        match timer {
            Some(handle) => {
                handle.abort();
                tracing::info!("Scheduler stopped");
                true
            }
            None => false,
        }
    }

    /// Statistics of the current or most recent sweep
    pub async fn last_stats(&self) -> Option<SharedStats> {
        self.inner.state.lock().await.last_stats.clone()
    }

    /// Running flag, timer flag and a copy of the latest statistics
    pub async fn status(&self) -> SchedulerStatus {
        let (running, scheduled, last) = {
            let state = self.inner.state.lock().await;
            (state.running, state.timer.is_some(), state.last_stats.clone())
        };
        let last_stats = match last {
            Some(stats) => Some(stats.read().await.clone()),
            None => None,
        };

        SchedulerStatus {
            running,
            scheduled,
            last_stats,
        }
    }

    /// Sweeps every active tenant
    ///
    /// Single-flight: while a sweep is running this returns its statistics
    /// without starting a second one. A failure to list tenants is returned
    /// to the caller; a failure for one tenant is only recorded.
    ///
    /// The sweep runs on its own task, so dropping this future does not
    /// abandon it: the sweep still finishes and releases the guard.
    pub async fn run(&self) -> Result<SharedStats> {
        let stats = {
            let mut state = self.inner.state.lock().await;
            if state.running {
                if let Some(stats) = &state.last_stats {
                    tracing::info!("Sweep already in progress");
                    return Ok(Arc::clone(stats));
                }
            }
            state.running = true;
            let stats = Arc::new(RwLock::new(RunStats::begin(Utc::now())));
            state.last_stats = Some(Arc::clone(&stats));
            stats
        };

        let scheduler = self.clone();
        let task_stats = Arc::clone(&stats);
        let task = tokio::spawn(async move { scheduler.sweep_and_release(&task_stats).await });

        match task.await {
            Ok(result) => result.map(|()| stats),
            Err(e) => {
                // The task died before releasing the guard
                tracing::error!("Sweep task failed: {}", e);
                self.release(&stats).await;
                Err(HarvestError::SweepTask(e.to_string()))
            }
        }
    }

    async fn sweep_and_release(&self, stats: &SharedStats) -> Result<()> {
        let result = self.sweep(stats).await;
        self.release(stats).await;

        let finished = stats.read().await;
        tracing::info!(
            "Sweep finished: {} guides, {} scraped, {} skipped, {} errors",
            finished.total_guides,
            finished.scraped,
            finished.skipped,
            finished.errors
        );
        result
    }

    /// Stamps the end time and clears the running flag
    async fn release(&self, stats: &SharedStats) {
        stats.write().await.finish(Utc::now());
        self.inner.state.lock().await.running = false;
    }

    async fn sweep(&self, stats: &SharedStats) -> Result<()> {
        let tenants = self.inner.directory.list_active().await?;
        stats.write().await.total_guides = tenants.len();
        tracing::info!("Sweeping {} active guides", tenants.len());

        let next = AtomicUsize::new(0);
        let (next, tenants) = (&next, &tenants);
        let workers = (0..self.inner.config.tenant_concurrency.max(1)).map(|_| async move {
            loop {
                let index = next.fetch_add(1, Ordering::SeqCst);
                let Some(tenant) = tenants.get(index) else {
                    break;
                };
                let detail = self.sweep_tenant(tenant).await;
                stats.write().await.record(detail);
            }
        });
        join_all(workers).await;

        Ok(())
    }

    /// One tenant of a sweep; never fails, the outcome is the detail
    async fn sweep_tenant(&self, tenant: &Tenant) -> SweepDetail {
        let raw = match tenant.website_url.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => raw,
            _ => {
                tracing::debug!("Skipping '{}': no website URL", tenant.slug);
                return SweepDetail::skipped(&tenant.slug, None, "missing website URL");
            }
        };

        if parse_website_url(raw).is_err() {
            tracing::debug!("Skipping '{}': invalid website URL {}", tenant.slug, raw);
            return SweepDetail::skipped(&tenant.slug, Some(raw), "invalid website URL");
        }

        match self.refresh(&tenant.slug, raw).await {
            Ok(detail) => detail,
            Err(e) => {
                tracing::warn!("Sweep of '{}' failed: {}", tenant.slug, e);
                SweepDetail::failed(&tenant.slug, Some(raw), e.to_string())
            }
        }
    }

    /// Crawls and caches one tenant on demand
    ///
    /// The website URL is looked up in the tenant directory when not given.
    /// Unknown tenants and missing or malformed URLs are rejected before any
    /// network activity.
    pub async fn run_for_guide(&self, slug: &str, website_url: Option<&str>) -> Result<SweepDetail> {
        let raw = match website_url {
            Some(url) => url.trim().to_string(),
            None => self
                .inner
                .directory
                .find(slug)
                .await?
                .ok_or_else(|| HarvestError::TenantNotFound(slug.to_string()))?
                .website_url
                .unwrap_or_default()
                .trim()
                .to_string(),
        };

        if raw.is_empty() {
            return Err(HarvestError::MissingWebsite {
                slug: slug.to_string(),
            });
        }
        if parse_website_url(&raw).is_err() {
            return Err(HarvestError::InvalidWebsite {
                slug: slug.to_string(),
                url: raw,
            });
        }

        self.refresh(slug, &raw).await
    }

    /// Shared single-tenant path: crawl with sweep bounds, then cache
    ///
    /// A crawl that harvested nothing leaves the existing snapshot alone.
    async fn refresh(&self, slug: &str, website_url: &str) -> Result<SweepDetail> {
        let config = &self.inner.config;
        let request = CrawlRequest {
            max_pages: Some(config.max_pages),
            max_depth: Some(config.max_depth),
            max_concurrency: Some(config.max_concurrency),
            ..CrawlRequest::new(website_url)
        };

        let outcome = self.inner.harvester.crawl(&request).await?;
        if outcome.pages.is_empty() {
            let reason = outcome.warning.unwrap_or_else(|| NO_PAGES.to_string());
            tracing::info!("Nothing cached for '{}': {}", slug, reason);
            return Ok(SweepDetail::skipped(slug, Some(website_url), reason));
        }

        let document = self.inner.cache.save(slug, website_url, outcome.pages).await?;
        Ok(SweepDetail::scraped(slug, website_url, document.pages.len()))
    }
}
