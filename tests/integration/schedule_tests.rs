//! Integration tests for the sweep scheduler
//!
//! Each test runs the scheduler against wiremock sites and a temporary
//! cache directory.

use guide_harvest::config::{CrawlerConfig, SchedulerConfig, UserAgentConfig};
use guide_harvest::crawler::{Fetcher, Harvester, ROBOTS_WARNING};
use guide_harvest::extract::{PageKind, ScrapedPage};
use guide_harvest::schedule::{DetailStatus, Scheduler, StaticDirectory, Tenant};
use guide_harvest::storage::{CacheStore, FileCacheStore};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FILLER: &str = "Queijos artesanais de pequenos produtores, curados em câmaras \
    próprias e vendidos em peças inteiras ou fracionadas. Montamos tábuas para eventos, \
    enviamos cestas de presente e oferecemos degustações guiadas aos sábados pela manhã \
    para quem quer conhecer melhor cada região.";

fn test_agent() -> UserAgentConfig {
    UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
        contact_email: "test@example.com".to_string(),
    }
}

fn tenant(slug: &str, website_url: Option<&str>) -> Tenant {
    Tenant {
        slug: slug.to_string(),
        website_url: website_url.map(str::to_string),
        is_active: true,
    }
}

fn build_scheduler(cache: Arc<FileCacheStore>, tenants: Vec<Tenant>) -> Scheduler {
    let defaults = CrawlerConfig {
        timeout_ms: 2_000,
        ..CrawlerConfig::default()
    };
    let harvester = Harvester::new(Fetcher::new(&test_agent()).unwrap(), defaults);
    Scheduler::new(
        Arc::new(harvester),
        cache,
        Arc::new(StaticDirectory::new(tenants)),
        SchedulerConfig::default(),
    )
}

fn cache_in(dir: &TempDir) -> Arc<FileCacheStore> {
    Arc::new(FileCacheStore::new(dir.path(), chrono::Duration::hours(4)))
}

fn rich_page(title: &str, extra: &str) -> String {
    format!(
        r#"<html><head><title>{title}</title></head><body>
        <h1>{title}</h1><p>{FILLER}</p>{extra}</body></html>"#
    )
}

/// Mounts a two-page site: a homepage linking to one product
async fn mount_site(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            rich_page("Queijaria", r#"<a href="/produtos/brie">Brie</a>"#),
            "text/html",
        ))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/produtos/brie"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(rich_page("Brie", ""), "text/html"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_run_for_guide_persists_snapshot() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let dir = TempDir::new().unwrap();
    let cache = cache_in(&dir);
    let scheduler = build_scheduler(cache.clone(), vec![tenant("queijaria", Some(&server.uri()))]);

    let detail = scheduler.run_for_guide("queijaria", None).await.unwrap();
    assert_eq!(detail.status, DetailStatus::Scraped);
    assert_eq!(detail.pages, Some(2));

    let document = cache
        .get_valid_by_guide("queijaria")
        .await
        .unwrap()
        .expect("snapshot saved");
    assert_eq!(document.pages.len(), 2);
    assert!(document.pages.iter().any(|p| p.kind == PageKind::Product));
    assert_eq!(document.domain, "127.0.0.1");

    let by_domain = cache.get_valid_by_domain("127.0.0.1").await.unwrap();
    assert_eq!(by_domain.map(|d| d.guide_slug), Some("queijaria".to_string()));

    // A fresh store over the same directory sees the persisted file
    let reopened = FileCacheStore::new(dir.path(), chrono::Duration::hours(4));
    let reloaded = reopened.get_valid_by_guide("queijaria").await.unwrap();
    assert_eq!(reloaded.map(|d| d.pages.len()), Some(2));
}

#[tokio::test]
async fn test_run_for_guide_with_url_override() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let dir = TempDir::new().unwrap();
    let cache = cache_in(&dir);
    let scheduler = build_scheduler(cache.clone(), Vec::new());

    let detail = scheduler
        .run_for_guide("avulso", Some(&server.uri()))
        .await
        .unwrap();
    assert_eq!(detail.status, DetailStatus::Scraped);
    assert!(cache.get_valid_by_guide("avulso").await.unwrap().is_some());
}

#[tokio::test]
async fn test_sweep_records_every_tenant() {
    let good = MockServer::start().await;
    mount_site(&good).await;

    let closed = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /"))
        .mount(&closed)
        .await;

    let dir = TempDir::new().unwrap();
    let cache = cache_in(&dir);
    let scheduler = build_scheduler(
        cache.clone(),
        vec![
            tenant("queijaria", Some(&good.uri())),
            tenant("fechada", Some(&closed.uri())),
            tenant("sem-site", None),
        ],
    );

    let stats = scheduler.run().await.unwrap();
    let stats = stats.read().await.clone();

    assert!(stats.is_finished());
    assert_eq!(stats.total_guides, 3);
    assert_eq!(stats.scraped, 1);
    assert_eq!(stats.skipped, 2);
    assert_eq!(stats.errors, 0);

    let closed_detail = stats.details.iter().find(|d| d.slug == "fechada").unwrap();
    assert_eq!(closed_detail.status, DetailStatus::Skipped);
    assert_eq!(closed_detail.error.as_deref(), Some(ROBOTS_WARNING));

    assert!(cache.get_valid_by_guide("queijaria").await.unwrap().is_some());
    assert!(cache.get_valid_by_guide("fechada").await.unwrap().is_none());
}

#[tokio::test]
async fn test_empty_crawl_keeps_previous_snapshot() {
    let server = MockServer::start().await;

    let dir = TempDir::new().unwrap();
    let cache = cache_in(&dir);
    let previous = ScrapedPage {
        url: format!("{}/sobre", server.uri()),
        title: Some("Sobre".to_string()),
        description: None,
        text: FILLER.to_string(),
        kind: PageKind::Page,
    };
    cache
        .save("queijaria", &server.uri(), vec![previous])
        .await
        .unwrap();

    let scheduler = build_scheduler(cache.clone(), vec![tenant("queijaria", Some(&server.uri()))]);
    let detail = scheduler.run_for_guide("queijaria", None).await.unwrap();

    assert_eq!(detail.status, DetailStatus::Skipped);
    assert_eq!(detail.error.as_deref(), Some("no pages harvested"));

    let kept = cache.get_valid_by_guide("queijaria").await.unwrap().unwrap();
    assert_eq!(kept.pages.len(), 1);
}

#[tokio::test]
async fn test_concurrent_runs_share_one_sweep() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(rich_page("Queijaria", ""), "text/html")
                .set_delay(Duration::from_millis(500)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let scheduler = build_scheduler(cache_in(&dir), vec![tenant("queijaria", Some(&server.uri()))]);

    let late = scheduler.clone();
    let (first, second) = tokio::join!(scheduler.run(), async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        late.run().await
    });
    let (first, second) = (first.unwrap(), second.unwrap());

    assert!(Arc::ptr_eq(&first, &second));
    let stats = first.read().await;
    assert!(stats.is_finished());
    assert_eq!(stats.scraped, 1);
}

#[tokio::test]
async fn test_cancelled_caller_does_not_wedge_the_scheduler() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(rich_page("Queijaria", ""), "text/html")
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let cache = cache_in(&dir);
    let scheduler = build_scheduler(cache.clone(), vec![tenant("queijaria", Some(&server.uri()))]);

    let cancelled = tokio::time::timeout(Duration::from_millis(100), scheduler.run()).await;
    assert!(cancelled.is_err());
    assert!(scheduler.status().await.running);

    tokio::time::sleep(Duration::from_millis(1_500)).await;

    let status = scheduler.status().await;
    assert!(!status.running);
    let first = status.last_stats.expect("abandoned sweep still recorded");
    assert!(first.is_finished());
    assert_eq!(first.scraped, 1);
    assert!(cache.get_valid_by_guide("queijaria").await.unwrap().is_some());

    let previous = scheduler.last_stats().await.unwrap();
    let next = scheduler.run().await.unwrap();
    assert!(!Arc::ptr_eq(&previous, &next));
    assert!(next.read().await.is_finished());
}
