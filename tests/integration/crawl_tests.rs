//! Integration tests for the crawl engine
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use guide_harvest::config::{CrawlerConfig, UserAgentConfig};
use guide_harvest::crawler::{CrawlRequest, Fetcher, Harvester, ROBOTS_WARNING};
use guide_harvest::extract::PageKind;
use guide_harvest::robots::check_disallowed;
use std::collections::HashSet;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FILLER: &str = "Nossa casa trabalha com produtores familiares de várias regiões, \
    selecionando cada garrafa com cuidado. Atendemos restaurantes, empresas e clientes \
    particulares, com entrega em toda a cidade e consultoria para eventos e harmonizações \
    especiais durante o ano inteiro.";

fn test_agent() -> UserAgentConfig {
    UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
        contact_email: "test@example.com".to_string(),
    }
}

fn harvester() -> Harvester {
    let defaults = CrawlerConfig {
        timeout_ms: 2_000,
        ..CrawlerConfig::default()
    };
    Harvester::new(
        Fetcher::new(&test_agent()).expect("Failed to build fetcher"),
        defaults,
    )
}

/// A page with enough readable text to be kept
fn rich_page(title: &str, extra: &str) -> String {
    format!(
        r#"<html><head><title>{title}</title></head><body>
        <h1>{title}</h1><p>{FILLER}</p>{extra}</body></html>"#
    )
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html")
}

async fn mount_html(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .mount(server)
        .await;
}

async fn mount_untouched(server: &MockServer, route: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(rich_page("Nunca", "")))
        .expect(0)
        .mount(server)
        .await;
}

fn paths(urls: impl IntoIterator<Item = String>) -> HashSet<String> {
    urls.into_iter()
        .map(|u| Url::parse(&u).expect("page URL").path().to_string())
        .collect()
}

#[tokio::test]
async fn test_robots_disallow_all_stops_the_crawl() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /"))
        .mount(&server)
        .await;
    mount_untouched(&server, "/").await;
    mount_untouched(&server, "/sitemap.xml").await;

    let outcome = harvester()
        .crawl(&CrawlRequest::new(server.uri()))
        .await
        .expect("crawl should not fail");

    assert_eq!(outcome.total, 0);
    assert!(outcome.pages.is_empty());
    assert_eq!(outcome.warning.as_deref(), Some(ROBOTS_WARNING));

    let fetcher = Fetcher::new(&test_agent()).unwrap();
    let origin = Url::parse(&server.uri()).unwrap();
    assert!(check_disallowed(&fetcher, &origin).await);
}

#[tokio::test]
async fn test_ignoring_robots_crawls_anyway() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /"))
        .mount(&server)
        .await;
    mount_html(&server, "/", rich_page("Adega Central", "")).await;

    let request = CrawlRequest {
        respect_robots_txt: Some(false),
        ..CrawlRequest::new(server.uri())
    };
    let outcome = harvester().crawl(&request).await.unwrap();

    assert_eq!(outcome.total, 1);
    assert!(outcome.warning.is_none());
    assert_eq!(outcome.pages[0].title.as_deref(), Some("Adega Central"));
}

#[tokio::test]
async fn test_missing_robots_fails_open() {
    let server = MockServer::start().await;
    let fetcher = Fetcher::new(&test_agent()).unwrap();
    let origin = Url::parse(&server.uri()).unwrap();
    assert!(!check_disallowed(&fetcher, &origin).await);
}

#[tokio::test]
async fn test_sitemap_seeded_crawl() {
    let server = MockServer::start().await;
    let base = server.uri();

    let sitemap = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
        <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
          <url><loc>{base}/produtos/vinho-1</loc></url>
          <url><loc>{base}/sobre</loc></url>
          <url><loc>{base}/sitemap-extra.xml</loc></url>
        </urlset>"#
    );
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sitemap, "application/xml"))
        .mount(&server)
        .await;

    mount_html(
        &server,
        "/produtos/vinho-1",
        rich_page("Vinho Tinto Reserva", r#"<a href="/sobre">Sobre</a>"#),
    )
    .await;
    mount_html(
        &server,
        "/sobre",
        rich_page(
            "Sobre nós",
            r#"<a href="/produtos/vinho-1#avaliacoes">Vinho</a><a href="/contato">Contato</a>"#,
        ),
    )
    .await;
    // Only linked from a page, found at depth 1
    Mock::given(method("GET"))
        .and(path("/contato"))
        .respond_with(html(rich_page("Contato", r#"<a href="/fundo">Fundo</a>"#)))
        .expect(1)
        .mount(&server)
        .await;
    mount_untouched(&server, "/fundo").await;
    mount_untouched(&server, "/sitemap-extra.xml").await;

    let request = CrawlRequest {
        max_depth: Some(1),
        max_pages: Some(10),
        ..CrawlRequest::new(&base)
    };
    let outcome = harvester().crawl(&request).await.unwrap();

    assert_eq!(outcome.base, format!("{}/", base));
    assert_eq!(outcome.total, 3);
    assert_eq!(outcome.total, outcome.pages.len());

    let urls: Vec<String> = outcome.pages.iter().map(|p| p.url.clone()).collect();
    let unique: HashSet<&String> = urls.iter().collect();
    assert_eq!(unique.len(), urls.len(), "no page is harvested twice");
    assert_eq!(
        paths(urls),
        HashSet::from([
            "/produtos/vinho-1".to_string(),
            "/sobre".to_string(),
            "/contato".to_string()
        ])
    );

    let product = outcome
        .pages
        .iter()
        .find(|p| p.url.ends_with("/produtos/vinho-1"))
        .unwrap();
    assert_eq!(product.kind, PageKind::Product);
    assert!(product.text.contains("produtores familiares"));

    let about = outcome.pages.iter().find(|p| p.url.ends_with("/sobre")).unwrap();
    assert_eq!(about.kind, PageKind::Page);
}

#[tokio::test]
async fn test_homepage_seed_respects_depth() {
    let server = MockServer::start().await;

    mount_html(&server, "/", rich_page("Início", r#"<a href="/a">A</a>"#)).await;
    mount_html(&server, "/a", rich_page("Página A", r#"<a href="/b">B</a>"#)).await;
    mount_untouched(&server, "/b").await;

    let request = CrawlRequest {
        max_depth: Some(1),
        ..CrawlRequest::new(server.uri())
    };
    let outcome = harvester().crawl(&request).await.unwrap();

    assert_eq!(
        paths(outcome.pages.into_iter().map(|p| p.url)),
        HashSet::from(["/".to_string(), "/a".to_string()])
    );
}

#[tokio::test]
async fn test_thin_and_soft_404_pages_are_dropped() {
    let server = MockServer::start().await;

    let links = r#"<a href="/curta">Curta</a><a href="/sumiu">Sumiu</a>
        <a href="/catalogo.pdf">PDF</a><a href="/vinhos">Vinhos</a>"#;
    mount_html(&server, "/", rich_page("Início", links)).await;
    mount_html(
        &server,
        "/curta",
        "<html><head><title>Curta</title></head><body><p>Pouco texto.</p></body></html>".to_string(),
    )
    .await;
    mount_html(&server, "/sumiu", rich_page("Página não encontrada", "")).await;
    mount_html(&server, "/vinhos", rich_page("Vinhos", "")).await;
    mount_untouched(&server, "/catalogo.pdf").await;

    let outcome = harvester()
        .crawl(&CrawlRequest::new(server.uri()))
        .await
        .unwrap();

    assert_eq!(
        paths(outcome.pages.into_iter().map(|p| p.url)),
        HashSet::from(["/".to_string(), "/vinhos".to_string()])
    );
}

#[tokio::test]
async fn test_max_pages_bound() {
    let server = MockServer::start().await;

    let links: String = (1..=10)
        .map(|i| format!(r#"<a href="/pagina-{i}">{i}</a>"#))
        .collect();
    mount_html(&server, "/", rich_page("Início", &links)).await;
    for i in 1..=10 {
        mount_html(&server, &format!("/pagina-{i}"), rich_page(&format!("Página {i}"), "")).await;
    }

    let request = CrawlRequest {
        max_pages: Some(3),
        max_concurrency: Some(1),
        ..CrawlRequest::new(server.uri())
    };
    let outcome = harvester().crawl(&request).await.unwrap();

    assert_eq!(outcome.total, 3);
    assert_eq!(outcome.pages[0].url, format!("{}/", server.uri()));
}

#[tokio::test]
async fn test_max_pages_bound_with_parallel_workers() {
    let server = MockServer::start().await;

    let links: String = (1..=30)
        .map(|i| format!(r#"<a href="/pagina-{i}">{i}</a><a href="/pagina-{i}?utm_source=x">{i}</a>"#))
        .collect();
    mount_html(&server, "/", rich_page("Início", &links)).await;
    for i in 1..=30 {
        let body = rich_page(&format!("Página {i}"), r#"<a href="/">Início</a>"#);
        Mock::given(method("GET"))
            .and(path(format!("/pagina-{i}")))
            .respond_with(html(body).set_delay(Duration::from_millis(150)))
            .mount(&server)
            .await;
    }

    let (max_pages, max_concurrency) = (5, 6);
    let request = CrawlRequest {
        max_pages: Some(max_pages),
        max_depth: Some(1),
        max_concurrency: Some(max_concurrency),
        ..CrawlRequest::new(server.uri())
    };
    let outcome = harvester().crawl(&request).await.unwrap();

    assert!(outcome.total >= max_pages);
    assert!(outcome.total <= max_pages + max_concurrency - 1);

    let urls: Vec<String> = outcome.pages.iter().map(|p| p.url.clone()).collect();
    let unique: HashSet<&String> = urls.iter().collect();
    assert_eq!(unique.len(), urls.len(), "no URL is visited twice");

    let requests = server.received_requests().await.unwrap();
    let homepage_hits = requests.iter().filter(|r| r.url.path() == "/").count();
    assert_eq!(homepage_hits, 1);
}

#[tokio::test]
async fn test_include_and_exclude_filters() {
    let server = MockServer::start().await;

    let links = r#"<a href="/produtos/merlot">Merlot</a>
        <a href="/produtos/merlot-esgotado">Esgotado</a>
        <a href="/blog/safra">Blog</a>"#;
    mount_html(&server, "/", rich_page("Início", links)).await;
    mount_html(&server, "/produtos/merlot", rich_page("Merlot", "")).await;
    mount_untouched(&server, "/produtos/merlot-esgotado").await;
    mount_untouched(&server, "/blog/safra").await;

    let request = CrawlRequest {
        include_patterns: vec!["/produtos/".to_string()],
        exclude_patterns: vec!["esgotado".to_string()],
        ..CrawlRequest::new(server.uri())
    };
    let outcome = harvester().crawl(&request).await.unwrap();

    assert_eq!(
        paths(outcome.pages.into_iter().map(|p| p.url)),
        HashSet::from(["/".to_string(), "/produtos/merlot".to_string()])
    );
}

#[tokio::test]
async fn test_repeated_crawl_reuses_recent_result() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(rich_page("Adega", "")))
        .expect(1)
        .mount(&server)
        .await;

    let harvester = harvester();
    let request = CrawlRequest::new(server.uri());
    let first = harvester.crawl(&request).await.unwrap();
    let second = harvester.crawl(&request).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(second.total, 1);
}

#[tokio::test]
async fn test_unreachable_site_yields_empty_outcome() {
    let server = MockServer::start().await;

    let outcome = harvester()
        .crawl(&CrawlRequest::new(server.uri()))
        .await
        .unwrap();

    assert_eq!(outcome.total, 0);
    assert!(outcome.warning.is_none());
}
