//! Integration tests for live site-search

use guide_harvest::config::{SearchConfig, UserAgentConfig};
use guide_harvest::crawler::Fetcher;
use guide_harvest::search::{site_search, MIN_CONFIDENCE};
use guide_harvest::HarvestError;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FILLER: &str = "Trabalhamos com rótulos de pequenas vinícolas, guardados em adega \
    climatizada e entregues com embalagem reforçada. Nossa equipe ajuda a escolher a garrafa \
    certa para cada ocasião e monta kits para presentes corporativos e celebrações em família.";

fn fetcher() -> Fetcher {
    let agent = UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
        contact_email: "test@example.com".to_string(),
    };
    Fetcher::new(&agent).expect("Failed to build fetcher")
}

fn search_config() -> SearchConfig {
    SearchConfig {
        timeout_ms: 2_000,
        ..SearchConfig::default()
    }
}

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<html><head><title>{title}</title></head><body>
        <h1>{title}</h1><p>{body}</p><p>{FILLER}</p></body></html>"#
    )
}

async fn mount_html(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .mount(server)
        .await;
}

async fn mount_sitemap(server: &MockServer, paths: &[&str]) {
    let entries: String = paths
        .iter()
        .map(|p| format!("<url><loc>{}{}</loc></url>", server.uri(), p))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{entries}</urlset>"#
    );
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(xml, "application/xml"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_low_confidence_hits_are_dropped() {
    let server = MockServer::start().await;
    mount_sitemap(&server, &["/vinho-tinto", "/vinho-branco", "/sobre"]).await;
    mount_html(
        &server,
        "/vinho-tinto",
        page("Vinho Tinto Reserva", "Um vinho tinto encorpado da serra."),
    )
    .await;
    mount_html(
        &server,
        "/vinho-branco",
        page("Vinho Branco", "Um vinho branco leve e fresco."),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/sobre"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(page("Sobre", ""), "text/html"))
        .expect(0)
        .mount(&server)
        .await;

    let response = site_search(&fetcher(), &server.uri(), "vinho tinto", &search_config())
        .await
        .unwrap();

    assert_eq!(response.q, "vinho tinto");
    assert_eq!(response.base, format!("{}/", server.uri()));
    assert_eq!(response.results.len(), 1);

    let hit = &response.results[0];
    assert!(hit.url.ends_with("/vinho-tinto"));
    assert_eq!(hit.title.as_deref(), Some("Vinho Tinto Reserva"));
    assert!(hit.verified);
    assert!(hit.confidence >= MIN_CONFIDENCE);
    assert!(hit.score > 0);
}

#[tokio::test]
async fn test_homepage_links_when_sitemap_has_no_match() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/",
        page(
            "Queijaria",
            r#"<a href="/queijos/brie">Brie</a><a href="/contato">Contato</a>"#,
        ),
    )
    .await;
    mount_html(&server, "/queijos/brie", page("Queijo Brie", "Brie cremoso.")).await;

    let response = site_search(&fetcher(), &server.uri(), "brie", &search_config())
        .await
        .unwrap();

    assert_eq!(response.results.len(), 1);
    assert!(response.results[0].url.ends_with("/queijos/brie"));
    assert_eq!(response.results[0].confidence, 1.0);
}

#[tokio::test]
async fn test_unfetchable_candidates_are_dropped() {
    let server = MockServer::start().await;
    mount_sitemap(&server, &["/vinho-tinto"]).await;
    Mock::given(method("GET"))
        .and(path("/vinho-tinto"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let response = site_search(&fetcher(), &server.uri(), "vinho tinto", &search_config())
        .await
        .unwrap();
    assert!(response.results.is_empty());
}

#[tokio::test]
async fn test_unreachable_site_returns_no_results() {
    let server = MockServer::start().await;

    let response = site_search(&fetcher(), &server.uri(), "qualquer coisa", &search_config())
        .await
        .unwrap();
    assert!(response.results.is_empty());
}

#[tokio::test]
async fn test_malformed_base_is_rejected() {
    let result = site_search(&fetcher(), "adega sem protocolo", "vinho", &search_config()).await;
    assert!(matches!(result, Err(HarvestError::UrlError(_))));
}
