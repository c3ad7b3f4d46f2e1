use checkup::fetcher::{fetch_following_redirects, resolve};
use std::time::Duration;
use url::Url;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

const TIMEOUT: Duration = Duration::from_secs(5);

async fn fetch(url: &str, timeout: Duration) -> checkup::fetcher::FetchOutcome {
    let url = Url::parse(url).unwrap();
    fetch_following_redirects(&url, timeout, true).await
}

#[tokio::test]
async fn fetch_success_returns_body_and_final_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><head><title>Test</title></head><body>Hello World</body></html>")
                .insert_header("Content-Type", "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;

    let outcome = fetch(&format!("{}/page", server.uri()), TIMEOUT).await;
    assert!(outcome.ok);
    assert_eq!(outcome.status, 200);
    assert!(outcome.html.contains("Hello World"));
    assert_eq!(outcome.redirect_count, 0);
    assert!(!outcome.timed_out);
    assert!(outcome.error.is_none());
}

#[tokio::test]
async fn redirects_are_followed_and_counted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/start"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/middle"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/middle"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/final"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/final"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body>Final page</body></html>")
                .insert_header("Content-Type", "text/html"),
        )
        .mount(&server)
        .await;

    let outcome = fetch(&format!("{}/start", server.uri()), TIMEOUT).await;
    assert!(outcome.ok);
    assert_eq!(outcome.redirect_count, 2);
    assert!(outcome.final_url.ends_with("/final"));
    assert!(outcome.html.contains("Final page"));
}

#[tokio::test]
async fn sixth_redirect_aborts_the_chain() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/loop"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/loop"))
        .expect(6)
        .mount(&server)
        .await;

    let outcome = fetch(&format!("{}/loop", server.uri()), TIMEOUT).await;
    assert!(!outcome.ok);
    assert_eq!(outcome.status, 508);
    assert_eq!(outcome.redirect_count, 6);
    assert!(outcome.error.unwrap().contains("Too many redirects"));
}

#[tokio::test]
async fn redirect_without_location_is_an_error_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dangling"))
        .respond_with(ResponseTemplate::new(302))
        .mount(&server)
        .await;

    let outcome = fetch(&format!("{}/dangling", server.uri()), TIMEOUT).await;
    assert!(!outcome.ok);
    assert_eq!(outcome.status, 302);
    assert!(outcome.error.unwrap().contains("missing Location header"));
}

#[tokio::test]
async fn non_success_statuses_are_not_ok_but_not_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("<html>gone</html>"))
        .mount(&server)
        .await;

    let outcome = fetch(&format!("{}/missing", server.uri()), TIMEOUT).await;
    assert!(!outcome.ok);
    assert_eq!(outcome.status, 404);
    assert!(outcome.error.is_none());
    assert!(!outcome.blocked_status);
}

#[tokio::test]
async fn blocking_statuses_are_flagged() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/blocked"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let outcome = fetch(&format!("{}/blocked", server.uri()), TIMEOUT).await;
    assert!(!outcome.ok);
    assert!(outcome.blocked_status);
}

#[tokio::test]
async fn slow_targets_time_out_with_a_distinct_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html>late</html>")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let outcome = fetch(&format!("{}/slow", server.uri()), Duration::from_secs(1)).await;
    assert!(!outcome.ok);
    assert!(outcome.timed_out);
    assert_eq!(outcome.status, 408);
    assert!(outcome.error.unwrap().contains("timed out"));
}

#[tokio::test]
async fn gzip_bodies_are_decoded_transparently() {
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    let original = "<html><head><title>Compressed</title></head><body>This content is gzipped!</body></html>";
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(original.as_bytes()).unwrap();
    let compressed = encoder.finish().unwrap();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gzipped"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(compressed)
                .insert_header("Content-Type", "text/html; charset=utf-8")
                .insert_header("Content-Encoding", "gzip"),
        )
        .mount(&server)
        .await;

    let outcome = fetch(&format!("{}/gzipped", server.uri()), TIMEOUT).await;
    assert!(outcome.ok);
    assert!(outcome.html.contains("This content is gzipped!"));
}

#[tokio::test]
async fn oversized_bodies_are_capped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/large"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("x".repeat(2_000_000))
                .insert_header("Content-Type", "text/html"),
        )
        .mount(&server)
        .await;

    let outcome = fetch(&format!("{}/large", server.uri()), TIMEOUT).await;
    assert!(outcome.ok);
    assert_eq!(outcome.html.len(), 1_500_000);
}

#[tokio::test]
async fn guarded_targets_fail_without_touching_the_network() {
    let url = Url::parse("http://127.0.0.1:1/").unwrap();
    let outcome = fetch_following_redirects(&url, TIMEOUT, false).await;
    assert!(!outcome.ok);
    assert_eq!(outcome.status, 400);
    assert!(outcome.error.unwrap().contains("blocked"));
    assert_eq!(outcome.redirect_count, 0);
}

#[tokio::test]
async fn resolve_normalizes_bare_domains() {
    let url = resolve("example.com").unwrap();
    assert_eq!(url.as_str(), "https://example.com/");
    assert!(resolve("javascript:alert(1)").is_err());
}
