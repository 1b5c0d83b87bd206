//! # Integration Tests for the HTTP Page Fetcher
//!
//! Runs [`HttpPageFetcher`] against wiremock servers to check request
//! headers, timeout classification, body capping, and that status and
//! content-type classification is left to `FetchedPage::into_text`.

use std::time::Duration;

use fwdlink_fetch::{FetchConfig, FetchError, HttpPageFetcher, PageFetcher};
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(5);

fn fetcher(config: FetchConfig) -> HttpPageFetcher {
    HttpPageFetcher::new(&config).expect("client build")
}

fn url(server: &MockServer, p: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), p)).expect("url")
}

#[tokio::test]
async fn fetch_text_page_sends_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/article"))
        .and(header("user-agent", "ForwardLinkBot/0.1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string("<p>Solar panel efficiency</p>"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let page = fetcher(FetchConfig::default())
        .fetch(&url(&server, "/article"), TIMEOUT)
        .await
        .expect("fetch");

    assert_eq!(page.status, 200);
    assert!(page.is_text());
    assert_eq!(page.into_text().unwrap(), "<p>Solar panel efficiency</p>");
}

#[tokio::test]
async fn fetch_returns_non_2xx_without_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(
            ResponseTemplate::new(404)
                .insert_header("content-type", "text/plain")
                .set_body_string("not found"),
        )
        .mount(&server)
        .await;

    let page = fetcher(FetchConfig::default())
        .fetch(&url(&server, "/missing"), TIMEOUT)
        .await
        .expect("fetch completes");
    assert_eq!(page.status, 404);
    assert!(matches!(
        page.into_text(),
        Err(FetchError::Status { status: 404, .. })
    ));
}

#[tokio::test]
async fn fetch_binary_content_is_non_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/paper.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(vec![0x25, 0x50, 0x44, 0x46]),
        )
        .mount(&server)
        .await;

    let page = fetcher(FetchConfig::default())
        .fetch(&url(&server, "/paper.pdf"), TIMEOUT)
        .await
        .expect("fetch");
    assert!(matches!(page.into_text(), Err(FetchError::NonText { .. })));
}

#[tokio::test]
async fn slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string("late")
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let err = fetcher(FetchConfig::default())
        .fetch(&url(&server, "/slow"), Duration::from_millis(100))
        .await
        .expect_err("must time out");
    assert!(
        matches!(err, FetchError::Timeout { timeout_ms: 100, .. }),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn body_truncated_at_cap() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/big"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/plain")
                .set_body_string("x".repeat(10_000)),
        )
        .mount(&server)
        .await;

    let config = FetchConfig {
        max_body_bytes: 1024,
        ..FetchConfig::default()
    };
    let page = fetcher(config)
        .fetch(&url(&server, "/big"), TIMEOUT)
        .await
        .expect("fetch");
    assert_eq!(page.body.len(), 1024);
}

#[tokio::test]
async fn connection_refused_is_transport_error() {
    let config = FetchConfig {
        max_retries: 1,
        retry_base_delay: Duration::from_millis(5),
        ..FetchConfig::default()
    };
    let err = fetcher(config)
        .fetch(&Url::parse("http://127.0.0.1:1/").unwrap(), TIMEOUT)
        .await
        .expect_err("closed port");
    assert!(
        matches!(err, FetchError::Transport { .. }),
        "unexpected error: {err:?}"
    );
}
