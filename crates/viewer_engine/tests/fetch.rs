use std::time::Duration;

use viewer_engine::{ContentFetcher, FailureKind, FetchSettings, ReqwestFetcher};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn fetcher_returns_decoded_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/doc"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("<html>ok</html>", "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default());
    let url = format!("{}/doc", server.uri());

    let fetched = fetcher.fetch(&url).await.expect("fetch ok");
    assert_eq!(fetched.body, "<html>ok</html>");
    assert_eq!(fetched.metadata.original_url, url);
    assert_eq!(fetched.metadata.final_url, url);
    assert_eq!(fetched.metadata.redirect_count, 0);
    assert_eq!(fetched.metadata.encoding, "UTF-8");
    assert_eq!(fetched.metadata.byte_len, 15);
}

#[tokio::test]
async fn fetcher_returns_error_page_body_with_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_raw("<html>not found page</html>", "text/html"),
        )
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default());
    let url = format!("{}/missing", server.uri());

    let fetched = fetcher.fetch(&url).await.expect("error pages still have a body");
    assert_eq!(fetched.body, "<html>not found page</html>");
    assert_eq!(fetched.metadata.status, 404);
    assert_eq!(fetched.metadata.status_text, "Not Found");
    assert!(!fetched.metadata.is_success());
}

#[tokio::test]
async fn fetcher_accepts_any_media_type_by_default() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(r#"{"a":1}"#, "application/json"))
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default());
    let url = format!("{}/data.json", server.uri());

    let fetched = fetcher.fetch(&url).await.expect("json is fetched");
    assert_eq!(fetched.body, r#"{"a":1}"#);
    assert_eq!(fetched.metadata.content_type.as_deref(), Some("application/json"));
    assert!(fetched.metadata.is_success());
}

async fn mount_redirect(server: &MockServer, from: &str, to: &str) {
    Mock::given(method("GET"))
        .and(path(from))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", format!("{}{}", server.uri(), to)),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn fetcher_follows_up_to_redirect_limit() {
    let server = MockServer::start().await;
    mount_redirect(&server, "/a", "/b").await;
    mount_redirect(&server, "/b", "/c").await;
    Mock::given(method("GET"))
        .and(path("/c"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("end", "text/plain"))
        .mount(&server)
        .await;
    let url = format!("{}/a", server.uri());

    let settings = FetchSettings {
        redirect_limit: 2,
        ..FetchSettings::default()
    };
    let fetched = ReqwestFetcher::new(settings).fetch(&url).await.expect("two redirects allowed");
    assert_eq!(fetched.body, "end");
    assert_eq!(fetched.metadata.redirect_count, 2);
    assert_eq!(fetched.metadata.final_url, format!("{}/c", server.uri()));

    let settings = FetchSettings {
        redirect_limit: 1,
        ..FetchSettings::default()
    };
    let err = ReqwestFetcher::new(settings).fetch(&url).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::RedirectLimitExceeded);
}

#[tokio::test]
async fn fetcher_times_out_on_slow_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_string("slow"),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        request_timeout: Duration::from_millis(50),
        ..FetchSettings::default()
    };
    let fetcher = ReqwestFetcher::new(settings);
    let url = format!("{}/slow", server.uri());

    let err = fetcher.fetch(&url).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn fetcher_rejects_too_large_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/large"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("01234567890", "text/html"))
        .mount(&server)
        .await;

    let settings = FetchSettings {
        max_bytes: 10,
        ..FetchSettings::default()
    };
    let fetcher = ReqwestFetcher::new(settings);
    let url = format!("{}/large", server.uri());

    let err = fetcher.fetch(&url).await.unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::TooLarge {
            max_bytes: 10,
            actual: Some(11)
        }
    );
}

#[tokio::test]
async fn fetcher_rejects_content_type_outside_configured_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/image"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8, 1, 2], "image/png"))
        .mount(&server)
        .await;

    let settings = FetchSettings {
        allowed_content_types: vec!["text/html".to_string()],
        ..FetchSettings::default()
    };
    let fetcher = ReqwestFetcher::new(settings);
    let url = format!("{}/image", server.uri());

    let err = fetcher.fetch(&url).await.unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::UnsupportedContentType {
            content_type: "image/png".to_string()
        }
    );
}

#[tokio::test]
async fn fetcher_rejects_unparseable_url() {
    let fetcher = ReqwestFetcher::new(FetchSettings::default());
    let err = fetcher.fetch("not a url").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}
