//! Page conversion against mock reader and site servers

use job_scout::convert::{is_error_marker, ContentConverter, HtmlFallback, PageConverter, ReaderClient};
use job_scout::retry::RetryPolicy;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const JOB_PAGE: &str = r#"<html><head><title>Careers</title><script>var x = 1;</script></head>
<body><h1>Backend Engineer</h1><p>Build the crawler platform.</p></body></html>"#;

fn converter(server: &MockServer, attempts: u32) -> ContentConverter {
    let policy = RetryPolicy {
        max_attempts: attempts,
        ..RetryPolicy::none()
    };
    ContentConverter::new(
        ReaderClient::new(format!("{}/read/{{url}}", server.uri()), Duration::from_secs(5))
            .expect("reader client"),
        HtmlFallback::new("job-scout-test", Duration::from_secs(5)).expect("fallback client"),
        policy,
    )
}

async fn mount_job_page(server: &MockServer, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/jobs/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(JOB_PAGE)
                .insert_header("content-type", "text/html"),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_reader_markdown_is_returned() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/read/"))
        .and(header("X-Respond-With", "markdown"))
        .respond_with(ResponseTemplate::new(200).set_body_string("# Backend Engineer\n\nRemote"))
        .expect(1)
        .mount(&server)
        .await;
    mount_job_page(&server, 0).await;

    let page = format!("{}/jobs/1", server.uri());
    let text = converter(&server, 1)
        .convert(&page, &CancellationToken::new())
        .await;

    assert_eq!(text, "# Backend Engineer\n\nRemote");
}

#[tokio::test]
async fn test_event_stream_keeps_last_event() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/read/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(
                    "data: {\"content\":\"# Back\"}\n\ndata: {\"content\":\"# Backend Engineer\"}\n\n",
                ),
        )
        .mount(&server)
        .await;

    let page = format!("{}/jobs/1", server.uri());
    let text = converter(&server, 1)
        .convert(&page, &CancellationToken::new())
        .await;

    assert_eq!(text, "# Backend Engineer");
}

#[tokio::test]
async fn test_error_text_falls_back_to_local_extraction() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/read/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Error: target blocked the reader"))
        .expect(1)
        .mount(&server)
        .await;
    mount_job_page(&server, 1).await;

    let page = format!("{}/jobs/1", server.uri());
    let text = converter(&server, 3)
        .convert(&page, &CancellationToken::new())
        .await;

    assert!(!is_error_marker(&text));
    assert!(text.contains("Backend Engineer"));
    assert!(text.contains("Build the crawler platform."));
    assert!(!text.contains("var x"));
}

#[tokio::test]
async fn test_exhausted_retries_try_fallback_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/read/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/jobs/1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let page = format!("{}/jobs/1", server.uri());
    let text = converter(&server, 3)
        .convert(&page, &CancellationToken::new())
        .await;

    assert!(is_error_marker(&text));
    assert!(text.contains(&page));
}
