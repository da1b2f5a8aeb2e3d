//! OpenAI-compatible oracle against a mock API server

use job_scout::browser::LinkCandidate;
use job_scout::extract::{JobExtractor, LinkClassifier};
use job_scout::oracle::{OpenAiOracle, OracleError, TextCompletionOracle};
use job_scout::retry::RetryPolicy;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn oracle(server: &MockServer) -> OpenAiOracle {
    OpenAiOracle::new("test-key", Duration::from_secs(5))
        .expect("oracle client")
        .with_model("gpt-test")
        .with_base_url(format!("{}/", server.uri()))
}

fn completion(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "chatcmpl-1",
        "choices": [
            { "index": 0, "message": { "role": "assistant", "content": content } }
        ]
    }))
}

fn fast_retries(attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts: attempts,
        ..RetryPolicy::none()
    }
}

#[tokio::test]
async fn test_completion_request_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({ "model": "gpt-test", "temperature": 0.0 })))
        .respond_with(completion("  YES \n"))
        .expect(1)
        .mount(&server)
        .await;

    let answer = oracle(&server).complete("Is this a job?", 0.0).await.unwrap();
    assert_eq!(answer, "YES");
}

#[tokio::test]
async fn test_rate_limit_is_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;

    let err = oracle(&server).complete("prompt", 0.0).await.unwrap_err();
    assert!(matches!(err, OracleError::Status { status: 429, .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_no_choices_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let err = oracle(&server).complete("prompt", 0.0).await.unwrap_err();
    assert!(matches!(err, OracleError::Empty));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_classifier_retries_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(completion("YES"))
        .expect(1)
        .mount(&server)
        .await;

    let classifier = LinkClassifier::new(Arc::new(oracle(&server)), fast_retries(2));
    let link = LinkCandidate::new("Senior Engineer", "https://careers.example.com/jobs/1");

    assert!(classifier.classify(&link, &CancellationToken::new()).await);
}

#[tokio::test]
async fn test_extractor_parses_fenced_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(completion(
            "```json\n[{\"Title\": \"Backend Engineer\", \"Location\": \"Berlin\", \"Salary Range\": null}]\n```",
        ))
        .mount(&server)
        .await;

    let extractor = JobExtractor::new(Arc::new(oracle(&server)), fast_retries(1), 12_000);
    let postings = extractor
        .extract_text("# Backend Engineer\nBerlin", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(postings.len(), 1);
    assert_eq!(postings[0].title, "Backend Engineer");
    assert_eq!(postings[0].location, "Berlin");
    assert_eq!(postings[0].salary_range, "");
}
