use super::*;
use crate::limiter::{PRIMARY_MODEL, SECONDARY_MODEL};

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn envelope(payload: &str) -> serde_json::Value {
    json!({
        "candidates": [{ "content": { "parts": [{ "text": payload }] } }]
    })
}

fn resource_exhausted() -> ResponseTemplate {
    ResponseTemplate::new(429).set_body_string(
        r#"{"error":{"code":429,"status":"RESOURCE_EXHAUSTED","message":"quota"}}"#,
    )
}

async fn test_client(server: &MockServer) -> LlmClient {
    LlmClient::with_base_url("test-key", 5, &server.uri()).unwrap()
}

#[tokio::test]
async fn extracts_names_from_plain_json() {
    let server = MockServer::start().await;
    let payload = r#"{"brewery_name_native":null,"brewery_name_latin":"Green Cheek Beer Co.","beer_name_native":null,"beer_name_latin":"West Coast IPA","is_bundle":false}"#;
    Mock::given(method("POST"))
        .and(path(format!("/models/{}:generateContent", PRIMARY_MODEL.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(payload)))
        .mount(&server)
        .await;

    let client = test_client(&server).await;
    let mut limiter = RateLimiter::new(100);
    let extraction = client
        .extract(&mut limiter, "West Coast IPA / Green Cheek Beer Co.", None)
        .await
        .unwrap();

    assert_eq!(
        extraction.brewery_name_latin.as_deref(),
        Some("Green Cheek Beer Co.")
    );
    assert_eq!(extraction.beer_name_latin.as_deref(), Some("West Coast IPA"));
    assert!(!extraction.is_bundle);
    assert_eq!(limiter.calls_made(), 1);
}

#[tokio::test]
async fn tolerates_markdown_fenced_output() {
    let server = MockServer::start().await;
    let payload = "```json\n{\"brewery_name_native\":null,\"brewery_name_latin\":\"Vertere\",\"beer_name_native\":null,\"beer_name_latin\":\"Bosco\",\"is_bundle\":false}\n```";
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(payload)))
        .mount(&server)
        .await;

    let client = test_client(&server).await;
    let mut limiter = RateLimiter::new(100);
    let extraction = client
        .extract(&mut limiter, "Bosco / Vertere", None)
        .await
        .unwrap();
    assert_eq!(extraction.brewery_name_latin.as_deref(), Some("Vertere"));
}

#[tokio::test]
async fn falls_back_to_secondary_model_on_exhaustion() {
    let server = MockServer::start().await;
    let payload = r#"{"brewery_name_native":null,"brewery_name_latin":"Uchu Brewing","beer_name_native":null,"beer_name_latin":"DO IT","is_bundle":false}"#;

    Mock::given(method("POST"))
        .and(path(format!("/models/{}:generateContent", PRIMARY_MODEL.id)))
        .respond_with(resource_exhausted())
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!(
            "/models/{}:generateContent",
            SECONDARY_MODEL.id
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(payload)))
        .mount(&server)
        .await;

    let client = test_client(&server).await;
    let mut limiter = RateLimiter::new(100);
    let extraction = client
        .extract(&mut limiter, "DO IT / うちゅうブルーイング", None)
        .await
        .unwrap();

    assert_eq!(extraction.brewery_name_latin.as_deref(), Some("Uchu Brewing"));
    // The run stays demoted for subsequent calls.
    assert_eq!(limiter.current_model().id, SECONDARY_MODEL.id);
    assert_eq!(limiter.calls_made(), 2);
}

#[tokio::test]
async fn both_models_exhausted_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(resource_exhausted())
        .mount(&server)
        .await;

    let client = test_client(&server).await;
    let mut limiter = RateLimiter::new(100);
    let err = client
        .extract(&mut limiter, "Some Beer", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractorError::QuotaExhausted));
    assert!(err.is_fatal_quota());
}

#[tokio::test]
async fn spent_budget_short_circuits_without_calling() {
    let server = MockServer::start().await;
    let client = test_client(&server).await;
    let mut limiter = RateLimiter::new(0);
    let err = client
        .extract(&mut limiter, "Some Beer", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractorError::BudgetExhausted { budget: 0 }));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn garbage_payload_is_a_deserialize_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope("not json at all")))
        .mount(&server)
        .await;

    let client = test_client(&server).await;
    let mut limiter = RateLimiter::new(100);
    let err = client
        .extract(&mut limiter, "Some Beer", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractorError::Deserialize { .. }));
    assert!(!err.is_fatal_quota());
}
