// libs/generation-cell/tests/client_test.rs

use std::time::Duration;

use assert_matches::assert_matches;
use serde_json::json;
use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use generation_cell::{GenerationError, GenerationRequest, HttpTextGenerator, TextGenerator};
use shared_config::AppConfig;

fn config_for(server: &MockServer) -> AppConfig {
    AppConfig {
        generation_api_url: server.uri(),
        generation_api_key: "test-key".to_string(),
        generation_timeout_secs: 1,
        ..AppConfig::default()
    }
}

fn sample_request() -> GenerationRequest {
    GenerationRequest::new(
        "schedule_optimization",
        "Pick the best slots",
        json!({ "candidates": [] }),
    )
}

#[tokio::test]
async fn test_generate_returns_structured_output() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/generate"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "output": { "justification": "fits", "suggested_slots": [] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let generator = HttpTextGenerator::new(&config_for(&server));
    let output = generator.generate(sample_request()).await.unwrap();

    assert_eq!(output["justification"], "fits");
}

#[tokio::test]
async fn test_generate_without_url_is_not_configured() {
    let generator = HttpTextGenerator::new(&AppConfig::default());

    let result = generator.generate(sample_request()).await;

    assert_matches!(result, Err(GenerationError::NotConfigured));
}

#[tokio::test]
async fn test_upstream_error_status_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/generate"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let generator = HttpTextGenerator::new(&config_for(&server));
    let result = generator.generate(sample_request()).await;

    assert_matches!(
        result,
        Err(GenerationError::Upstream { status: 503, ref message }) if message == "overloaded"
    );
}

#[tokio::test]
async fn test_missing_output_field_is_invalid() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "text": "hello" })))
        .mount(&server)
        .await;

    let generator = HttpTextGenerator::new(&config_for(&server));
    let result = generator.generate(sample_request()).await;

    assert_matches!(result, Err(GenerationError::InvalidOutput(_)));
}

#[tokio::test]
async fn test_non_object_output_is_invalid() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "output": "plain text" })))
        .mount(&server)
        .await;

    let generator = HttpTextGenerator::new(&config_for(&server));
    let result = generator.generate(sample_request()).await;

    assert_matches!(result, Err(GenerationError::InvalidOutput(_)));
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/generate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "output": {} }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let generator = HttpTextGenerator::new(&config_for(&server));
    let result = generator.generate(sample_request()).await;

    assert_matches!(result, Err(GenerationError::Timeout(1)));
}
