//! Integration tests for the Ollama-served local model.

#![cfg(feature = "ollama")]

use std::sync::Arc;

use parable_core::{Availability, CategorizationBackend, Category, Error, UnavailabilityReason};
use parable_inference::local::{LocalBackend, LocalModel};
use parable_inference::ollama::OllamaLocalModel;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_tags(server: &MockServer, models: &[&str]) {
    let models: Vec<_> = models.iter().map(|name| json!({ "name": name })).collect();
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "models": models })))
        .mount(server)
        .await;
}

fn chat_reply(content: &str) -> serde_json::Value {
    json!({
        "model": "llama3.2:3b",
        "message": { "role": "assistant", "content": content },
        "done": true
    })
}

#[tokio::test]
async fn test_probe_finds_installed_model() {
    let server = MockServer::start().await;
    mount_tags(&server, &["qwen2.5:7b", "llama3.2:3b"]).await;

    let model = OllamaLocalModel::new(server.uri(), "llama3.2:3b");
    assert_eq!(model.probe().await, Availability::Available);
}

#[tokio::test]
async fn test_probe_missing_model_is_not_ready() {
    let server = MockServer::start().await;
    mount_tags(&server, &["qwen2.5:7b"]).await;

    let model = OllamaLocalModel::new(server.uri(), "llama3.2:3b");
    assert_eq!(
        model.probe().await,
        Availability::Unavailable(UnavailabilityReason::ModelNotReady)
    );
}

#[tokio::test]
async fn test_probe_server_error_is_not_ready() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let model = OllamaLocalModel::new(server.uri(), "llama3.2:3b");
    assert_eq!(
        model.probe().await,
        Availability::Unavailable(UnavailabilityReason::ModelNotReady)
    );
}

#[tokio::test]
async fn test_classify_requests_json_format() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "model": "llama3.2:3b",
            "stream": false,
            "format": "json"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(
            r#"{"category": "area", "reasoning": "recurring health upkeep", "confidence": 0.86}"#,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let model = OllamaLocalModel::new(server.uri(), "llama3.2:3b");
    let result = model.classify("Book dentist checkup").await.unwrap();
    assert_eq!(result.category, Category::Area);
    assert_eq!(result.confidence, 0.86);
}

#[tokio::test]
async fn test_classify_error_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
        .mount(&server)
        .await;

    let model = OllamaLocalModel::new(server.uri(), "llama3.2:3b");
    match model.classify("note").await.unwrap_err() {
        Error::Api { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "model not found");
        }
        other => panic!("Expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_local_backend_uses_ready_model() {
    let server = MockServer::start().await;
    mount_tags(&server, &["llama3.2:3b"]).await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(
            r#"{"category": "project", "reasoning": "launch with a date", "confidence": 0.9}"#,
        )))
        .mount(&server)
        .await;

    let model: Arc<dyn LocalModel> = Arc::new(OllamaLocalModel::new(server.uri(), "llama3.2:3b"));
    let backend = LocalBackend::detect(Some(model), true).await;

    assert!(backend.uses_model());
    assert_eq!(backend.name(), "llama3.2:3b");
    let result = backend.categorize("Launch site on March 3").await.unwrap();
    assert_eq!(result.category, Category::Project);
}

#[tokio::test]
async fn test_local_backend_falls_back_when_model_missing() {
    let server = MockServer::start().await;
    mount_tags(&server, &[]).await;

    let model: Arc<dyn LocalModel> = Arc::new(OllamaLocalModel::new(server.uri(), "llama3.2:3b"));
    let backend = LocalBackend::detect(Some(model), true).await;

    assert_eq!(backend.engine_name(), "heuristic");
    assert_eq!(
        backend.model_status(),
        Availability::Unavailable(UnavailabilityReason::ModelNotReady)
    );
    assert!(backend.is_available());
}
